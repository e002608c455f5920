//! Constructive proofs for combinatorics problems, with independent verifiers.
//!
//! Each problem unit pairs a deterministic constructor with a verifier that
//! re-derives every required property from the submitted object alone. Units
//! implement [`Problem`]; [`Unit`] dispatches on them by name for the CLI.

pub mod collinear_polygon;
pub mod config;
pub mod construction;
pub mod cycle_fan;
pub mod displacement;
pub mod error;
pub mod geometry;
pub mod palindrome;
pub mod params;
pub mod polynomial;
pub mod problem;
pub mod report;
pub mod town_tour;
pub mod triangulation;
pub mod unit;

// Re-export main types
pub use collinear_polygon::CollinearPolygon;
pub use config::SearchConfig;
pub use cycle_fan::{CycleFan, Graph};
pub use displacement::{Displacement, Permutation};
pub use error::{ConstructionError, ParameterError, VerifyError};
pub use geometry::{Point, Polygon};
pub use palindrome::{PalindromicBases, Palindrome};
pub use params::{ParamAssignment, Parameters};
pub use polynomial::{Polynomial, PowersOfTwo};
pub use problem::{Check, CheckFn, Problem};
pub use report::{CheckOutcome, VerificationReport};
pub use town_tour::{Corner, Direction, MarkPattern, Tour, TownTour};
pub use triangulation::Triangulation;
pub use unit::Unit;
