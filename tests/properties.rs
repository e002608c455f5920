//! Property-based tests across the problem units.
//!
//! Sweeps parameters through each constructor and checks that the
//! independent verifier accepts the result, that constructions survive a
//! JSON round trip, and that verification is deterministic.

use std::collections::HashSet;

use construction_verifier::*;
use proptest::prelude::*;
use serde::Serialize;

fn params(key: &str, value: i64) -> Parameters {
    Parameters::new().with(key, value)
}

/// Serialise, re-parse, and compare with the original construction
fn assert_round_trip<P: Problem>(construction: &P::Construction, params: &Parameters) {
    let value = serde_json::to_value(construction).expect("serialisation failed");
    let back = P::parse(&value, params).expect("re-parse failed");
    assert_eq!(&back, construction, "{} round trip changed the construction", P::NAME);
}

fn json_text<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).expect("serialisation failed")
}

// =============================================================================
// CONSTRUCTOR SWEEPS
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: the polygon for n has n + 2 vertices and exactly n triangulations
    #[test]
    fn prop_triangulation_count_matches(n in 1i64..=30) {
        let p = params("n", n);
        let polygon = Triangulation::construct(&p, &SearchConfig::default()).unwrap().unwrap();
        prop_assert_eq!(polygon.len() as i64, n + 2);
        let report = Triangulation::verify_construction(&polygon, &p, &SearchConfig::default());
        prop_assert!(report.valid, "n = {}: {:?}", n, report.failure_summary());
    }

    /// Property: a permutation exists exactly when n ≡ 0, 1 (mod 4), and it verifies
    #[test]
    fn prop_displacement_follows_residue(n in 1i64..=40) {
        let p = params("n", n);
        let found = Displacement::construct(&p, &SearchConfig::default()).unwrap();
        prop_assert_eq!(found.is_some(), n % 4 <= 1);
        if let Some(perm) = found {
            let report = Displacement::verify_construction(&perm, &p, &SearchConfig::default());
            prop_assert!(report.valid, "n = {}: {:?}", n, report.failure_summary());
        }
    }

    /// Property: every town except 3 × 3 gets a tour that covers all 4n² sides
    #[test]
    fn prop_town_tour_covers_every_side(n in 1i64..=24) {
        let p = params("n", n);
        let tour = TownTour::construct(&p, &SearchConfig::default()).unwrap();
        prop_assert_eq!(tour.is_none(), n == 3);
        if let Some(tour) = tour {
            prop_assert_eq!(tour.points().first(), tour.points().last());
            let report = TownTour::verify_construction(&tour, &p, &SearchConfig::default());
            prop_assert!(report.valid, "n = {}: {:?}", n, report.failure_summary());
        }
    }

    /// Property: every supported polygon size verifies with all four checks
    #[test]
    fn prop_collinear_polygon_verifies(k in 3i64..=20, passes in 0i64..=3) {
        let n = 4 * k + 7 * passes;
        let p = params("n", n);
        let polygon = CollinearPolygon::construct(&p, &SearchConfig::default()).unwrap().unwrap();
        prop_assert_eq!(polygon.len() as i64, n);
        let report = CollinearPolygon::verify_construction(&polygon, &p, &SearchConfig::default());
        prop_assert!(report.valid, "n = {}: {:?}", n, report.failure_summary());
    }

    /// Property: N is an m-digit palindrome in each of the m bases
    #[test]
    fn prop_palindromic_bases_verify(m in 2i64..=8) {
        let p = params("m", m);
        let bases = Palindrome::construct(&p, &SearchConfig::default()).unwrap().unwrap();
        prop_assert_eq!(bases.a.len() as i64, m);
        let report = Palindrome::verify_construction(&bases, &p, &SearchConfig::default());
        prop_assert!(report.valid, "m = {}: {:?}", m, report.failure_summary());
    }
}

#[test]
fn polynomial_values_are_distinct_powers() {
    for n in 1..=5 {
        let p = params("n", n);
        let poly = PowersOfTwo::construct(&p, &SearchConfig::default()).unwrap().unwrap();
        let report = PowersOfTwo::verify(&json_text(&poly), &p, &SearchConfig::default());
        assert!(report.valid, "n = {n}: {:?}", report.failure_summary());
    }
}

#[test]
fn cycle_fan_smallest_instance_verifies() {
    let p = Parameters::new().with("even_cycle", 4).with("odd_cycle", 5).with("mod", 3);
    let graph = CycleFan::construct(&p, &SearchConfig::default()).unwrap().unwrap();
    assert_eq!(graph.vertex_count(), 24);
    let report = CycleFan::verify(&json_text(&graph), &p, &SearchConfig::default());
    assert!(report.valid, "{:?}", report.failure_summary());
}

/// The 6- and 7-cycle instance on 84 vertices; slow without optimisations.
#[test]
#[cfg_attr(debug_assertions, ignore = "run with --release")]
fn cycle_fan_second_instance_verifies() {
    let p = Parameters::new().with("even_cycle", 6).with("odd_cycle", 7).with("mod", 5);
    let graph = CycleFan::construct(&p, &SearchConfig::default()).unwrap().unwrap();
    assert_eq!(graph.vertex_count(), 84);
    let report = CycleFan::verify_construction(&graph, &p, &SearchConfig::default());
    let outcomes: Vec<(&str, bool)> = report.checks.iter().map(|c| (c.name.as_str(), c.passed)).collect();
    assert_eq!(
        outcomes,
        [("cycle_requirements", true), ("no_forbidden_cycles", true), ("nontrivial", true)]
    );
}

// =============================================================================
// ROUND TRIP
// =============================================================================

#[test]
fn constructions_survive_json_round_trip() {
    let config = SearchConfig::default();

    let p = params("even_cycle", 4);
    assert_round_trip::<CycleFan>(&CycleFan::construct(&p, &config).unwrap().unwrap(), &p);

    for n in [12, 19, 26, 33] {
        let p = params("n", n);
        assert_round_trip::<CollinearPolygon>(&CollinearPolygon::construct(&p, &config).unwrap().unwrap(), &p);
    }
    for n in [1, 4, 9, 16] {
        let p = params("n", n);
        assert_round_trip::<Displacement>(&Displacement::construct(&p, &config).unwrap().unwrap(), &p);
    }
    for n in [1, 2, 7, 11] {
        let p = params("n", n);
        assert_round_trip::<TownTour>(&TownTour::construct(&p, &config).unwrap().unwrap(), &p);
    }
    for n in [1, 5, 17] {
        let p = params("n", n);
        assert_round_trip::<Triangulation>(&Triangulation::construct(&p, &config).unwrap().unwrap(), &p);
    }
    for m in [2, 5, 7] {
        let p = params("m", m);
        assert_round_trip::<Palindrome>(&Palindrome::construct(&p, &config).unwrap().unwrap(), &p);
    }
    for n in [1, 3, 4] {
        let p = params("n", n);
        assert_round_trip::<PowersOfTwo>(&PowersOfTwo::construct(&p, &config).unwrap().unwrap(), &p);
    }
}

// =============================================================================
// VERIFIER BEHAVIOUR ON ARBITRARY INPUT
// =============================================================================

/// Naive reference: positive displacements pairwise distinct
fn distinct_positive_displacements(values: &[i64]) -> bool {
    let mut seen = HashSet::new();
    (1..)
        .zip(values)
        .map(|(i, &v)| (v - i).unsigned_abs())
        .filter(|&d| d > 0)
        .all(|d| seen.insert(d))
}

fn shuffled_identity() -> impl Strategy<Value = Vec<i64>> {
    (1usize..=9).prop_flat_map(|n| Just((1..=n as i64).collect::<Vec<_>>()).prop_shuffle())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: on arbitrary permutations the verifier agrees with a naive check
    #[test]
    fn prop_displacement_verifier_matches_reference(values in shuffled_identity()) {
        let n = values.len() as i64;
        let p = params("n", n);
        let report = Displacement::verify(&json_text(&values), &p, &SearchConfig::default());
        let expected = n % 4 <= 1 && distinct_positive_displacements(&values);
        prop_assert_eq!(report.valid, expected, "{:?}: {:?}", values, report.failure_summary());
        prop_assert_eq!(report.checks[1].passed, distinct_positive_displacements(&values));
    }

    /// Property: verifying the same text twice yields identical reports
    #[test]
    fn prop_verification_is_idempotent(
        points in prop::collection::vec((-20i64..20, -20i64..20), 0..8),
        n in 1i64..6,
    ) {
        let text = json_text(&points.iter().map(|&(x, y)| [x, y]).collect::<Vec<_>>());
        let config = SearchConfig::default();
        for unit in Unit::ALL {
            let p = Parameters::new().with("n", n).with("m", n);
            let first = unit.verify_text(&text, &p, &config);
            let second = unit.verify_text(&text, &p, &config);
            prop_assert_eq!(&first, &second);
            prop_assert!(!first.checks.is_empty());
        }
    }

    /// Property: a lattice walk shorter than 4n² steps is never accepted
    #[test]
    fn prop_town_verifier_rejects_short_walks(
        steps in prop::collection::vec(0usize..4, 1..12),
    ) {
        let n = 2i64;
        let mut at = Corner::new(n, 0);
        let mut points = vec![at];
        for &s in &steps {
            let d = [Direction::North, Direction::East, Direction::South, Direction::West][s];
            at = at.step(d);
            points.push(at);
        }
        // Fewer than 16 unit steps can never cover the 2 × 2 town
        let report = TownTour::verify(&json_text(&points), &params("n", n), &SearchConfig::default());
        prop_assert!(!report.valid);
    }
}

#[test]
fn parameters_from_assignments_and_json_agree() {
    let from_cli: Parameters = ["n=5", "mod=3"]
        .iter()
        .map(|s| s.parse::<ParamAssignment>().unwrap())
        .map(|a| (a.key, a.value))
        .collect();
    let from_json: Parameters = serde_json::from_str(r#"{"n": 5, "mod": 3}"#).unwrap();
    assert_eq!(from_cli, from_json);
}
