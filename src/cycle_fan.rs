//! Cycle-fan graph: every edge on a 2k-cycle and a (2k+1)-cycle, and no
//! cycle length divisible by 2k−1.
//!
//! The graph is a 2k-cycle on "polygon" vertices. Each polygon side gets an
//! apex joined to both side endpoints by k internally disjoint paths of length
//! k. Two parallel apex paths close a 2k-cycle, and a side plus one path to
//! each of its endpoints closes a (2k+1)-cycle.
//!
//! The verifier accepts either an adjacency matrix or a `{"V": [...], "E": [...]}`
//! edge list and searches for cycles exhaustively by DFS.

use std::collections::HashMap;
use std::ops::Range;

use serde::Serialize;
use serde_json::Value;
use smallvec::SmallVec;

use crate::config::SearchConfig;
use crate::construction::{as_integer, describe};
use crate::error::{ConstructionError, ParameterError, VerifyError};
use crate::params::Parameters;
use crate::problem::{Check, Problem};

type Neighbors = SmallVec<[usize; 8]>;

/// Simple undirected graph stored as a symmetric 0/1 adjacency matrix.
///
/// Only constructed through [`Graph::from_edges`] or the verifier's parser,
/// both of which guarantee simplicity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Graph {
    adjacency: Vec<Vec<u8>>,
}

impl Graph {
    /// Build from an edge list over vertices `0..vertex_count`.
    pub fn from_edges(vertex_count: usize, edges: &[(usize, usize)]) -> Result<Self, String> {
        let mut adjacency = vec![vec![0u8; vertex_count]; vertex_count];
        for &(u, v) in edges {
            if u >= vertex_count || v >= vertex_count {
                return Err(format!("edge ({u}, {v}) leaves vertex range 0..{vertex_count}"));
            }
            if u == v {
                return Err(format!("self-loop at vertex {u}"));
            }
            adjacency[u][v] = 1;
            adjacency[v][u] = 1;
        }
        Ok(Self { adjacency })
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adjacency[u][v] == 1
    }

    /// Edges as `(i, j)` with `i < j`, in row-major order
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let n = self.vertex_count();
        (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .filter(|&(i, j)| self.has_edge(i, j))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edges().len()
    }

    fn neighbor_lists(&self) -> Vec<Neighbors> {
        self.adjacency
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|&(_, &bit)| bit == 1)
                    .map(|(v, _)| v)
                    .collect()
            })
            .collect()
    }

    /// Validate a raw integer matrix as a simple undirected graph.
    fn from_matrix(matrix: Vec<Vec<i64>>) -> Result<Self, VerifyError> {
        let n = matrix.len();
        if let Some(row) = matrix.iter().position(|row| row.len() != n) {
            return Err(VerifyError::malformed(format!(
                "adjacency matrix must be square: row {row} has {} entries, expected {n}",
                matrix[row].len()
            )));
        }
        for (i, row) in matrix.iter().enumerate() {
            for (j, &entry) in row.iter().enumerate() {
                if entry != 0 && entry != 1 {
                    return Err(VerifyError::violation(format!(
                        "adjacency must be 0/1, found {entry} at ({i}, {j})"
                    )));
                }
            }
        }
        for i in 0..n {
            for j in i + 1..n {
                if matrix[i][j] != matrix[j][i] {
                    return Err(VerifyError::violation(format!(
                        "adjacency not symmetric at ({i}, {j}); the graph must be undirected"
                    )));
                }
            }
        }
        if let Some(v) = (0..n).find(|&v| matrix[v][v] != 0) {
            return Err(VerifyError::violation(format!(
                "self-loop at vertex {v}; the diagonal must be zero"
            )));
        }
        let adjacency = matrix
            .into_iter()
            .map(|row| row.into_iter().map(|bit| bit as u8).collect())
            .collect();
        Ok(Self { adjacency })
    }
}

/// Index ranges of the three vertex classes for a given `k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub polygon: Range<usize>,
    pub apex: Range<usize>,
    pub subdivision: Range<usize>,
}

impl Layout {
    pub fn new(k: usize) -> Self {
        let polygon = 0..2 * k;
        let apex = 2 * k..4 * k;
        let subdivision = 4 * k..4 * k + 4 * k * k * (k - 1);
        Self {
            polygon,
            apex,
            subdivision,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.subdivision.end
    }
}

/// Build the cycle-fan graph for `k >= 2`.
pub fn build(k: usize) -> Result<Graph, ConstructionError> {
    if k < 2 {
        return Err(ParameterError::new("even_cycle", "half-length k must be at least 2").into());
    }
    let layout = Layout::new(k);
    let sides = layout.polygon.len();
    let mut edges = Vec::with_capacity(sides + 2 * sides * k * k);

    for i in layout.polygon.clone() {
        edges.push((i, (i + 1) % sides));
    }

    let mut next_sub = layout.subdivision.start;
    for i in 0..sides {
        let apex = layout.apex.start + i;
        for endpoint in [i, (i + 1) % sides] {
            for _ in 0..k {
                let mut prev = apex;
                for internal in next_sub..next_sub + (k - 1) {
                    edges.push((prev, internal));
                    prev = internal;
                }
                next_sub += k - 1;
                edges.push((prev, endpoint));
            }
        }
    }

    if next_sub != layout.vertex_count() {
        return Err(ConstructionError::internal(format!(
            "indexing mismatch: used {next_sub} vertices but layout has {}",
            layout.vertex_count()
        )));
    }

    tracing::debug!(k, vertices = next_sub, edges = edges.len(), "built cycle-fan graph");
    Graph::from_edges(layout.vertex_count(), &edges).map_err(ConstructionError::internal)
}

/// Depth-first cycle queries over a fixed neighbour structure, with an
/// optional cap on node expansions.
struct CycleSearch<'a> {
    graph: &'a Graph,
    neighbors: Vec<Neighbors>,
    visited: Vec<bool>,
    expansions: usize,
    budget: Option<usize>,
}

/// Marker for a search that ran out of budget
struct Exhausted;

impl<'a> CycleSearch<'a> {
    fn new(graph: &'a Graph, budget: Option<usize>) -> Self {
        Self {
            graph,
            neighbors: graph.neighbor_lists(),
            visited: vec![false; graph.vertex_count()],
            expansions: 0,
            budget,
        }
    }

    fn expand(&mut self) -> Result<(), Exhausted> {
        self.expansions += 1;
        match self.budget {
            Some(budget) if self.expansions > budget => Err(Exhausted),
            _ => Ok(()),
        }
    }

    /// Is edge `(i, j)` on a simple cycle of exactly `length` edges?
    fn edge_in_cycle(&mut self, i: usize, j: usize, length: usize) -> Result<bool, Exhausted> {
        if length < 3 || i == j || !self.graph.has_edge(i, j) {
            return Ok(false);
        }
        self.visited.fill(false);
        self.visited[i] = true;
        self.visited[j] = true;
        self.path_back(j, i, length - 1)
    }

    /// Walk `remaining` edges from `cur` through unvisited vertices, ending at `target`.
    fn path_back(&mut self, cur: usize, target: usize, remaining: usize) -> Result<bool, Exhausted> {
        self.expand()?;
        if remaining == 0 {
            return Ok(cur == target);
        }
        for idx in 0..self.neighbors[cur].len() {
            let w = self.neighbors[cur][idx];
            if remaining == 1 {
                if w == target {
                    return Ok(true);
                }
                continue;
            }
            if w == target || self.visited[w] {
                continue;
            }
            self.visited[w] = true;
            let found = self.path_back(w, target, remaining - 1);
            self.visited[w] = false;
            if found? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Find any simple cycle of exactly `length` vertices.
    ///
    /// Each cycle is looked for from its smallest vertex only, which covers
    /// every cycle once per orientation.
    fn find_cycle(&mut self, length: usize) -> Result<Option<Vec<usize>>, Exhausted> {
        let n = self.graph.vertex_count();
        if length < 3 || length > n {
            return Ok(None);
        }
        let mut path: SmallVec<[usize; 32]> = SmallVec::new();
        for start in 0..n {
            if self.neighbors[start].len() < 2 {
                continue;
            }
            self.visited.fill(false);
            self.visited[start] = true;
            path.clear();
            path.push(start);
            if self.close_cycle(start, start, length - 1, &mut path)? {
                return Ok(Some(path.to_vec()));
            }
        }
        Ok(None)
    }

    fn close_cycle(
        &mut self,
        start: usize,
        cur: usize,
        remaining: usize,
        path: &mut SmallVec<[usize; 32]>,
    ) -> Result<bool, Exhausted> {
        self.expand()?;
        if remaining == 0 {
            return Ok(self.graph.has_edge(cur, start));
        }
        for idx in 0..self.neighbors[cur].len() {
            let w = self.neighbors[cur][idx];
            if w <= start || self.visited[w] {
                continue;
            }
            self.visited[w] = true;
            path.push(w);
            let found = self.close_cycle(start, w, remaining - 1, path);
            if matches!(found, Ok(true)) {
                return Ok(true);
            }
            path.pop();
            self.visited[w] = false;
            found?;
        }
        Ok(false)
    }
}

/// Map a `{V, E}` edge list onto indices in `V` order.
fn graph_from_vertex_edges(vertices: &Value, edges: &Value) -> Result<Graph, VerifyError> {
    let vertices = vertices
        .as_array()
        .ok_or_else(|| VerifyError::malformed("`V` must be a list of vertex labels"))?;
    let edges = edges
        .as_array()
        .ok_or_else(|| VerifyError::malformed("`E` must be a list of [u, v] pairs"))?;

    let mut index: HashMap<String, usize> = HashMap::with_capacity(vertices.len());
    for (i, label) in vertices.iter().enumerate() {
        if index.insert(label.to_string(), i).is_some() {
            return Err(VerifyError::malformed(format!("duplicate vertex label {label}")));
        }
    }

    let mut pairs = Vec::with_capacity(edges.len());
    for edge in edges {
        let ends = edge
            .as_array()
            .filter(|ends| ends.len() == 2)
            .ok_or_else(|| VerifyError::malformed(format!("edge {} is not a pair", describe(edge))))?;
        let lookup = |label: &Value| {
            index.get(&label.to_string()).copied().ok_or_else(|| {
                VerifyError::malformed(format!("edge uses vertex {label} not present in V"))
            })
        };
        let (u, v) = (lookup(&ends[0])?, lookup(&ends[1])?);
        if u == v {
            return Err(VerifyError::malformed(format!("self-loop detected in E at {}", ends[0])));
        }
        pairs.push((u, v));
    }
    Graph::from_edges(vertices.len(), &pairs).map_err(VerifyError::Malformed)
}

fn graph_from_matrix_value(value: &Value) -> Result<Graph, VerifyError> {
    let rows = value
        .as_array()
        .ok_or_else(|| VerifyError::malformed("expected an adjacency matrix or a {V, E} object"))?;
    let matrix = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let row = row
                .as_array()
                .ok_or_else(|| VerifyError::malformed(format!("adjacency row {i} is not a list")))?;
            row.iter()
                .map(|entry| {
                    as_integer(entry).ok_or_else(|| {
                        VerifyError::malformed(format!(
                            "adjacency contains non-integer entry {} in row {i}",
                            describe(entry)
                        ))
                    })
                })
                .collect::<Result<Vec<i64>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Graph::from_matrix(matrix)
}

fn ensure_nontrivial(graph: &Graph) -> Result<(), VerifyError> {
    if graph.edge_count() == 0 {
        return Err(VerifyError::violation("graph must contain at least one edge"));
    }
    Ok(())
}

fn nontrivial(graph: &Graph, _params: &Parameters, _config: &SearchConfig) -> Result<(), VerifyError> {
    ensure_nontrivial(graph)
}

/// Every edge lies on a simple cycle of each requested length.
fn cycle_requirements(
    graph: &Graph,
    params: &Parameters,
    config: &SearchConfig,
) -> Result<(), VerifyError> {
    ensure_nontrivial(graph)?;
    let n = graph.vertex_count();
    let mut lengths = vec![params.get_or("even_cycle", 4), params.get_or("odd_cycle", 5)];
    lengths.sort_unstable();
    lengths.dedup();
    for &length in &lengths {
        if length < 3 || length > n as i64 {
            return Err(VerifyError::violation(format!(
                "requested cycle length {length} is invalid for n={n}"
            )));
        }
    }

    let mut search = CycleSearch::new(graph, config.cycle_search_budget);
    for (i, j) in graph.edges() {
        for &length in &lengths {
            let length = length as usize;
            match search.edge_in_cycle(i, j, length) {
                Ok(true) => {}
                Ok(false) => {
                    return Err(VerifyError::violation(format!(
                        "edge ({i}, {j}) is not contained in any simple cycle of length {length}"
                    )))
                }
                Err(Exhausted) => {
                    return Err(VerifyError::Inconclusive {
                        budget: config.cycle_search_budget.unwrap_or(usize::MAX),
                        context: format!("looking for a {length}-cycle through edge ({i}, {j})"),
                    })
                }
            }
        }
    }
    Ok(())
}

/// No simple cycle has a length divisible by `mod`.
fn no_forbidden_cycles(
    graph: &Graph,
    params: &Parameters,
    config: &SearchConfig,
) -> Result<(), VerifyError> {
    ensure_nontrivial(graph)?;
    let modulus = params.get_or("mod", 3);
    if modulus <= 0 {
        return Err(ParameterError::new("mod", "must be a positive integer").into());
    }
    let modulus = modulus as usize;
    let n = graph.vertex_count();
    let first = 3usize.div_ceil(modulus) * modulus;

    let mut search = CycleSearch::new(graph, config.cycle_search_budget);
    for length in (first..=n).step_by(modulus) {
        tracing::trace!(length, "searching for forbidden cycle");
        match search.find_cycle(length) {
            Ok(None) => {}
            Ok(Some(cycle)) => {
                return Err(VerifyError::violation(format!(
                    "found a simple cycle of length {length} (≡ 0 mod {modulus}): {cycle:?}"
                )))
            }
            Err(Exhausted) => {
                return Err(VerifyError::Inconclusive {
                    budget: config.cycle_search_budget.unwrap_or(usize::MAX),
                    context: format!("looking for a {length}-cycle"),
                })
            }
        }
    }
    Ok(())
}

static CHECKS: [Check<Graph>; 3] = [
    Check {
        name: "cycle_requirements",
        run: cycle_requirements,
    },
    Check {
        name: "no_forbidden_cycles",
        run: no_forbidden_cycles,
    },
    Check {
        name: "nontrivial",
        run: nontrivial,
    },
];

/// CT1: cycle-fan graph unit.
pub struct CycleFan;

impl Problem for CycleFan {
    const NAME: &'static str = "cycle_fan";
    type Construction = Graph;

    fn construct(params: &Parameters, _config: &SearchConfig) -> Result<Option<Graph>, ConstructionError> {
        let even_cycle = params.at_least("even_cycle", 4, 4)?;
        if even_cycle % 2 != 0 {
            return Err(ParameterError::new("even_cycle", format!("must be even, got {even_cycle}")).into());
        }
        build(even_cycle / 2).map(Some)
    }

    fn parse(value: &Value, _params: &Parameters) -> Result<Graph, VerifyError> {
        match value {
            Value::Object(map) => match (map.get("V"), map.get("E")) {
                (Some(v), Some(e)) => graph_from_vertex_edges(v, e),
                _ => Err(VerifyError::malformed("graph object must have `V` and `E` keys")),
            },
            other => graph_from_matrix_value(other),
        }
    }

    fn checks() -> &'static [Check<Graph>] {
        &CHECKS
    }
}
