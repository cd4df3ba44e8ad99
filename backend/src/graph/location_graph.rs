use log::debug;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use super::error::{GraphError, GraphResult};
use crate::models::Location;

/// Directed road segment between two locations, weighted in kilometres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: Location,
    pub to: Location,
    pub distance: f64,
}

impl Edge {
    pub fn new(from: impl Into<Location>, to: impl Into<Location>, distance: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            distance,
        }
    }

    fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
            distance: self.distance,
        }
    }
}

/// Topology as it appears in the `[graph]` section of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Add the reverse of every edge with the same weight.
    #[serde(default)]
    pub bidirectional: bool,
}

/// All-pairs shortest travel distances between known locations.
///
/// Built once with [`LocationGraph::build`]; lookups afterwards are a table
/// index. Unreachable pairs have an infinite distance.
#[derive(Debug, Clone)]
pub struct LocationGraph {
    index: HashMap<Location, usize>,
    locations: Vec<Location>,
    /// Row-major `locations.len()²` table, `distances[from * n + to]`.
    distances: Vec<f64>,
}

impl LocationGraph {
    /// Build the graph and precompute shortest distances from every vertex.
    ///
    /// # Errors
    /// * [`GraphError::UnknownVertex`] if an edge endpoint is not in `vertices`
    /// * [`GraphError::NegativeWeight`] / [`GraphError::InvalidWeight`] for
    ///   negative or non-finite weights
    pub fn build<V, E>(vertices: V, edges: E) -> GraphResult<Self>
    where
        V: IntoIterator<Item = Location>,
        E: IntoIterator<Item = Edge>,
    {
        let mut index = HashMap::new();
        let mut locations = Vec::new();
        for vertex in vertices {
            if !index.contains_key(&vertex) {
                index.insert(vertex.clone(), locations.len());
                locations.push(vertex);
            }
        }

        let n = locations.len();
        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut edge_count = 0usize;
        for edge in edges {
            if edge.distance < 0.0 {
                return Err(GraphError::NegativeWeight {
                    from: edge.from,
                    to: edge.to,
                    weight: edge.distance,
                });
            }
            if !edge.distance.is_finite() {
                return Err(GraphError::InvalidWeight {
                    from: edge.from,
                    to: edge.to,
                    weight: edge.distance,
                });
            }
            let from = Self::vertex_of(&index, &edge, &edge.from)?;
            let to = Self::vertex_of(&index, &edge, &edge.to)?;
            adjacency[from].push((to, edge.distance));
            edge_count += 1;
        }

        let mut distances = vec![f64::INFINITY; n * n];
        for (source, row) in distances.chunks_mut(n.max(1)).enumerate().take(n) {
            shortest_paths_from(&adjacency, source, row);
        }

        debug!(
            "Built location graph: {} locations, {} edges",
            n, edge_count
        );

        Ok(Self {
            index,
            locations,
            distances,
        })
    }

    /// Build from the configuration representation.
    pub fn from_config(config: &GraphConfig) -> GraphResult<Self> {
        let edges = config.edges.iter().flat_map(|edge| {
            let reverse = config.bidirectional.then(|| edge.reversed());
            std::iter::once(edge.clone()).chain(reverse)
        });
        Self::build(config.locations.iter().cloned(), edges)
    }

    fn vertex_of(
        index: &HashMap<Location, usize>,
        edge: &Edge,
        vertex: &Location,
    ) -> GraphResult<usize> {
        index
            .get(vertex)
            .copied()
            .ok_or_else(|| GraphError::UnknownVertex {
                from: edge.from.clone(),
                to: edge.to.clone(),
                vertex: vertex.clone(),
            })
    }

    fn position(&self, location: &Location) -> GraphResult<usize> {
        self.index
            .get(location)
            .copied()
            .ok_or_else(|| GraphError::UnknownLocation(location.clone()))
    }

    /// Shortest travel distance from `from` to `to`.
    ///
    /// Returns `0.0` when both are the same location and `f64::INFINITY`
    /// when `to` cannot be reached.
    ///
    /// # Errors
    /// [`GraphError::UnknownLocation`] if either endpoint is not a vertex.
    pub fn distance(&self, from: &Location, to: &Location) -> GraphResult<f64> {
        let i = self.position(from)?;
        let j = self.position(to)?;
        if i == j {
            return Ok(0.0);
        }
        Ok(self.distances[i * self.locations.len() + j])
    }

    pub fn is_reachable(&self, from: &Location, to: &Location) -> bool {
        self.distance(from, to).is_ok_and(f64::is_finite)
    }

    pub fn contains(&self, location: &Location) -> bool {
        self.index.contains_key(location)
    }

    /// Locations in declaration order.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// Dijkstra from `source`, writing into the source's row of the table.
fn shortest_paths_from(adjacency: &[Vec<(usize, f64)>], source: usize, row: &mut [f64]) {
    row[source] = 0.0;
    let mut heap = BinaryHeap::new();
    heap.push(Reverse((OrderedFloat(0.0), source)));

    while let Some(Reverse((OrderedFloat(cost), node))) = heap.pop() {
        if cost > row[node] {
            continue;
        }
        for &(next, weight) in &adjacency[node] {
            let candidate = cost + weight;
            if candidate < row[next] {
                row[next] = candidate;
                heap.push(Reverse((OrderedFloat(candidate), next)));
            }
        }
    }
}
