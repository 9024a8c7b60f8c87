//! Path enumeration statistics over the finished graph. All counters are
//! arbitrary precision: a graph like Titin's realises more walks than any
//! machine word holds.

use std::collections::HashMap;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use super::ProteinGraph;
use crate::error::EntryError;
use crate::features::FeatureKind;

/// Which path statistics to compute. Counting is dynamic programming in
/// reverse topological order, but the binned variants hold one vector per
/// vertex and can get memory heavy on large proteins.
#[derive(
    Copy, Clone, Eq, PartialEq, Hash, Default, Debug, Serialize, Deserialize,
)]
pub struct StatisticsConfig {
    /// Count all walks from start to end.
    pub paths: bool,
    /// Count walks binned by the number of cleaved edges they traverse.
    pub paths_by_miscleavages: bool,
    /// Count walks binned by the number of edges they traverse.
    pub paths_by_hops: bool,
}

impl StatisticsConfig {
    const fn any_paths(self) -> bool {
        self.paths || self.paths_by_miscleavages || self.paths_by_hops
    }
}

/// Walk counts per variation feature kind: walks traversing at least one
/// edge the kind's qualifier is attached to.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FeaturePathCounts {
    /// Walks through at least one VARIANT branch.
    pub variant: BigUint,
    /// Walks through at least one MUTAGEN branch.
    pub mutagen: BigUint,
    /// Walks through at least one CONFLICT branch.
    pub conflict: BigUint,
}

/// The statistics of one finished graph.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of vertices.
    pub nodes: usize,
    /// Number of edges.
    pub edges: usize,
    /// Number of walks from start to end, if requested.
    pub paths: Option<BigUint>,
    /// Walk counts indexed by miscleavage count, if requested.
    pub paths_by_miscleavages: Option<Vec<BigUint>>,
    /// Walk counts indexed by hop count, if requested.
    pub paths_by_hops: Option<Vec<BigUint>>,
    /// Walk counts per variation kind, computed together with `paths`.
    pub paths_by_feature: Option<FeaturePathCounts>,
}

/// Compute the requested statistics. Never mutates the graph.
///
/// # Errors
/// [`EntryError::VerifyFailed`] if the graph lost its DAG property, since
/// the dynamic programming needs a topological order.
pub fn gather_statistics(
    graph: &ProteinGraph,
    config: StatisticsConfig,
) -> Result<Statistics, EntryError> {
    let mut statistics = Statistics {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        ..Statistics::default()
    };
    if !config.any_paths() {
        return Ok(statistics);
    }
    let order = graph.topological_order()?;

    if config.paths {
        let total = count_paths(graph, &order, |_| false);
        statistics.paths_by_feature = Some(FeaturePathCounts {
            variant: paths_through(graph, &order, &total, FeatureKind::Variant),
            mutagen: paths_through(graph, &order, &total, FeatureKind::Mutagen),
            conflict: paths_through(graph, &order, &total, FeatureKind::Conflict),
        });
        statistics.paths = Some(total);
    }
    if config.paths_by_miscleavages {
        statistics.paths_by_miscleavages = Some(count_paths_binned(graph, &order, |edge| {
            usize::from(graph.graph()[edge].cleaved)
        }));
    }
    if config.paths_by_hops {
        statistics.paths_by_hops = Some(count_paths_binned(graph, &order, |_| 1));
    }
    Ok(statistics)
}

/// Walks from start to end avoiding the excluded edges:
/// `f(end) = 1`, `f(v) = sum of f(successor)` in reverse topological order.
fn count_paths(
    graph: &ProteinGraph,
    order: &[NodeIndex],
    exclude: impl Fn(EdgeIndex) -> bool,
) -> BigUint {
    let mut counts: HashMap<NodeIndex, BigUint> = HashMap::new();
    counts.insert(graph.end(), BigUint::one());
    for &node in order.iter().rev() {
        if node == graph.end() {
            continue;
        }
        let mut total = BigUint::zero();
        for edge in graph.graph().edges_directed(node, Direction::Outgoing) {
            if exclude(edge.id()) {
                continue;
            }
            if let Some(count) = counts.get(&edge.target()) {
                total += count;
            }
        }
        counts.insert(node, total);
    }
    counts.remove(&graph.start()).unwrap_or_default()
}

/// Walks traversing at least one edge qualified with `kind`: the total minus
/// the walks that avoid every such edge.
fn paths_through(
    graph: &ProteinGraph,
    order: &[NodeIndex],
    total: &BigUint,
    kind: FeatureKind,
) -> BigUint {
    let avoiding = count_paths(graph, order, |edge| {
        graph.graph()[edge]
            .qualifiers
            .iter()
            .any(|qualifier| qualifier.kind == kind)
    });
    total - avoiding
}

/// The binned walk counts: one polynomial per vertex whose coefficient at
/// index `k` counts the walks to the end accumulating `k` along the edges,
/// where every edge contributes its shift.
fn count_paths_binned(
    graph: &ProteinGraph,
    order: &[NodeIndex],
    shift: impl Fn(EdgeIndex) -> usize,
) -> Vec<BigUint> {
    let mut polynomials: HashMap<NodeIndex, Vec<BigUint>> = HashMap::new();
    polynomials.insert(graph.end(), vec![BigUint::one()]);
    for &node in order.iter().rev() {
        if node == graph.end() {
            continue;
        }
        let mut polynomial: Vec<BigUint> = Vec::new();
        for edge in graph.graph().edges_directed(node, Direction::Outgoing) {
            let Some(child) = polynomials.get(&edge.target()) else {
                continue;
            };
            let offset = shift(edge.id());
            if polynomial.len() < child.len() + offset {
                polynomial.resize(child.len() + offset, BigUint::zero());
            }
            for (degree, count) in child.iter().enumerate() {
                polynomial[degree + offset] += count;
            }
        }
        polynomials.insert(node, polynomial);
    }
    polynomials.remove(&graph.start()).unwrap_or_default()
}
