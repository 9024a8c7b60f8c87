//! Invariant checks over a finished graph. The verifier never mutates, it
//! only reports the first violation it finds.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::stable_graph::NodeIndex;
use petgraph::visit::{Dfs, EdgeRef, IntoEdgeReferences, Reversed};

use super::{END_SENTINEL, ProteinGraph, START_SENTINEL};
use crate::error::EntryError;
use crate::features::Qualifier;

fn violation(reason: impl Into<String>) -> EntryError {
    EntryError::VerifyFailed {
        reason: reason.into(),
    }
}

/// Check that the graph still upholds its invariants: acyclic, exactly one
/// source and one sink (the sentinels, which no other vertex imitates),
/// every vertex on some walk from start to end, and no parallel edges left
/// sharing an identical qualifier set.
///
/// # Errors
/// [`EntryError::VerifyFailed`] naming the broken invariant.
pub fn verify_graph(graph: &ProteinGraph) -> Result<(), EntryError> {
    graph.topological_order()?;

    for node in graph.graph().node_indices() {
        let data = &graph.graph()[node];
        let incoming = graph
            .graph()
            .edges_directed(node, Direction::Incoming)
            .count();
        let outgoing = graph
            .graph()
            .edges_directed(node, Direction::Outgoing)
            .count();
        if incoming == 0 && node != graph.start() {
            return Err(violation(format!(
                "vertex {:?} is a second source",
                data.aminoacid
            )));
        }
        if outgoing == 0 && node != graph.end() {
            return Err(violation(format!(
                "vertex {:?} is a second sink",
                data.aminoacid
            )));
        }
        if data.is_sentinel() && node != graph.start() && node != graph.end() {
            return Err(violation("an interior vertex carries a sentinel marker"));
        }
    }
    if graph.graph()[graph.start()].aminoacid != START_SENTINEL {
        return Err(violation("the source is not the start sentinel"));
    }
    if graph.graph()[graph.end()].aminoacid != END_SENTINEL {
        return Err(violation("the sink is not the end sentinel"));
    }

    let reachable = reached(graph, graph.start(), false);
    if reachable.len() != graph.node_count() {
        return Err(violation(format!(
            "{} vertices are unreachable from the start",
            graph.node_count() - reachable.len()
        )));
    }
    let reaching = reached(graph, graph.end(), true);
    if reaching.len() != graph.node_count() {
        return Err(violation(format!(
            "{} vertices never reach the end",
            graph.node_count() - reaching.len()
        )));
    }

    let mut classes: HashMap<(NodeIndex, NodeIndex, &[Qualifier]), u32> = HashMap::new();
    for edge in graph.graph().edge_references() {
        let key = (
            edge.source(),
            edge.target(),
            edge.weight().qualifiers.as_slice(),
        );
        let seen = classes.entry(key).or_insert(0);
        *seen += 1;
        if *seen > 1 {
            return Err(violation(
                "parallel edges with an identical qualifier set survived collapsing",
            ));
        }
    }
    Ok(())
}

fn reached(graph: &ProteinGraph, from: NodeIndex, backwards: bool) -> HashSet<NodeIndex> {
    let mut seen = HashSet::new();
    if backwards {
        let reversed = Reversed(graph.graph());
        let mut dfs = Dfs::new(reversed, from);
        while let Some(node) = dfs.next(reversed) {
            seen.insert(node);
        }
    } else {
        let mut dfs = Dfs::new(graph.graph(), from);
        while let Some(node) = dfs.next(graph.graph()) {
            seen.insert(node);
        }
    }
    seen
}
