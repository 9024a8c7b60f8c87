//! Structural simplification: chain merging and parallel edge collapsing.
//! Both preserve the set of residue strings realisable by walks from start
//! to end, the qualifier sets visible along every walk, and every cleavage
//! boundary.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use super::{Edge, ProteinGraph};
use crate::features::Qualifier;
use crate::mass::Weight;

fn absorb(into: &mut Option<Weight>, extra: Option<Weight>) {
    if let (Some(a), Some(b)) = (*into, extra) {
        *into = Some(a + b);
    }
}

/// Whether the unique edge leaving `node` may be contracted: both endpoints
/// interior, the successor reachable through this edge only, the boundary
/// not a cleavage site, and both vertices from the same (isoform) sequence.
fn forward_contraction(graph: &ProteinGraph, node: NodeIndex) -> Option<(EdgeIndex, NodeIndex)> {
    if !graph.graph().contains_node(node) || graph.graph()[node].is_sentinel() {
        return None;
    }
    let mut outgoing = graph.graph().edges_directed(node, Direction::Outgoing);
    let edge = outgoing.next()?;
    if outgoing.next().is_some() {
        return None;
    }
    let successor = edge.target();
    if successor == node
        || graph.graph()[successor].is_sentinel()
        || graph
            .graph()
            .edges_directed(successor, Direction::Incoming)
            .count()
            != 1
        || edge.weight().cleaved
    {
        return None;
    }
    let (a, b) = (&graph.graph()[node], &graph.graph()[successor]);
    (a.accession == b.accession && a.isoform_accession == b.isoform_accession)
        .then(|| (edge.id(), successor))
}

/// Merge every chain of vertices connected through uncleaved single
/// out/single in edges into one vertex whose residue run is the ordered
/// concatenation, keeping the position of the run's first vertex. Any
/// weights already present on the contracted edge are folded into the
/// surviving vertex' incoming edges. Returns the number of vertices spliced
/// out.
pub fn merge_chains(graph: &mut ProteinGraph) -> usize {
    let mut merged = 0;
    let mut candidates: Vec<NodeIndex> = graph.graph().node_indices().collect();
    while let Some(node) = candidates.pop() {
        while let Some((edge, successor)) = forward_contraction(graph, node) {
            let removed = graph.graph()[edge].clone();
            let outgoing: Vec<(NodeIndex, Edge)> = graph
                .graph()
                .edges_directed(successor, Direction::Outgoing)
                .map(|leaving| (leaving.target(), leaving.weight().clone()))
                .collect();
            let run = graph.graph()[successor].aminoacid.clone();
            graph.graph_mut()[node].aminoacid.push_str(&run);
            let incoming: Vec<EdgeIndex> = graph.incoming(node).collect();
            for entering in incoming {
                let data = &mut graph.graph_mut()[entering];
                absorb(&mut data.mono_weight, removed.mono_weight);
                absorb(&mut data.avrg_weight, removed.avrg_weight);
            }
            graph.graph_mut().remove_node(successor);
            for (target, data) in outgoing {
                graph.graph_mut().add_edge(node, target, data);
            }
            merged += 1;
        }
    }
    merged
}

/// Collapse parallel edges: within every class of edges sharing source,
/// target, qualifier set and cleavage flag only one edge survives. Classes
/// with distinct qualifier sets stay as distinct parallel edges, and a
/// cleaved edge is never folded into an uncleaved one. Weight attributes of
/// the class members are equal by construction (every member spans the same
/// residue run). Returns the number of edges removed.
pub fn collapse_parallel_edges(graph: &mut ProteinGraph) -> usize {
    let mut removed = 0;
    let mut classes: HashMap<(NodeIndex, NodeIndex, Vec<Qualifier>, bool), EdgeIndex> =
        HashMap::new();
    let edges: Vec<EdgeIndex> = graph.graph().edge_indices().collect();
    for edge in edges {
        let Some((source, target)) = graph.graph().edge_endpoints(edge) else {
            continue;
        };
        let data = &graph.graph()[edge];
        let key = (source, target, data.qualifiers.clone(), data.cleaved);
        if classes.contains_key(&key) {
            graph.graph_mut().remove_edge(edge);
            removed += 1;
        } else {
            classes.insert(key, edge);
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{DigestMode, digest};
    use crate::features::{Feature, FeatureKind, FeatureLocation};

    fn variant(start: u32, end: u32, description: &str) -> Feature {
        Feature {
            kind: FeatureKind::Variant,
            location: FeatureLocation { start, end },
            description: description.to_string(),
            id: None,
        }
    }

    #[test]
    fn a_canonical_graph_merges_into_a_single_vertex() {
        let mut graph = ProteinGraph::canonical("MKAP", "P12345");
        merge_chains(&mut graph);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        let merged = graph
            .graph()
            .node_indices()
            .find(|&node| !graph.graph()[node].is_sentinel())
            .unwrap();
        assert_eq!(graph.graph()[merged].aminoacid, "MKAP");
        assert_eq!(graph.graph()[merged].position, Some(1));
    }

    #[test]
    fn merging_never_crosses_a_cleaved_edge() {
        let mut graph = ProteinGraph::canonical("AKA", "P12345");
        digest(&mut graph, DigestMode::Trypsin);
        merge_chains(&mut graph);
        // start, AK, A, end: the cut between K and A survives as an edge
        assert_eq!(graph.node_count(), 4);
        let runs: Vec<&str> = graph
            .graph()
            .node_indices()
            .filter(|&node| !graph.graph()[node].is_sentinel())
            .map(|node| graph.graph()[node].aminoacid.as_str())
            .collect();
        assert!(runs.contains(&"AK") && runs.contains(&"A"));
        assert_eq!(
            graph
                .graph()
                .edge_indices()
                .filter(|&edge| graph.graph()[edge].cleaved)
                .count(),
            1
        );
    }

    #[test]
    fn merging_preserves_the_walks_of_a_branched_graph() {
        let mut graph = ProteinGraph::canonical("ACDEF", "P12345");
        crate::features::apply_features(
            &mut graph,
            &crate::entry::ProteinEntry {
                accessions: vec!["P12345".to_string()],
                sequence: "ACDEF".to_string(),
                features: vec![variant(2, 3, "CD -> W")],
                ..Default::default()
            },
            &crate::features::FeatureKind::ALL.into_iter().collect(),
        )
        .unwrap();
        let before = graph.walk_sequences();
        merge_chains(&mut graph);
        assert_eq!(graph.walk_sequences(), before);
    }

    #[test]
    fn identical_parallel_edges_collapse_to_one() {
        let mut graph = ProteinGraph::canonical("ACDE", "P12345");
        let feature = variant(2, 3, "Missing");
        crate::features::substitution::apply_substitution(&mut graph, &feature).unwrap();
        crate::features::substitution::apply_substitution(&mut graph, &feature).unwrap();
        assert_eq!(graph.walk_sequences(), vec!["ACDE", "AE", "AE"]);
        assert_eq!(collapse_parallel_edges(&mut graph), 1);
        assert_eq!(graph.walk_sequences(), vec!["ACDE", "AE"]);
        // idempotent
        assert_eq!(collapse_parallel_edges(&mut graph), 0);
    }

    #[test]
    fn distinct_qualifier_sets_stay_parallel() {
        let mut graph = ProteinGraph::canonical("ACDE", "P12345");
        crate::features::substitution::apply_substitution(&mut graph, &variant(2, 3, "Missing")).unwrap();
        let conflict = Feature {
            kind: FeatureKind::Conflict,
            location: FeatureLocation { start: 2, end: 3 },
            description: "Missing".to_string(),
            id: None,
        };
        crate::features::substitution::apply_substitution(&mut graph, &conflict).unwrap();
        assert_eq!(collapse_parallel_edges(&mut graph), 0);
        assert_eq!(graph.walk_sequences(), vec!["ACDE", "AE", "AE"]);
    }

    #[test]
    fn a_cleaved_edge_never_folds_into_an_uncleaved_one() {
        let mut graph = ProteinGraph::canonical("AK", "P12345");
        let a = graph.node_at_position(1).unwrap();
        let k = graph.node_at_position(2).unwrap();
        let duplicate = Edge {
            cleaved: true,
            ..Edge::default()
        };
        graph.graph_mut().add_edge(a, k, duplicate);
        assert_eq!(collapse_parallel_edges(&mut graph), 0);
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn collapse_and_merge_commute_on_walks() {
        let build = || {
            let mut graph = ProteinGraph::canonical("ACDEF", "P12345");
            let feature = variant(2, 4, "Missing");
            crate::features::substitution::apply_substitution(&mut graph, &feature).unwrap();
            crate::features::substitution::apply_substitution(&mut graph, &feature).unwrap();
            graph
        };
        let mut merged_first = build();
        merge_chains(&mut merged_first);
        collapse_parallel_edges(&mut merged_first);
        let mut collapsed_first = build();
        collapse_parallel_edges(&mut collapsed_first);
        merge_chains(&mut collapsed_first);
        assert_eq!(merged_first.walk_sequences(), collapsed_first.walk_sequences());
        assert_eq!(merged_first.node_count(), collapsed_first.node_count());
        assert_eq!(merged_first.edge_count(), collapsed_first.edge_count());
    }
}
