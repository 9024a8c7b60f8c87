//! The peptide graph itself: a directed acyclic multigraph with one source
//! and one sink, backed by a stable arena so feature application can splice
//! nodes and edges without invalidating indices.

mod simplify;
mod statistics;
mod verify;
mod weights;

use std::sync::Arc;

use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::error::EntryError;
use crate::features::Qualifier;
use crate::mass::Weight;

pub use simplify::{collapse_parallel_edges, merge_chains};
pub use statistics::{Statistics, StatisticsConfig, gather_statistics};
pub use verify::verify_graph;
pub use weights::{WeightConfig, annotate_weights};

/// The residue marker of the unique source vertex.
pub const START_SENTINEL: &str = "__start__";
/// The residue marker of the unique sink vertex.
pub const END_SENTINEL: &str = "__end__";

/// One vertex of the peptide graph: a run of one or more residues (more after
/// chain merging) together with its origin within the protein entry.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// The primary accession of the protein this vertex belongs to.
    pub accession: Arc<str>,
    /// One or more residue letters, or a sentinel marker.
    pub aminoacid: String,
    /// Offset in the canonical sequence (start of the run after merging).
    /// Absent on vertices inserted by variant application.
    pub position: Option<u32>,
    /// Set on vertices introduced by isoform substitution.
    pub isoform_accession: Option<Arc<str>>,
    /// Position within the isoform sequence, for isoform specific vertices.
    pub isoform_position: Option<u32>,
}

impl Node {
    /// A sentinel vertex. Sentinels carry no mass and are never cleaved.
    pub fn sentinel(marker: &str, position: u32, accession: &Arc<str>) -> Self {
        Self {
            accession: Arc::clone(accession),
            aminoacid: marker.to_string(),
            position: Some(position),
            isoform_accession: None,
            isoform_position: None,
        }
    }

    /// A canonical residue vertex at a one based sequence position.
    pub fn residue(residue: char, position: u32, accession: &Arc<str>) -> Self {
        Self {
            accession: Arc::clone(accession),
            aminoacid: residue.to_string(),
            position: Some(position),
            isoform_accession: None,
            isoform_position: None,
        }
    }

    /// A vertex inserted by a substitution, without a meaningful canonical
    /// position.
    pub fn inserted(residue: char, accession: &Arc<str>) -> Self {
        Self {
            accession: Arc::clone(accession),
            aminoacid: residue.to_string(),
            position: None,
            isoform_accession: None,
            isoform_position: None,
        }
    }

    /// A vertex on an isoform specific path.
    pub fn isoform(
        residue: char,
        accession: &Arc<str>,
        isoform_accession: &Arc<str>,
        isoform_position: u32,
    ) -> Self {
        Self {
            accession: Arc::clone(accession),
            aminoacid: residue.to_string(),
            position: None,
            isoform_accession: Some(Arc::clone(isoform_accession)),
            isoform_position: Some(isoform_position),
        }
    }

    /// Whether this vertex is the start or end sentinel.
    pub fn is_sentinel(&self) -> bool {
        self.aminoacid == START_SENTINEL || self.aminoacid == END_SENTINEL
    }

    /// The first residue of this vertex' run, if it is not a sentinel.
    pub fn first_residue(&self) -> Option<u8> {
        (!self.is_sentinel())
            .then(|| self.aminoacid.bytes().next())
            .flatten()
    }

    /// The last residue of this vertex' run, if it is not a sentinel.
    pub fn last_residue(&self) -> Option<u8> {
        (!self.is_sentinel())
            .then(|| self.aminoacid.bytes().last())
            .flatten()
    }
}

/// One edge of the peptide graph. Parallel edges between the same vertex pair
/// are meaningful as long as their qualifier sets differ.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Feature origin tags picked up while traversing variant regions.
    pub qualifiers: Vec<Qualifier>,
    /// True iff the digester marked this edge as a proteolytic cut point.
    pub cleaved: bool,
    /// Monoisotopic mass of the residue run this edge enters.
    pub mono_weight: Option<Weight>,
    /// Average mass of the residue run this edge enters.
    pub avrg_weight: Option<Weight>,
    /// Minimum monoisotopic mass along any path from here to the end vertex.
    pub mono_weight_to_end: Option<Weight>,
    /// Minimum average mass along any path from here to the end vertex.
    pub avrg_weight_to_end: Option<Weight>,
}

impl Edge {
    /// An edge carrying a single qualifier and nothing else.
    pub fn qualified(qualifier: Qualifier) -> Self {
        Self {
            qualifiers: vec![qualifier],
            ..Self::default()
        }
    }
}

/// The peptide graph of one protein entry, owned by a single worker from
/// construction through export.
#[derive(Clone, Debug)]
pub struct ProteinGraph {
    graph: StableDiGraph<Node, Edge>,
    start: NodeIndex,
    end: NodeIndex,
    accession: Arc<str>,
}

impl ProteinGraph {
    /// Build the canonical graph for a residue sequence: a linear chain
    /// `s -> v1 -> .. -> vn -> t` with the sentinels at positions `0` and
    /// `n + 1` and all edge attributes empty.
    pub fn canonical(sequence: &str, accession: &str) -> Self {
        let accession: Arc<str> = Arc::from(accession);
        let mut graph =
            StableDiGraph::with_capacity(sequence.len() + 2, sequence.len() + 1);
        let start = graph.add_node(Node::sentinel(START_SENTINEL, 0, &accession));
        let mut previous = start;
        for (offset, residue) in sequence.chars().enumerate() {
            let node = graph.add_node(Node::residue(residue, offset as u32 + 1, &accession));
            graph.add_edge(previous, node, Edge::default());
            previous = node;
        }
        let end = graph.add_node(Node::sentinel(
            END_SENTINEL,
            sequence.len() as u32 + 1,
            &accession,
        ));
        graph.add_edge(previous, end, Edge::default());
        Self {
            graph,
            start,
            end,
            accession,
        }
    }

    /// The unique source vertex.
    pub const fn start(&self) -> NodeIndex {
        self.start
    }

    /// The unique sink vertex.
    pub const fn end(&self) -> NodeIndex {
        self.end
    }

    /// The primary accession of the protein this graph was built from.
    pub fn accession(&self) -> &Arc<str> {
        &self.accession
    }

    /// The underlying arena.
    pub const fn graph(&self) -> &StableDiGraph<Node, Edge> {
        &self.graph
    }

    /// Mutable access to the underlying arena, for the transformation stages.
    pub fn graph_mut(&mut self) -> &mut StableDiGraph<Node, Edge> {
        &mut self.graph
    }

    /// The number of vertices.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// The number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Find the vertex at a canonical sequence position. The sentinels count
    /// as positions `0` and `n + 1`, so feature locations can be resolved
    /// uniformly. Vertices on isoform paths are never returned.
    pub fn node_at_position(&self, position: u32) -> Option<NodeIndex> {
        self.graph.node_indices().find(|&index| {
            let node = &self.graph[index];
            node.position == Some(position) && node.isoform_accession.is_none()
        })
    }

    /// A topological order over all vertices, or a verification failure if a
    /// transformation has introduced a cycle.
    pub fn topological_order(&self) -> Result<Vec<NodeIndex>, EntryError> {
        petgraph::algo::toposort(&self.graph, None).map_err(|_| EntryError::VerifyFailed {
            reason: "graph contains a directed cycle".to_string(),
        })
    }

    /// All edges leaving a vertex.
    pub fn outgoing(&self, index: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| edge.id())
    }

    /// All edges entering a vertex.
    pub fn incoming(&self, index: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph
            .edges_directed(index, Direction::Incoming)
            .map(|edge| edge.id())
    }

    /// The residue strings of every walk from start to end, in depth first
    /// order. Exponential in the number of branches, meant for small graphs
    /// (inspection and tests), not for Titin.
    pub fn walk_sequences(&self) -> Vec<String> {
        let mut walks = Vec::new();
        let mut stack = vec![(self.start, String::new())];
        while let Some((node, sequence)) = stack.pop() {
            if node == self.end {
                walks.push(sequence);
                continue;
            }
            for successor in self.graph.neighbors_directed(node, Direction::Outgoing) {
                let mut next = sequence.clone();
                if !self.graph[successor].is_sentinel() {
                    next.push_str(&self.graph[successor].aminoacid);
                }
                stack.push((successor, next));
            }
        }
        walks.sort();
        walks
    }
}
