//! Proteolytic digestion: marking edges as cleavage boundaries based on the
//! residue pair they connect. Digestion never removes anything, a cleaved
//! edge is simply excluded from chain merging and counted as a potential
//! miscleavage by the statistics.

use petgraph::stable_graph::EdgeIndex;
use serde::{Deserialize, Serialize};

use crate::graph::ProteinGraph;

/// The digestion rule to apply.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Debug, Serialize, Deserialize,
)]
pub enum DigestMode {
    /// Cleave after lysine or arginine unless a proline follows.
    #[default]
    Trypsin,
    /// Cleave at every residue boundary.
    Full,
    /// Do not digest at all.
    Skip,
}

impl std::fmt::Display for DigestMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trypsin => write!(f, "trypsin"),
            Self::Full => write!(f, "full"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

impl std::str::FromStr for DigestMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trypsin" => Ok(Self::Trypsin),
            "full" => Ok(Self::Full),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown digestion {other:?}")),
        }
    }
}

/// Mark the cleavage edges for the given mode and return how many edges were
/// newly marked. Edges touching a sentinel are never cleaved, so a terminal
/// lysine does not count as a cut site.
pub fn digest(graph: &mut ProteinGraph, mode: DigestMode) -> usize {
    if mode == DigestMode::Skip {
        return 0;
    }
    let mut marked = 0;
    let edges: Vec<EdgeIndex> = graph.graph().edge_indices().collect();
    for edge in edges {
        let Some((source, target)) = graph.graph().edge_endpoints(edge) else {
            continue;
        };
        let cut = match mode {
            DigestMode::Skip => false,
            DigestMode::Full => {
                !graph.graph()[source].is_sentinel() && !graph.graph()[target].is_sentinel()
            }
            DigestMode::Trypsin => {
                matches!(graph.graph()[source].last_residue(), Some(b'K' | b'R'))
                    && graph.graph()[target]
                        .first_residue()
                        .is_some_and(|residue| residue != b'P')
            }
        };
        if cut && !graph.graph()[edge].cleaved {
            graph.graph_mut()[edge].cleaved = true;
            marked += 1;
        }
    }
    marked
}
