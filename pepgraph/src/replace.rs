//! User defined residue replacement, applied before digestion so the
//! replacements participate in the cleavage rules.

use petgraph::Direction;
use petgraph::stable_graph::NodeIndex;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::graph::{Edge, ProteinGraph};

/// One replacement rule of the form `X -> A,B,C`: every vertex carrying the
/// single residue `X` gains one parallel alternative per target residue.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ReplacementRule {
    /// The residue to replace.
    pub from: char,
    /// The alternative residues.
    pub to: Vec<char>,
}

impl std::str::FromStr for ReplacementRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (left, right) = s
            .split_once("->")
            .ok_or_else(|| format!("replacement rule {s:?} misses the '->' arrow"))?;
        let from = left.trim();
        let (Some(from), 1) = (from.chars().next(), from.chars().count()) else {
            return Err(format!("left side of {s:?} must be a single residue"));
        };
        let to = right
            .split(',')
            .map(|target| {
                let target = target.trim();
                match (target.chars().next(), target.chars().count()) {
                    (Some(residue), 1) if residue.is_ascii_uppercase() => Ok(residue),
                    _ => Err(format!("target {target:?} in {s:?} is not a single residue")),
                }
            })
            .collect::<Result<Vec<char>, String>>()?;
        if !from.is_ascii_uppercase() {
            return Err(format!("residue {from:?} is not an uppercase letter"));
        }
        if to.is_empty() {
            return Err(format!("replacement rule {s:?} has no targets"));
        }
        Ok(Self { from, to })
    }
}

impl std::fmt::Display for ReplacementRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> ", self.from)?;
        for (index, target) in self.to.iter().enumerate() {
            if index > 0 {
                write!(f, ",")?;
            }
            write!(f, "{target}")?;
        }
        Ok(())
    }
}

/// Add the parallel alternatives for every rule. Returns the number of
/// alternative vertices added.
pub fn replace_residues(graph: &mut ProteinGraph, rules: &[ReplacementRule]) -> usize {
    if rules.is_empty() {
        return 0;
    }
    let mut added = 0;
    let nodes: Vec<NodeIndex> = graph.graph().node_indices().collect();
    for node in nodes {
        let aminoacid = &graph.graph()[node].aminoacid;
        let Some(rule) = rules
            .iter()
            .find(|rule| aminoacid.len() == 1 && aminoacid.as_bytes()[0] == rule.from as u8)
        else {
            continue;
        };
        let incoming: Vec<(NodeIndex, Edge)> = graph
            .graph()
            .edges_directed(node, Direction::Incoming)
            .map(|edge| (edge.source(), edge.weight().clone()))
            .collect();
        let outgoing: Vec<(NodeIndex, Edge)> = graph
            .graph()
            .edges_directed(node, Direction::Outgoing)
            .map(|edge| (edge.target(), edge.weight().clone()))
            .collect();
        for &target in &rule.to {
            let mut alternative = graph.graph()[node].clone();
            alternative.aminoacid = target.to_string();
            let alternative = graph.graph_mut().add_node(alternative);
            for (source, edge) in &incoming {
                graph.graph_mut().add_edge(*source, alternative, edge.clone());
            }
            for (destination, edge) in &outgoing {
                graph
                    .graph_mut()
                    .add_edge(alternative, *destination, edge.clone());
            }
            added += 1;
        }
    }
    added
}
