//! Weight annotation: per edge residue masses and the minimum mass still
//! ahead of every vertex.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use super::ProteinGraph;
use crate::error::EntryError;
use crate::mass::{MassMode, MassTable, Weight};

/// Which weight annotations to write. The `*_to_end` modes need their base
/// mode, [`Self::normalised`] turns it on for them.
#[derive(
    Copy, Clone, Eq, PartialEq, Hash, Default, Debug, Serialize, Deserialize,
)]
pub struct WeightConfig {
    /// Annotate `mono_weight` on every edge.
    pub monoisotopic: bool,
    /// Annotate `avrg_weight` on every edge.
    pub average: bool,
    /// Annotate `mono_weight_to_end` on every edge.
    pub monoisotopic_to_end: bool,
    /// Annotate `avrg_weight_to_end` on every edge.
    pub average_to_end: bool,
}

impl WeightConfig {
    /// Turn the base modes on wherever a to end mode needs them.
    pub const fn normalised(self) -> Self {
        Self {
            monoisotopic: self.monoisotopic || self.monoisotopic_to_end,
            average: self.average || self.average_to_end,
            ..self
        }
    }

    /// Whether any annotation is requested at all.
    pub const fn any(self) -> bool {
        self.monoisotopic || self.average || self.monoisotopic_to_end || self.average_to_end
    }
}

/// Annotate the requested weights. Every edge is charged for the residue run
/// of the vertex it enters, so edges into the end sentinel carry zero. The
/// to end weights are propagated in reverse topological order and recorded
/// on every incoming edge of the vertex they describe.
///
/// # Errors
/// [`EntryError::InputInvalid`] if a residue run contains a letter outside
/// the alphabet, [`EntryError::VerifyFailed`] if the graph lost its DAG
/// property.
pub fn annotate_weights(
    graph: &mut ProteinGraph,
    table: &MassTable,
    config: WeightConfig,
) -> Result<(), EntryError> {
    let config = config.normalised();
    if !config.any() {
        return Ok(());
    }

    let edges: Vec<EdgeIndex> = graph.graph().edge_indices().collect();
    for &edge in &edges {
        let Some((_, target)) = graph.graph().edge_endpoints(edge) else {
            continue;
        };
        let head = &graph.graph()[target];
        let (mono, avrg) = if head.is_sentinel() {
            (Weight::zero(table.kind()), Weight::zero(table.kind()))
        } else {
            let run = |mode| {
                table
                    .run(&head.aminoacid, mode)
                    .ok_or_else(|| EntryError::InputInvalid {
                        reason: format!("residue run {:?} contains letters outside the alphabet", head.aminoacid),
                    })
            };
            (run(MassMode::Monoisotopic)?, run(MassMode::Average)?)
        };
        let data = &mut graph.graph_mut()[edge];
        if config.monoisotopic {
            data.mono_weight = Some(mono);
        }
        if config.average {
            data.avrg_weight = Some(avrg);
        }
    }

    if config.monoisotopic_to_end || config.average_to_end {
        let order = graph.topological_order()?;
        if config.monoisotopic_to_end {
            annotate_to_end(graph, &order, MassMode::Monoisotopic, table);
        }
        if config.average_to_end {
            annotate_to_end(graph, &order, MassMode::Average, table);
        }
    }
    Ok(())
}

/// One reverse topological pass: the minimum of `edge weight + remaining`
/// over all outgoing edges, zero at the end sentinel.
fn annotate_to_end(
    graph: &mut ProteinGraph,
    order: &[NodeIndex],
    mode: MassMode,
    table: &MassTable,
) {
    let base = |graph: &ProteinGraph, edge: EdgeIndex| match mode {
        MassMode::Monoisotopic => graph.graph()[edge].mono_weight,
        MassMode::Average => graph.graph()[edge].avrg_weight,
    };
    let mut remaining: HashMap<NodeIndex, Weight> = HashMap::new();
    remaining.insert(graph.end(), Weight::zero(table.kind()));
    for &node in order.iter().rev() {
        if node == graph.end() {
            continue;
        }
        let mut minimum: Option<Weight> = None;
        for edge in graph.graph().edges_directed(node, Direction::Outgoing) {
            let Some(&ahead) = remaining.get(&edge.target()) else {
                continue;
            };
            let through = base(graph, edge.id()).unwrap_or_else(|| Weight::zero(table.kind())) + ahead;
            minimum = Some(minimum.map_or(through, |current| current.min(through)));
        }
        if let Some(value) = minimum {
            remaining.insert(node, value);
        }
    }
    for (&node, &value) in &remaining {
        let incoming: Vec<EdgeIndex> = graph.incoming(node).collect();
        for edge in incoming {
            let data = &mut graph.graph_mut()[edge];
            match mode {
                MassMode::Monoisotopic => data.mono_weight_to_end = Some(value),
                MassMode::Average => data.avrg_weight_to_end = Some(value),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::merge_chains;
    use crate::mass::MassKind;

    const ALL: WeightConfig = WeightConfig {
        monoisotopic: true,
        average: true,
        monoisotopic_to_end: true,
        average_to_end: true,
    };

    #[test]
    fn to_end_modes_imply_their_base_mode() {
        let config = WeightConfig {
            monoisotopic_to_end: true,
            ..WeightConfig::default()
        }
        .normalised();
        assert!(config.monoisotopic);
        assert!(!config.average);
    }

    #[test]
    fn edges_are_charged_for_the_run_they_enter() {
        let table = MassTable::new(MassKind::Int, MassTable::DEFAULT_FACTOR);
        let mut graph = ProteinGraph::canonical("AK", "P12345");
        merge_chains(&mut graph);
        annotate_weights(&mut graph, &table, ALL).unwrap();
        let expected = table.run("AK", MassMode::Monoisotopic).unwrap();
        let into_run = graph.outgoing(graph.start()).next().unwrap();
        assert_eq!(graph.graph()[into_run].mono_weight, Some(expected));
        let into_end = graph.incoming(graph.end()).next().unwrap();
        assert_eq!(
            graph.graph()[into_end].mono_weight,
            Some(Weight::zero(MassKind::Int))
        );
    }

    #[test]
    fn remaining_mass_shrinks_along_every_edge() {
        let table = MassTable::new(MassKind::Int, MassTable::DEFAULT_FACTOR);
        let mut graph = ProteinGraph::canonical("ACDE", "P12345");
        annotate_weights(&mut graph, &table, ALL).unwrap();
        for edge in graph.graph().edge_indices() {
            let (source, target) = graph.graph().edge_endpoints(edge).unwrap();
            for entering in graph.incoming(source).collect::<Vec<_>>() {
                let before = graph.graph()[entering].mono_weight_to_end.unwrap();
                let after = graph.graph()[edge].mono_weight_to_end.unwrap();
                assert!(after <= before, "mass ahead grew between {source:?} and {target:?}");
            }
        }
    }

    #[test]
    fn the_minimum_over_branches_wins() {
        let table = MassTable::new(MassKind::Int, MassTable::DEFAULT_FACTOR);
        let mut graph = ProteinGraph::canonical("AWA", "P12345");
        // a bypass of the heavy tryptophan: G is the lighter alternative
        let feature = crate::features::Feature {
            kind: crate::features::FeatureKind::Variant,
            location: crate::features::FeatureLocation { start: 2, end: 2 },
            description: "W -> G".to_string(),
            id: None,
        };
        crate::features::substitution::apply_substitution(&mut graph, &feature).unwrap();
        annotate_weights(&mut graph, &table, ALL).unwrap();
        let into_first = graph
            .incoming(graph.node_at_position(1).unwrap())
            .next()
            .unwrap();
        // the first vertex' own mass sits on the edge entering it, so the
        // remaining mass covers the lighter branch plus the final residue
        let expected = table.run("GA", MassMode::Monoisotopic).unwrap();
        assert_eq!(graph.graph()[into_first].mono_weight_to_end, Some(expected));
    }
}
