//! The substitution protocol shared by VARIANT, MUTAGEN and CONFLICT: a
//! parallel branch spelling the alternative residues between the vertices
//! flanking the affected region.

use std::sync::Arc;

use petgraph::stable_graph::NodeIndex;

use super::{Feature, Qualifier, Replacement};
use crate::error::EntryError;
use crate::graph::{Edge, Node, ProteinGraph};

/// A feature resolution failure for the given feature.
pub(crate) fn feature_error(feature: &Feature, reason: impl Into<String>) -> EntryError {
    EntryError::FeatureResolution {
        kind: feature.kind,
        start: feature.location.start,
        end: feature.location.end,
        reason: reason.into(),
    }
}

/// Find the canonical vertex at `position`, or fail feature resolution.
pub(crate) fn resolve(
    graph: &ProteinGraph,
    feature: &Feature,
    position: u32,
) -> Result<NodeIndex, EntryError> {
    graph
        .node_at_position(position)
        .ok_or_else(|| feature_error(feature, format!("position {position} is not in the graph")))
}

/// The canonical residues at the feature's location, for checking a
/// description against the sequence it claims to change.
pub(crate) fn region_residues(
    graph: &ProteinGraph,
    feature: &Feature,
) -> Result<String, EntryError> {
    (feature.location.start..=feature.location.end)
        .map(|position| {
            resolve(graph, feature, position)
                .map(|node| graph.graph()[node].aminoacid.clone())
        })
        .collect()
}

/// Splice one alternative branch between two existing vertices. Every new
/// edge carries all the qualifiers so chain merging keeps the tags visible
/// on the branch boundaries. An empty residue run is a plain bypass edge.
pub(crate) fn splice_branch<F>(
    graph: &mut ProteinGraph,
    from: NodeIndex,
    to: NodeIndex,
    residues: &str,
    qualifiers: &[Qualifier],
    mut node_for: F,
) where
    F: FnMut(usize, char) -> Node,
{
    let tagged = || Edge {
        qualifiers: qualifiers.to_vec(),
        ..Edge::default()
    };
    let mut previous = from;
    for (offset, residue) in residues.chars().enumerate() {
        let node = graph.graph_mut().add_node(node_for(offset, residue));
        graph.graph_mut().add_edge(previous, node, tagged());
        previous = node;
    }
    graph.graph_mut().add_edge(previous, to, tagged());
}

/// Apply one VARIANT, MUTAGEN or CONFLICT feature.
pub(crate) fn apply_substitution(
    graph: &mut ProteinGraph,
    feature: &Feature,
) -> Result<(), EntryError> {
    let location = feature.location;
    let alternatives = match Replacement::parse(&feature.description) {
        Some(Replacement::Missing) => vec![String::new()],
        Some(Replacement::Substitution {
            original,
            alternatives,
        }) => {
            let actual = region_residues(graph, feature)?;
            if !original.is_empty() && original != actual {
                return Err(feature_error(
                    feature,
                    format!("description replaces {original} but the sequence reads {actual}"),
                ));
            }
            alternatives
        }
        None => {
            return Err(feature_error(
                feature,
                "description does not encode a replacement",
            ));
        }
    };

    let before = resolve(graph, feature, location.start - 1)?;
    let after = resolve(graph, feature, location.end + 1)?;
    let qualifiers = [Qualifier::new(feature)];
    let accession = Arc::clone(graph.accession());
    for alternative in &alternatives {
        splice_branch(graph, before, after, alternative, &qualifiers, |_, residue| {
            Node::inserted(residue, &accession)
        });
    }
    Ok(())
}
