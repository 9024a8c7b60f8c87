//! Internal cleaved peptide regions (PROPEP, PEPTIDE): bypass edges that
//! make the region on its own a valid walk from start to end.

use super::substitution::resolve;
use super::{Feature, Qualifier};
use crate::error::EntryError;
use crate::graph::{Edge, ProteinGraph};

/// Apply a PROPEP or PEPTIDE feature: one qualified edge from the start
/// sentinel to the region's first residue and one from its last residue to
/// the end sentinel.
pub(crate) fn apply_cleaved_peptide(
    graph: &mut ProteinGraph,
    feature: &Feature,
) -> Result<(), EntryError> {
    let first = resolve(graph, feature, feature.location.start)?;
    let last = resolve(graph, feature, feature.location.end)?;
    let qualifier = Qualifier::new(feature);
    let (start, end) = (graph.start(), graph.end());
    graph
        .graph_mut()
        .add_edge(start, first, Edge::qualified(qualifier.clone()));
    graph
        .graph_mut()
        .add_edge(last, end, Edge::qualified(qualifier));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureKind, FeatureLocation};

    #[test]
    fn the_peptide_region_alone_becomes_a_walk() {
        let mut graph = ProteinGraph::canonical("ACDE", "P12345");
        let feature = Feature {
            kind: FeatureKind::Peptide,
            location: FeatureLocation { start: 2, end: 3 },
            description: "Active peptide".to_string(),
            id: None,
        };
        apply_cleaved_peptide(&mut graph, &feature).unwrap();
        assert_eq!(graph.walk_sequences(), vec!["ACD", "ACDE", "CD", "CDE"]);
    }
}
