//! N terminal cleavage events: initiator methionine removal and signal
//! peptide cleavage. Both add a qualified skip edge from the start sentinel
//! past the cleaved region while keeping the uncleaved chain.

use super::{Feature, Qualifier};
use super::substitution::{feature_error, resolve};
use crate::error::EntryError;
use crate::graph::{Edge, ProteinGraph};

/// Apply an INIT_MET feature: a skip edge from the start sentinel to the
/// second residue.
pub(crate) fn apply_init_met(
    graph: &mut ProteinGraph,
    feature: &Feature,
) -> Result<(), EntryError> {
    if feature.location.start != 1 || feature.location.end != 1 {
        return Err(feature_error(
            feature,
            "initiator methionine must sit at position 1",
        ));
    }
    let first = resolve(graph, feature, 1)?;
    if graph.graph()[first].aminoacid != "M" {
        return Err(feature_error(feature, "position 1 is not a methionine"));
    }
    let after = resolve(graph, feature, 2)?;
    let start = graph.start();
    graph
        .graph_mut()
        .add_edge(start, after, Edge::qualified(Qualifier::new(feature)));
    Ok(())
}

/// Apply a SIGNAL feature: a skip edge from the start sentinel to the first
/// residue of the mature chain.
pub(crate) fn apply_signal(graph: &mut ProteinGraph, feature: &Feature) -> Result<(), EntryError> {
    if feature.location.start != 1 {
        return Err(feature_error(feature, "signal peptide must start at position 1"));
    }
    let after = resolve(graph, feature, feature.location.end + 1)?;
    let start = graph.start();
    graph
        .graph_mut()
        .add_edge(start, after, Edge::qualified(Qualifier::new(feature)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureKind, FeatureLocation};

    fn feature(kind: FeatureKind, start: u32, end: u32) -> Feature {
        Feature {
            kind,
            location: FeatureLocation { start, end },
            description: String::new(),
            id: None,
        }
    }

    #[test]
    fn init_met_adds_the_shortened_walk() {
        let mut graph = ProteinGraph::canonical("MAAK", "P12345");
        apply_init_met(&mut graph, &feature(FeatureKind::InitMet, 1, 1)).unwrap();
        assert_eq!(graph.walk_sequences(), vec!["AAK", "MAAK"]);
    }

    #[test]
    fn init_met_requires_a_methionine() {
        let mut graph = ProteinGraph::canonical("KAAM", "P12345");
        assert!(matches!(
            apply_init_met(&mut graph, &feature(FeatureKind::InitMet, 1, 1)),
            Err(EntryError::FeatureResolution { .. })
        ));
    }

    #[test]
    fn signal_skips_the_whole_signal_peptide() {
        let mut graph = ProteinGraph::canonical("MALWARE", "P12345");
        apply_signal(&mut graph, &feature(FeatureKind::Signal, 1, 3)).unwrap();
        assert_eq!(graph.walk_sequences(), vec!["MALWARE", "WARE"]);
    }

    #[test]
    fn signal_must_be_n_terminal() {
        let mut graph = ProteinGraph::canonical("MALWARE", "P12345");
        assert!(matches!(
            apply_signal(&mut graph, &feature(FeatureKind::Signal, 2, 3)),
            Err(EntryError::FeatureResolution { .. })
        ));
    }
}
