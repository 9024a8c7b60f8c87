//! End to end scenarios over the public API: one entry in, one finished
//! graph and statistics row out.

use num_bigint::BigUint;
use pepgraph::prelude::*;

fn entry(sequence: &str) -> ProteinEntry {
    ProteinEntry {
        accessions: vec!["P12345".to_string()],
        entry_name: "TEST_HUMAN".to_string(),
        description: "RecName: Full=Test protein;".to_string(),
        sequence: sequence.to_string(),
        features: Vec::new(),
        comments: Vec::new(),
    }
}

fn feature(kind: FeatureKind, start: u32, end: u32, description: &str, id: Option<&str>) -> Feature {
    Feature {
        kind,
        location: FeatureLocation { start, end },
        description: description.to_string(),
        id: id.map(str::to_string),
    }
}

fn all_statistics() -> GeneratorConfig {
    GeneratorConfig {
        statistics: StatisticsConfig {
            paths: true,
            paths_by_miscleavages: true,
            paths_by_hops: true,
        },
        verify_graph: true,
        ..GeneratorConfig::default()
    }
}

fn counts(values: &[u32]) -> Option<Vec<BigUint>> {
    Some(values.iter().map(|&value| BigUint::from(value)).collect())
}

#[test]
fn minimal_sequence_without_features() {
    let mut config = all_statistics();
    config.no_merge = true;
    let table = config.mass_table();
    let (_, row) = process_entry(&entry("MK"), &config, &table).unwrap();
    assert_eq!(row.statistics.nodes, 4);
    assert_eq!(row.statistics.edges, 3);
    // K sits before the end sentinel, so trypsin finds nothing to cleave
    assert_eq!(row.cleaved_edges, 0);
    assert_eq!(row.statistics.paths, Some(BigUint::from(1_u32)));

    config.no_merge = false;
    let (merged, _) = process_entry(&entry("MK"), &config, &table).unwrap();
    assert_eq!(merged.node_count(), 3);
    assert_eq!(merged.walk_sequences(), vec!["MK".to_string()]);
}

#[test]
fn a_single_tryptic_cleavage() {
    let config = all_statistics();
    let table = config.mass_table();
    let (_, row) = process_entry(&entry("MKAP"), &config, &table).unwrap();
    assert_eq!(row.cleaved_edges, 1);
    // the proline blocks the cut
    let (_, row) = process_entry(&entry("MKPA"), &config, &table).unwrap();
    assert_eq!(row.cleaved_edges, 0);
}

#[test]
fn one_variant_doubles_the_paths() {
    let config = all_statistics();
    let table = config.mass_table();
    let mut with_variant = entry("ACDE");
    with_variant
        .features
        .push(feature(FeatureKind::Variant, 2, 2, "C -> G", None));
    let (graph, row) = process_entry(&with_variant, &config, &table).unwrap();
    assert_eq!(graph.walk_sequences(), vec!["ACDE".to_string(), "AGDE".to_string()]);
    assert_eq!(row.statistics.paths, Some(BigUint::from(2_u32)));
    // no cleavages under trypsin, both paths land in the zero bin
    assert_eq!(row.statistics.paths_by_miscleavages, counts(&[2]));
    assert_eq!(row.feature_counts.variants, Some(1));
}

#[test]
fn init_met_adds_the_processed_form() {
    let config = all_statistics();
    let table = config.mass_table();
    let mut with_init_met = entry("MAAK");
    with_init_met
        .features
        .push(feature(FeatureKind::InitMet, 1, 1, "Removed", None));
    let (graph, row) = process_entry(&with_init_met, &config, &table).unwrap();
    assert_eq!(graph.walk_sequences(), vec!["AAK".to_string(), "MAAK".to_string()]);
    assert_eq!(row.statistics.paths, Some(BigUint::from(2_u32)));
    // the terminal lysine sits before the end sentinel: no cut
    assert_eq!(row.cleaved_edges, 0);
    assert_eq!(row.feature_counts.init_met, Some(1));
}

#[test]
fn an_isoform_is_a_complete_alternative_path() {
    let config = all_statistics();
    let table = config.mass_table();
    let mut with_isoform = entry("ACDE");
    with_isoform.features.push(feature(
        FeatureKind::VarSeq,
        2,
        3,
        "CD -> GH (in isoform 2)",
        Some("VSP_000001"),
    ));
    with_isoform.comments.push(
        "ALTERNATIVE PRODUCTS: Event=Alternative splicing; Named isoforms=2; \
         Name=1; IsoId=P12345-1; Sequence=Displayed; \
         Name=2; IsoId=P12345-2; Sequence=VSP_000001;"
            .to_string(),
    );
    let (graph, row) = process_entry(&with_isoform, &config, &table).unwrap();
    assert_eq!(graph.walk_sequences(), vec!["ACDE".to_string(), "AGHE".to_string()]);
    assert_eq!(row.statistics.paths, Some(BigUint::from(2_u32)));
    assert_eq!(row.feature_counts.isoforms, Some(2));
    let isoform_runs: Vec<String> = graph
        .graph()
        .node_indices()
        .filter(|&node| graph.graph()[node].isoform_accession.is_some())
        .map(|node| graph.graph()[node].aminoacid.clone())
        .collect();
    assert_eq!(isoform_runs, vec!["GH".to_string()]);
}

#[test]
fn the_verifier_rejects_a_cycle() {
    let mut graph = ProteinGraph::canonical("ACDE", "P12345");
    let late = graph.node_at_position(3).unwrap();
    let early = graph.node_at_position(1).unwrap();
    graph
        .graph_mut()
        .add_edge(late, early, Default::default());
    assert!(matches!(
        verify_graph(&graph),
        Err(EntryError::VerifyFailed { .. })
    ));
}

#[test]
fn skipping_feature_kinds_disables_their_counters() {
    let mut config = all_statistics();
    config.skip_variants = true;
    let table = config.mass_table();
    let mut with_variant = entry("ACDE");
    with_variant
        .features
        .push(feature(FeatureKind::Variant, 2, 2, "C -> G", None));
    let (graph, row) = process_entry(&with_variant, &config, &table).unwrap();
    assert_eq!(graph.walk_sequences(), vec!["ACDE".to_string()]);
    assert_eq!(row.feature_counts.variants, None);
    assert_eq!(row.statistics.paths, Some(BigUint::from(1_u32)));
}

#[test]
fn weights_flow_through_the_pipeline() {
    let mut config = all_statistics();
    config.weights = WeightConfig {
        monoisotopic_to_end: true,
        ..WeightConfig::default()
    };
    let table = config.mass_table();
    let (graph, _) = process_entry(&entry("MKAP"), &config, &table).unwrap();
    // base weights are implied by the to end annotation
    let first = graph.outgoing(graph.start()).next().unwrap();
    assert_eq!(
        graph.graph()[first].mono_weight,
        table.run("MK", MassMode::Monoisotopic)
    );
    assert_eq!(
        graph.graph()[first].mono_weight_to_end,
        table.run("AP", MassMode::Monoisotopic)
    );
}
