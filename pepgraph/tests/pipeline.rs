//! The whole pipeline against a real flat file: reader, workers, writer,
//! exporters.

use std::fs;
use std::path::PathBuf;

use pepgraph::prelude::*;

const FLAT_FILE: &str = "\
ID   FIRST_HUMAN             Reviewed;           4 AA.
AC   P00001;
DE   RecName: Full=First protein;
FT   VARIANT         2
FT                   /note=\"K -> R\"
SQ   SEQUENCE   4 AA;  400 MW;  0 CRC64;
     MKAP
//
ID   BROKEN_HUMAN            Reviewed;           4 AA.
AC   P00002;
FT   VARIANT         2
FT                   /note=\"Z -> W\"
SQ   SEQUENCE   4 AA;  400 MW;  0 CRC64;
     MKAP
//
ID   SECOND_HUMAN            Reviewed;           6 AA.
AC   P00003; Q00003;
DE   RecName: Full=Second protein;
SQ   SEQUENCE   6 AA;  600 MW;  0 CRC64;
     AKAKRA
//
";

fn scratch_dir(name: &str) -> PathBuf {
    let directory = std::env::temp_dir().join(format!(
        "pepgraph-test-{name}-{}",
        std::process::id()
    ));
    if directory.exists() {
        fs::remove_dir_all(&directory).unwrap();
    }
    fs::create_dir_all(&directory).unwrap();
    directory
}

fn run_over_fixture(name: &str, adjust: impl FnOnce(&mut GeneratorConfig)) -> (PathBuf, RunSummary, String) {
    let directory = scratch_dir(name);
    let input = directory.join("entries.dat");
    fs::write(&input, FLAT_FILE).unwrap();
    let mut config = GeneratorConfig {
        files: vec![input],
        num_of_processes: Some(2),
        statistics: StatisticsConfig {
            paths: true,
            paths_by_miscleavages: true,
            paths_by_hops: true,
        },
        verify_graph: true,
        output_csv: directory.join("statistics.csv"),
        ..GeneratorConfig::default()
    };
    adjust(&mut config);
    let summary = run(&config).unwrap();
    let csv = fs::read_to_string(&config.output_csv).unwrap();
    (directory, summary, csv)
}

#[test]
fn good_entries_end_up_in_the_csv_and_broken_ones_do_not() {
    let (_, summary, csv) = run_over_fixture("csv", |_| {});
    assert_eq!(summary.entries_read, 3);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.written, 2);
    // the variant of P00002 contradicts its sequence
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.read_errors, 0);

    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Accession,Entry ID,Number of isoforms"));
    assert!(csv.contains("P00001,FIRST_HUMAN"));
    assert!(csv.contains("P00003,SECOND_HUMAN"));
    assert!(!csv.contains("P00002"));
    // MKAP and its variant walk MRAP each cross exactly one cleaved edge
    assert!(csv.contains("\"[0, 2]\""));
}

#[test]
fn the_entry_limit_stops_the_reader() {
    let (_, summary, csv) = run_over_fixture("limit", |config| {
        config.num_of_entries = Some(1);
    });
    assert_eq!(summary.entries_read, 1);
    assert_eq!(summary.written, 1);
    assert!(csv.contains("P00001"));
    assert!(!csv.contains("P00003"));
}

#[test]
fn the_exclusion_list_drops_accessions_at_read_time() {
    let directory = scratch_dir("exclude");
    let exclusions = directory.join("exclude.csv");
    fs::write(&exclusions, "P00001\n").unwrap();
    let input = directory.join("entries.dat");
    fs::write(&input, FLAT_FILE).unwrap();
    let config = GeneratorConfig {
        files: vec![input],
        exclude_accessions: Some(exclusions),
        num_of_processes: Some(1),
        output_csv: directory.join("statistics.csv"),
        ..GeneratorConfig::default()
    };
    let summary = run(&config).unwrap();
    assert_eq!(summary.entries_read, 2);
    let csv = fs::read_to_string(directory.join("statistics.csv")).unwrap();
    assert!(!csv.contains("P00001"));
    assert!(csv.contains("P00003"));
}

#[test]
fn exporters_write_one_file_per_graph() {
    let (directory, summary, _) = run_over_fixture("export", |config| {
        config.export = ExportConfig {
            output_folder: config.output_csv.parent().unwrap().join("graphs"),
            in_directories: false,
            dot: true,
            graphml: true,
        };
    });
    assert_eq!(summary.processed, 2);
    let graphs = directory.join("graphs");
    for accession in ["P00001", "P00003"] {
        assert!(graphs.join(format!("{accession}.dot")).is_file());
        assert!(graphs.join(format!("{accession}.graphml")).is_file());
    }
    assert!(!graphs.join("P00002.dot").exists());
}

#[test]
fn missing_input_is_a_setup_failure() {
    let config = GeneratorConfig {
        files: vec![PathBuf::from("does-not-exist.dat")],
        ..GeneratorConfig::default()
    };
    assert!(matches!(run(&config), Err(PipelineError::Setup(_))));
}
