//! The producer/consumer runtime: one reader, N graph workers, one
//! statistics writer, wired with a bounded entry queue (back pressure
//! against a fast reader) and an unbounded statistics queue. Shutdown is
//! cooperative through stop tokens: a token always follows the last real
//! item on its queue.

use std::collections::HashSet;
use std::thread::ScopedJoinHandle;

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use crate::config::GeneratorConfig;
use crate::digest::digest;
use crate::embl::{EntryReader, load_exclusions};
use crate::entry::ProteinEntry;
use crate::error::{EntryError, PipelineError};
use crate::export::Exporters;
use crate::features::apply_features;
use crate::graph::{
    ProteinGraph, annotate_weights, collapse_parallel_edges, gather_statistics, merge_chains,
    verify_graph,
};
use crate::mass::MassTable;
use crate::output::{CSV_HEADER, StatisticsRow};
use crate::replace::replace_residues;

/// The capacity of the entry queue. Reading a flat file is much faster than
/// building graphs, without this bound the reader exhausts memory.
const ENTRY_QUEUE_CAPACITY: usize = 1000;

/// How often the writer reports progress.
const PROGRESS_INTERVAL: usize = 1000;

/// One message on a pipeline queue. Every consumer treats the first stop
/// token it receives as its exit signal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Message<T> {
    /// A real item.
    Item(T),
    /// The cooperative shutdown token.
    Stop,
}

/// What a finished run did.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    /// Entries handed to the workers.
    pub entries_read: usize,
    /// Entries that could not even be read.
    pub read_errors: usize,
    /// Entries that became graphs and statistics rows.
    pub processed: usize,
    /// Entries skipped over a local failure.
    pub skipped: usize,
    /// Statistics rows in the CSV.
    pub written: usize,
}

/// Run one entry through the whole transformation: canonical graph, feature
/// table, residue replacement, digestion, simplification, weights,
/// statistics and verification. Returns the finished graph (for export) and
/// its statistics row.
///
/// # Errors
/// Any [`EntryError`]; the caller skips the entry and continues.
pub fn process_entry(
    entry: &ProteinEntry,
    config: &GeneratorConfig,
    table: &MassTable,
) -> Result<(ProteinGraph, StatisticsRow), EntryError> {
    entry.validate()?;
    let mut graph = ProteinGraph::canonical(&entry.sequence, entry.primary_accession());
    let feature_counts = apply_features(&mut graph, entry, &config.enabled_kinds())?;
    replace_residues(&mut graph, &config.replace_aa);
    let cleaved_edges = digest(&mut graph, config.digestion);
    if !config.no_merge {
        merge_chains(&mut graph);
    }
    if !config.no_collapsing_edges {
        collapse_parallel_edges(&mut graph);
    }
    annotate_weights(&mut graph, table, config.weights)?;
    let statistics = gather_statistics(&graph, config.statistics)?;
    if config.verify_graph {
        verify_graph(&graph)?;
    }
    let row = StatisticsRow {
        accession: entry.primary_accession().to_string(),
        entry_name: entry.entry_name.clone(),
        feature_counts,
        cleaved_edges,
        statistics,
        description: (!config.no_description).then(|| entry.protein_name()),
    };
    Ok((graph, row))
}

/// Run the whole pipeline to completion.
///
/// # Errors
/// [`PipelineError`] only for unrecoverable setup or shutdown failures:
/// missing input files, an unwritable statistics sink, or a queue that
/// closed outside the shutdown protocol. Failures of single entries are
/// logged, counted in the summary, and never abort the run.
pub fn run(config: &GeneratorConfig) -> Result<RunSummary, PipelineError> {
    if config.files.is_empty() {
        return Err(PipelineError::Setup("no input files given".to_string()));
    }
    for file in &config.files {
        if !file.is_file() {
            return Err(PipelineError::Setup(format!(
                "input file {} does not exist",
                file.display()
            )));
        }
    }
    let exclude = match &config.exclude_accessions {
        Some(path) => load_exclusions(path).map_err(|error| {
            PipelineError::Setup(format!(
                "cannot read the exclusion list {}: {error}",
                path.display()
            ))
        })?,
        None => HashSet::new(),
    };
    let mut csv_writer = csv::Writer::from_path(&config.output_csv)?;
    csv_writer.write_record(CSV_HEADER)?;

    let workers = config.worker_count();
    let (entry_tx, entry_rx) = bounded::<Message<ProteinEntry>>(ENTRY_QUEUE_CAPACITY);
    let (stats_tx, stats_rx) = unbounded::<Message<StatisticsRow>>();
    log::info!(
        "reading {} file(s) with {workers} graph worker(s)",
        config.files.len()
    );

    std::thread::scope(|scope| {
        let reader = scope.spawn({
            let entry_tx = entry_tx.clone();
            let files = config.files.clone();
            let limit = config.num_of_entries;
            move || read_into(files, limit, exclude, &entry_tx)
        });
        let worker_handles: Vec<ScopedJoinHandle<'_, (usize, usize)>> = (0..workers)
            .map(|worker| {
                let entries = entry_rx.clone();
                let statistics = stats_tx.clone();
                scope.spawn(move || work(worker, config, &entries, &statistics))
            })
            .collect();
        drop(entry_rx);
        let expected = config.num_of_entries;
        let writer = scope.spawn(move || write_statistics(&stats_rx, csv_writer, expected));

        // supervision: reader done -> one stop token per worker, workers
        // done -> one stop token for the writer, writer done -> return
        let (entries_read, read_errors) = join_or(reader, (0, 1));
        for _ in 0..workers {
            if entry_tx.send(Message::Stop).is_err() {
                break;
            }
        }
        drop(entry_tx);

        let mut processed = 0;
        let mut skipped = 0;
        for handle in worker_handles {
            let (done, dropped) = join_or(handle, (0, 0));
            processed += done;
            skipped += dropped;
        }
        stats_tx
            .send(Message::Stop)
            .map_err(|_| PipelineError::ChannelClosed("statistics"))?;
        drop(stats_tx);

        let written = writer
            .join()
            .map_err(|_| PipelineError::Setup("the statistics writer panicked".to_string()))??;
        Ok(RunSummary {
            entries_read,
            read_errors,
            processed,
            skipped,
            written,
        })
    })
}

fn join_or<T>(handle: ScopedJoinHandle<'_, T>, fallback: T) -> T {
    handle.join().unwrap_or_else(|_| {
        log::error!("a pipeline thread panicked");
        fallback
    })
}

/// The reader task: stream entries into the bounded queue.
fn read_into(
    files: Vec<std::path::PathBuf>,
    limit: Option<usize>,
    exclude: HashSet<String>,
    entries: &Sender<Message<ProteinEntry>>,
) -> (usize, usize) {
    let mut sent = 0;
    let mut errors = 0;
    for result in EntryReader::new(files, limit, exclude) {
        match result {
            Ok(entry) => {
                if entries.send(Message::Item(entry)).is_err() {
                    log::error!("every graph worker is gone, reading stops");
                    break;
                }
                sent += 1;
            }
            Err(error) => {
                log::warn!("{error}");
                errors += 1;
            }
        }
    }
    (sent, errors)
}

/// One graph worker: build, transform, export, report. Local failures skip
/// the entry; a queue closing outside the protocol ends the worker.
fn work(
    worker: usize,
    config: &GeneratorConfig,
    entries: &Receiver<Message<ProteinEntry>>,
    statistics: &Sender<Message<StatisticsRow>>,
) -> (usize, usize) {
    let table = config.mass_table();
    let mut exporters = Exporters::from_config(&config.export);
    if let Err(error) = exporters.start_up() {
        log::error!("worker {worker} cannot start its exporters: {error}");
        return (0, 0);
    }
    let mut processed = 0;
    let mut skipped = 0;
    loop {
        match entries.recv() {
            Ok(Message::Item(entry)) => {
                let accession = entry.accessions.first().cloned().unwrap_or_default();
                match process_entry(&entry, config, &table) {
                    Ok((graph, row)) => {
                        if let Err(error) = exporters.export(&graph) {
                            log::warn!("skipping {accession}: {error}");
                            skipped += 1;
                            continue;
                        }
                        if statistics.send(Message::Item(row)).is_err() {
                            log::error!("worker {worker}: the statistics writer is gone");
                            break;
                        }
                        processed += 1;
                    }
                    Err(error) => {
                        log::warn!("skipping {accession}: {error}");
                        skipped += 1;
                    }
                }
            }
            Ok(Message::Stop) => break,
            Err(_) => {
                log::error!("worker {worker}: the entry queue closed before its stop token");
                break;
            }
        }
    }
    exporters.tear_down();
    (processed, skipped)
}

/// The writer task: drain the statistics queue into the CSV sink.
fn write_statistics(
    rows: &Receiver<Message<StatisticsRow>>,
    mut writer: csv::Writer<std::fs::File>,
    expected: Option<usize>,
) -> Result<usize, PipelineError> {
    let mut written = 0;
    loop {
        match rows.recv() {
            Ok(Message::Item(row)) => {
                writer.write_record(row.csv_record())?;
                written += 1;
                if written % PROGRESS_INTERVAL == 0 {
                    if let Some(total) = expected {
                        log::info!("{written}/{total} proteins written");
                    } else {
                        log::info!("{written} proteins written");
                    }
                }
            }
            Ok(Message::Stop) => break,
            Err(_) => return Err(PipelineError::ChannelClosed("statistics")),
        }
    }
    writer.flush()?;
    log::info!("finished, {written} proteins written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureKind;

    fn entry(sequence: &str) -> ProteinEntry {
        ProteinEntry {
            accessions: vec!["P12345".to_string()],
            entry_name: "TEST_HUMAN".to_string(),
            description: "RecName: Full=Test;".to_string(),
            sequence: sequence.to_string(),
            features: Vec::new(),
            comments: Vec::new(),
        }
    }

    #[test]
    fn a_plain_entry_flows_through_every_stage() {
        let config = GeneratorConfig {
            statistics: crate::graph::StatisticsConfig {
                paths: true,
                paths_by_miscleavages: true,
                paths_by_hops: true,
            },
            verify_graph: true,
            ..GeneratorConfig::default()
        };
        let table = config.mass_table();
        let (graph, row) = process_entry(&entry("MKAP"), &config, &table).unwrap();
        // MKAP digests once and merges into MK and AP around the cut
        assert_eq!(row.cleaved_edges, 1);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(row.statistics.nodes, 4);
        assert_eq!(
            row.statistics.paths,
            Some(num_bigint::BigUint::from(1_u32))
        );
        assert_eq!(row.description.as_deref(), Some("Test"));
    }

    #[test]
    fn invalid_entries_are_rejected_before_building() {
        let config = GeneratorConfig::default();
        let table = config.mass_table();
        assert!(matches!(
            process_entry(&entry("MK4P"), &config, &table),
            Err(EntryError::InputInvalid { .. })
        ));
    }

    #[test]
    fn feature_failures_are_local_errors() {
        let config = GeneratorConfig::default();
        let table = config.mass_table();
        let mut bad = entry("MKAP");
        bad.features.push(crate::features::Feature {
            kind: FeatureKind::Variant,
            location: crate::features::FeatureLocation { start: 2, end: 2 },
            description: "C -> G".to_string(),
            id: None,
        });
        assert!(matches!(
            process_entry(&bad, &config, &table),
            Err(EntryError::FeatureResolution { .. })
        ));
    }
}
