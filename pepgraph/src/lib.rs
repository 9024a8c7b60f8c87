#![doc = include_str!("../README.md")]

/// The immutable run configuration shared by every pipeline thread.
pub mod config;
/// Proteolytic digestion rules and cleavage edge marking.
pub mod digest;
/// The streaming SwissProt/EMBL flat file reader.
pub mod embl;
/// The protein entry record handed from the reader to the workers.
pub mod entry;
/// The failure taxonomy: local entry failures and fatal pipeline failures.
pub mod error;
/// Exporting finished graphs to external sinks.
pub mod export;
/// Feature table application: isoforms, terminal cleavages, substitutions
/// and cleaved peptide regions.
pub mod features;
/// The peptide graph and its transformations.
pub mod graph;
/// Residue masses and the weight scalar.
pub mod mass;
/// The statistics row and its CSV encoding.
pub mod output;
/// The reader/worker/writer runtime.
pub mod pipeline;
/// User defined residue replacement.
pub mod replace;

/// A subset of the types and operations that are envisioned to be used the
/// most, importing this is a good starting point for working with the crate.
pub mod prelude {
    pub use crate::config::GeneratorConfig;
    pub use crate::digest::{DigestMode, digest};
    pub use crate::embl::EntryReader;
    pub use crate::entry::ProteinEntry;
    pub use crate::error::{EntryError, PipelineError};
    pub use crate::export::{ExportConfig, Exporter, Exporters};
    pub use crate::features::{Feature, FeatureKind, FeatureLocation, Qualifier, apply_features};
    pub use crate::graph::{
        ProteinGraph, StatisticsConfig, WeightConfig, annotate_weights, collapse_parallel_edges,
        gather_statistics, merge_chains, verify_graph,
    };
    pub use crate::mass::{MassKind, MassMode, MassTable, Weight};
    pub use crate::pipeline::{RunSummary, process_entry, run};
    pub use crate::replace::{ReplacementRule, replace_residues};
}
