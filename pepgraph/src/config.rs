//! The immutable run configuration. Built once (usually from the command
//! line), then shared read only with every pipeline thread.

use std::path::PathBuf;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::digest::DigestMode;
use crate::export::ExportConfig;
use crate::features::FeatureKind;
use crate::graph::{StatisticsConfig, WeightConfig};
use crate::mass::{MassKind, MassTable};
use crate::replace::ReplacementRule;

/// Everything a run needs to know.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// The flat files to read, in order.
    pub files: Vec<PathBuf>,
    /// Read at most this many entries, and use it as the progress total.
    pub num_of_entries: Option<usize>,
    /// A CSV file whose first column lists accessions to skip at read time.
    pub exclude_accessions: Option<PathBuf>,
    /// How many graph workers to run. Default: available cores minus the one
    /// reserved for reading.
    pub num_of_processes: Option<usize>,
    /// Verify the invariants of every finished graph.
    pub verify_graph: bool,
    /// Leave VAR_SEQ features (isoforms) out of the graph.
    pub skip_isoforms: bool,
    /// Leave VARIANT features out of the graph.
    pub skip_variants: bool,
    /// Leave INIT_MET features out of the graph.
    pub skip_init_met: bool,
    /// Leave SIGNAL features out of the graph.
    pub skip_signal: bool,
    /// Only apply these feature kinds (empty: all kinds). The skip flags are
    /// applied on top.
    pub feature_table: Vec<FeatureKind>,
    /// The digestion rule.
    pub digestion: DigestMode,
    /// Skip chain merging.
    pub no_merge: bool,
    /// Skip parallel edge collapsing.
    pub no_collapsing_edges: bool,
    /// User defined residue replacements, applied before digestion.
    pub replace_aa: Vec<ReplacementRule>,
    /// Which weights to annotate.
    pub weights: WeightConfig,
    /// The scalar kind of the mass table.
    pub mass_kind: MassKind,
    /// The scale factor for integer mass tables.
    pub mass_factor: f64,
    /// Which path statistics to compute.
    pub statistics: StatisticsConfig,
    /// Leave the protein description out of the statistics rows.
    pub no_description: bool,
    /// The statistics CSV, overwritten on start.
    pub output_csv: PathBuf,
    /// The file exporters.
    pub export: ExportConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            num_of_entries: None,
            exclude_accessions: None,
            num_of_processes: None,
            verify_graph: false,
            skip_isoforms: false,
            skip_variants: false,
            skip_init_met: false,
            skip_signal: false,
            feature_table: Vec::new(),
            digestion: DigestMode::default(),
            no_merge: false,
            no_collapsing_edges: false,
            replace_aa: Vec::new(),
            weights: WeightConfig::default(),
            mass_kind: MassKind::default(),
            mass_factor: MassTable::DEFAULT_FACTOR,
            statistics: StatisticsConfig::default(),
            no_description: false,
            output_csv: PathBuf::from("protein_graph_statistics.csv"),
            export: ExportConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// The feature kinds this run applies, in application order.
    pub fn enabled_kinds(&self) -> IndexSet<FeatureKind> {
        let mut kinds: IndexSet<FeatureKind> = if self.feature_table.is_empty() {
            FeatureKind::ALL.into_iter().collect()
        } else {
            self.feature_table.iter().copied().collect()
        };
        if self.skip_isoforms {
            kinds.shift_remove(&FeatureKind::VarSeq);
        }
        if self.skip_variants {
            kinds.shift_remove(&FeatureKind::Variant);
        }
        if self.skip_init_met {
            kinds.shift_remove(&FeatureKind::InitMet);
        }
        if self.skip_signal {
            kinds.shift_remove(&FeatureKind::Signal);
        }
        kinds
    }

    /// The mass table for this run, built once per worker.
    pub fn mass_table(&self) -> MassTable {
        MassTable::new(self.mass_kind, self.mass_factor)
    }

    /// The number of graph workers: the configured count, or all cores minus
    /// the one reserved for the reader, but at least one.
    pub fn worker_count(&self) -> usize {
        self.num_of_processes
            .unwrap_or_else(|| {
                std::thread::available_parallelism().map_or(1, |cores| cores.get() - 1)
            })
            .max(1)
    }
}
