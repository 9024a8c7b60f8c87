//! The command line surface. The long flag names follow the established
//! vocabulary of the tool's configuration files and scripts, so they use
//! underscores rather than clap's default kebab case.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use pepgraph::config::GeneratorConfig;
use pepgraph::digest::DigestMode;
use pepgraph::export::ExportConfig;
use pepgraph::features::FeatureKind;
use pepgraph::graph::{StatisticsConfig, WeightConfig};
use pepgraph::mass::{MassKind, MassTable};
use pepgraph::replace::ReplacementRule;

/// Graph generator for proteins and peptides, with exporters to various
/// formats.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Args {
    /// Files containing the SwissProt/EMBL entries (either .dat or .txt,
    /// optionally gzipped)
    #[arg(required = true, value_parser = existing_file)]
    files: Vec<PathBuf>,

    /// Number of entries across all files (summed). If given, reading stops
    /// after this many entries and progress reporting knows the total
    #[arg(short = 'n', long = "num_of_entries")]
    num_of_entries: Option<usize>,

    /// A csv file only containing accessions in the first column which
    /// should be excluded from processing
    #[arg(long = "exclude_accessions")]
    exclude_accessions: Option<PathBuf>,

    /// The number of workers used to process entries. Each worker can
    /// process an entry individually. The default value is 'cores - 1',
    /// since one thread is reserved for reading entries
    #[arg(long = "num_of_processes")]
    num_of_processes: Option<usize>,

    /// Perform a check on every generated graph: no parallel edges with the
    /// same qualifiers, the DAG property and other invariants
    #[arg(long = "verify_graph", visible_alias = "verify")]
    verify_graph: bool,

    /// Exclude isoforms ('VAR_SEQ', and possible modifications on them)
    /// from the feature table
    #[arg(long = "skip_isoforms")]
    skip_isoforms: bool,

    /// Exclude 'VARIANT' from the feature table
    #[arg(long = "skip_variants")]
    skip_variants: bool,

    /// Exclude the skipping of the initiator methionine ('INIT_MET')
    #[arg(long = "skip_init_met")]
    skip_init_met: bool,

    /// Exclude the skipping of the signal peptide ('SIGNAL')
    #[arg(long = "skip_signal")]
    skip_signal: bool,

    /// Only apply the listed feature table kinds (e.g. VARIANT SIGNAL), or
    /// ALL. The skip flags still apply on top
    #[arg(long = "feature_table", num_args = 1..)]
    feature_table: Vec<FeatureTableEntry>,

    /// The digestion method: 'full' cleaves at every edge (all peptides
    /// with arbitrary cutting points), 'skip' does not digest at all
    #[arg(short = 'd', long, default_value_t = DigestMode::Trypsin)]
    digestion: DigestMode,

    /// Skip merging chains of vertices and edges into single vertices.
    /// Setting this can drastically increase the size of the graph,
    /// especially its depth
    #[arg(long = "no_merge")]
    no_merge: bool,

    /// Skip collapsing parallel edges with identical qualifier sets
    #[arg(long = "no_collapsing_edges")]
    no_collapsing_edges: bool,

    /// Replace amino acids by user defined rules, e.g. 'X->A,B,C'. Can be
    /// given multiple times
    #[arg(long = "replace_aa")]
    replace_aa: Vec<ReplacementRule>,

    /// Annotate edges with monoisotopic weights (taken from the mass table)
    #[arg(long = "annotate_mono_weights")]
    annotate_mono_weights: bool,

    /// Annotate edges with average weights (taken from the mass table)
    #[arg(long = "annotate_avrg_weights")]
    annotate_avrg_weights: bool,

    /// Annotate edges with the minimum monoisotopic weight left to the end
    /// vertex. NOTE: this also sets the monoisotopic weights
    #[arg(long = "annotate_mono_weight_to_end")]
    annotate_mono_weight_to_end: bool,

    /// Annotate edges with the minimum average weight left to the end
    /// vertex. NOTE: this also sets the average weights
    #[arg(long = "annotate_avrg_weight_to_end")]
    annotate_avrg_weight_to_end: bool,

    /// The scalar type of the mass table
    #[arg(long = "mass_dict_type", value_enum, default_value_t = MassScalar::Int)]
    mass_dict_type: MassScalar,

    /// The factor masses are multiplied with before rounding, in the
    /// integer mass table. The default turns every mass into an exact
    /// integer
    #[arg(long = "mass_dict_factor", default_value_t = MassTable::DEFAULT_FACTOR)]
    mass_dict_factor: f64,

    /// Calculate the number of all possible (non repeating) paths from the
    /// start to the end vertex, via dynamic programming
    #[arg(long = "calc_num_possibilities")]
    calc_num_possibilities: bool,

    /// As calc_num_possibilities, binned by the number of miscleavages
    /// (starting at 0). NOTE: this can get memory heavy on large proteins
    #[arg(long = "calc_num_possibilities_miscleavages")]
    calc_num_possibilities_miscleavages: bool,

    /// As calc_num_possibilities, binned by the number of hops (edges in
    /// the path, starting at 0). NOTE: even more memory heavy than binning
    /// by miscleavages
    #[arg(long = "calc_num_possibilities_hops")]
    calc_num_possibilities_hops: bool,

    /// Leave the protein description out of the statistics rows
    #[arg(long = "no_description")]
    no_description: bool,

    /// The output file for the graph statistics (csv). It is overwritten if
    /// it exists
    #[arg(
        short = 'o',
        long = "output_csv",
        default_value = "protein_graph_statistics.csv"
    )]
    output_csv: PathBuf,

    /// The directory exported graphs are written into. Existing files are
    /// overwritten
    #[arg(long = "export_output_folder", default_value = "exported_graphs")]
    export_output_folder: PathBuf,

    /// Export files into subdirectories coded by accession instead of one
    /// flat folder. Useful when millions of proteins are processed
    #[arg(long = "export_in_directories")]
    export_in_directories: bool,

    /// Export a dot file for each protein
    #[arg(long = "export_dot")]
    export_dot: bool,

    /// Export a GraphML file for each protein. This is the recommended
    /// export method
    #[arg(long = "export_graphml")]
    export_graphml: bool,
}

/// The scalar type of the mass table.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub(crate) enum MassScalar {
    /// Scaled integer masses, exact under addition
    #[default]
    Int,
    /// Plain double precision masses
    Float,
}

/// One value of the `--feature_table` allow list.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum FeatureTableEntry {
    /// Apply every understood kind.
    All,
    /// Apply one specific kind.
    Kind(FeatureKind),
}

impl std::str::FromStr for FeatureTableEntry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ALL") {
            return Ok(Self::All);
        }
        s.to_ascii_uppercase()
            .parse()
            .map(Self::Kind)
            .map_err(|()| {
                format!(
                    "unknown feature table kind {s:?}, expected ALL or one of {}",
                    FeatureKind::ALL.map(|kind| kind.label()).join(", ")
                )
            })
    }
}

fn existing_file(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("file '{s}' does not exist"))
    }
}

impl Args {
    /// Fold the parsed arguments into the run configuration.
    pub(crate) fn into_config(self) -> GeneratorConfig {
        let feature_table = if self
            .feature_table
            .iter()
            .any(|entry| *entry == FeatureTableEntry::All)
        {
            Vec::new()
        } else {
            self.feature_table
                .into_iter()
                .filter_map(|entry| match entry {
                    FeatureTableEntry::All => None,
                    FeatureTableEntry::Kind(kind) => Some(kind),
                })
                .collect()
        };
        GeneratorConfig {
            files: self.files,
            num_of_entries: self.num_of_entries,
            exclude_accessions: self.exclude_accessions,
            num_of_processes: self.num_of_processes,
            verify_graph: self.verify_graph,
            skip_isoforms: self.skip_isoforms,
            skip_variants: self.skip_variants,
            skip_init_met: self.skip_init_met,
            skip_signal: self.skip_signal,
            feature_table,
            digestion: self.digestion,
            no_merge: self.no_merge,
            no_collapsing_edges: self.no_collapsing_edges,
            replace_aa: self.replace_aa,
            weights: WeightConfig {
                monoisotopic: self.annotate_mono_weights,
                average: self.annotate_avrg_weights,
                monoisotopic_to_end: self.annotate_mono_weight_to_end,
                average_to_end: self.annotate_avrg_weight_to_end,
            },
            mass_kind: match self.mass_dict_type {
                MassScalar::Int => MassKind::Int,
                MassScalar::Float => MassKind::Float,
            },
            mass_factor: self.mass_dict_factor,
            statistics: StatisticsConfig {
                paths: self.calc_num_possibilities,
                paths_by_miscleavages: self.calc_num_possibilities_miscleavages,
                paths_by_hops: self.calc_num_possibilities_hops,
            },
            no_description: self.no_description,
            output_csv: self.output_csv,
            export: ExportConfig {
                output_folder: self.export_output_folder,
                in_directories: self.export_in_directories,
                dot: self.export_dot,
                graphml: self.export_graphml,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_argument_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
