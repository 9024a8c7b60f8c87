//! Handing finished graphs to external sinks. The core only fixes the
//! lifecycle (`start_up`, one `export` per graph, `tear_down` on every exit
//! path) and the attribute vocabulary; everything beyond the bundled file
//! exporters (databases, peptide enumeration) lives behind the trait.

mod dot;
mod graphml;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EntryError;
use crate::graph::ProteinGraph;

pub use dot::DotExporter;
pub use graphml::GraphmlExporter;

/// An external sink for finished graphs. One instance lives per worker, so
/// implementations need no interior locking for per graph state.
pub trait Exporter: Send {
    /// A short name for log lines and error reports.
    fn name(&self) -> &'static str;

    /// Acquire external resources. Called once per worker before the first
    /// graph.
    ///
    /// # Errors
    /// [`EntryError::Exporter`] if the resources cannot be acquired.
    fn start_up(&mut self) -> Result<(), EntryError>;

    /// Export one fully annotated graph. Must be idempotent within the scope
    /// of a single graph.
    ///
    /// # Errors
    /// [`EntryError::Exporter`] if the sink rejects the graph.
    fn export(&mut self, graph: &ProteinGraph) -> Result<(), EntryError>;

    /// Release external resources. Called exactly once, on every worker exit
    /// path.
    ///
    /// # Errors
    /// [`EntryError::Exporter`] if releasing fails.
    fn tear_down(&mut self) -> Result<(), EntryError>;
}

/// Which file exporters to run and where their output goes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// The directory the exported graphs are written to.
    pub output_folder: PathBuf,
    /// Shard the output into subdirectories coded by accession, for runs
    /// over millions of proteins.
    pub in_directories: bool,
    /// Write a DOT file per graph.
    pub dot: bool,
    /// Write a GraphML file per graph.
    pub graphml: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_folder: PathBuf::from("exported_graphs"),
            in_directories: false,
            dot: false,
            graphml: false,
        }
    }
}

/// The exporters of one worker, torn down on every exit path (explicitly or
/// by the drop guard).
pub struct Exporters {
    exporters: Vec<Box<dyn Exporter>>,
    torn_down: bool,
}

impl std::fmt::Debug for Exporters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporters")
            .field("exporters", &self.exporters.iter().map(|e| e.name()).collect::<Vec<_>>())
            .field("torn_down", &self.torn_down)
            .finish()
    }
}

impl Exporters {
    /// The bundled file exporters the configuration asks for.
    pub fn from_config(config: &ExportConfig) -> Self {
        let mut exporters: Vec<Box<dyn Exporter>> = Vec::new();
        if config.dot {
            exporters.push(Box::new(DotExporter::new(config)));
        }
        if config.graphml {
            exporters.push(Box::new(GraphmlExporter::new(config)));
        }
        Self {
            exporters,
            torn_down: false,
        }
    }

    /// Whether any exporter is configured at all.
    pub fn is_empty(&self) -> bool {
        self.exporters.is_empty()
    }

    /// Start up every exporter.
    ///
    /// # Errors
    /// The first start up failure.
    pub fn start_up(&mut self) -> Result<(), EntryError> {
        for exporter in &mut self.exporters {
            exporter.start_up()?;
        }
        Ok(())
    }

    /// Export one graph through every exporter.
    ///
    /// # Errors
    /// The first rejection; remaining exporters still see the graph.
    pub fn export(&mut self, graph: &ProteinGraph) -> Result<(), EntryError> {
        let mut first_error = None;
        for exporter in &mut self.exporters {
            if let Err(error) = exporter.export(graph) {
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Tear every exporter down, logging failures.
    pub fn tear_down(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        for exporter in &mut self.exporters {
            if let Err(error) = exporter.tear_down() {
                log::warn!("{error}");
            }
        }
    }
}

impl Drop for Exporters {
    fn drop(&mut self) {
        self.tear_down();
    }
}

/// The output path for one graph: flat, or sharded into two character
/// directories coded by accession.
pub(crate) fn graph_file(
    folder: &Path,
    in_directories: bool,
    accession: &str,
    extension: &str,
) -> PathBuf {
    let mut path = folder.to_path_buf();
    if in_directories {
        let chunks: Vec<String> = accession
            .as_bytes()
            .chunks(2)
            .map(|chunk| String::from_utf8_lossy(chunk).to_string())
            .collect();
        for chunk in &chunks {
            path.push(chunk);
        }
    }
    path.push(format!("{accession}.{extension}"));
    path
}

/// Map an io failure onto the exporter error taxonomy.
pub(crate) fn io_failure(exporter: &'static str, error: &std::io::Error) -> EntryError {
    EntryError::Exporter {
        exporter,
        reason: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sharded_paths_are_coded_by_accession() {
        let flat = graph_file(Path::new("out"), false, "P12345", "dot");
        assert_eq!(flat, Path::new("out/P12345.dot"));
        let sharded = graph_file(Path::new("out"), true, "P12345", "dot");
        assert_eq!(sharded, Path::new("out/P1/23/45/P12345.dot"));
    }
}
