//! A Graphviz DOT exporter, mostly for eyeballing small graphs.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use itertools::Itertools;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use super::{Exporter, ExportConfig, graph_file, io_failure};
use crate::error::EntryError;
use crate::graph::ProteinGraph;

/// Writes one `<accession>.dot` file per graph.
#[derive(Clone, Debug)]
pub struct DotExporter {
    folder: PathBuf,
    in_directories: bool,
}

impl DotExporter {
    /// A DOT exporter writing into the configured output folder.
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            folder: config.output_folder.clone(),
            in_directories: config.in_directories,
        }
    }

    fn render(graph: &ProteinGraph) -> String {
        let mut out = String::new();
        out.push_str(&format!("digraph \"{}\" {{\n", escape(graph.accession())));
        out.push_str("    rankdir=LR;\n");
        for node in graph.graph().node_indices() {
            let data = &graph.graph()[node];
            let mut label = data.aminoacid.clone();
            if let Some(position) = data.position {
                label.push_str(&format!(" [{position}]"));
            }
            if let Some(isoform) = &data.isoform_accession {
                label.push_str(&format!(" ({isoform})"));
            }
            out.push_str(&format!(
                "    n{} [label=\"{}\"];\n",
                node.index(),
                escape(&label)
            ));
        }
        for edge in graph.graph().edge_references() {
            let data = edge.weight();
            let mut attributes = Vec::new();
            if !data.qualifiers.is_empty() {
                let tags = data
                    .qualifiers
                    .iter()
                    .map(|qualifier| qualifier.kind.label())
                    .join(", ");
                attributes.push(format!("label=\"{}\"", escape(&tags)));
            }
            if data.cleaved {
                attributes.push("style=dashed".to_string());
            }
            out.push_str(&format!(
                "    n{} -> n{}{};\n",
                edge.source().index(),
                edge.target().index(),
                if attributes.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", attributes.join(", "))
                }
            ));
        }
        out.push_str("}\n");
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Exporter for DotExporter {
    fn name(&self) -> &'static str {
        "dot"
    }

    fn start_up(&mut self) -> Result<(), EntryError> {
        fs::create_dir_all(&self.folder).map_err(|error| io_failure(self.name(), &error))
    }

    fn export(&mut self, graph: &ProteinGraph) -> Result<(), EntryError> {
        let path = graph_file(&self.folder, self.in_directories, graph.accession(), "dot");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| io_failure(self.name(), &error))?;
        }
        let mut file = fs::File::create(path).map_err(|error| io_failure(self.name(), &error))?;
        file.write_all(Self::render(graph).as_bytes())
            .map_err(|error| io_failure(self.name(), &error))
    }

    fn tear_down(&mut self) -> Result<(), EntryError> {
        Ok(())
    }
}
