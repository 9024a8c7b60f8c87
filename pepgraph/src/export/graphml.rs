//! A GraphML exporter carrying the full attribute vocabulary, the
//! recommended format for downstream tooling.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use super::{Exporter, ExportConfig, graph_file, io_failure};
use crate::error::EntryError;
use crate::graph::ProteinGraph;

const NODE_KEYS: [(&str, &str); 5] = [
    ("aminoacid", "string"),
    ("position", "long"),
    ("accession", "string"),
    ("isoform_accession", "string"),
    ("isoform_position", "long"),
];

// weights are written as strings so scaled integer values survive unclipped
const EDGE_KEYS: [(&str, &str); 6] = [
    ("qualifiers", "string"),
    ("cleaved", "boolean"),
    ("mono_weight", "string"),
    ("avrg_weight", "string"),
    ("mono_weight_to_end", "string"),
    ("avrg_weight_to_end", "string"),
];

/// Writes one `<accession>.graphml` file per graph.
#[derive(Clone, Debug)]
pub struct GraphmlExporter {
    folder: PathBuf,
    in_directories: bool,
}

impl GraphmlExporter {
    /// A GraphML exporter writing into the configured output folder.
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            folder: config.output_folder.clone(),
            in_directories: config.in_directories,
        }
    }

    fn render(graph: &ProteinGraph, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(
            out,
            "<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">"
        )?;
        for (name, kind) in NODE_KEYS {
            writeln!(
                out,
                "  <key id=\"{name}\" for=\"node\" attr.name=\"{name}\" attr.type=\"{kind}\"/>"
            )?;
        }
        for (name, kind) in EDGE_KEYS {
            writeln!(
                out,
                "  <key id=\"{name}\" for=\"edge\" attr.name=\"{name}\" attr.type=\"{kind}\"/>"
            )?;
        }
        writeln!(
            out,
            "  <graph id=\"{}\" edgedefault=\"directed\">",
            escape(graph.accession())
        )?;
        for node in graph.graph().node_indices() {
            let data = &graph.graph()[node];
            writeln!(out, "    <node id=\"n{}\">", node.index())?;
            datum(out, "aminoacid", Some(escape(&data.aminoacid)))?;
            datum(out, "position", data.position)?;
            datum(out, "accession", Some(escape(&data.accession)))?;
            datum(
                out,
                "isoform_accession",
                data.isoform_accession.as_deref().map(escape),
            )?;
            datum(out, "isoform_position", data.isoform_position)?;
            writeln!(out, "    </node>")?;
        }
        for edge in graph.graph().edge_references() {
            let data = edge.weight();
            writeln!(
                out,
                "    <edge source=\"n{}\" target=\"n{}\">",
                edge.source().index(),
                edge.target().index()
            )?;
            let qualifiers = serde_json::to_string(&data.qualifiers)
                .map_err(|error| std::io::Error::other(error.to_string()))?;
            datum(out, "qualifiers", Some(escape(&qualifiers)))?;
            datum(out, "cleaved", Some(data.cleaved))?;
            datum(out, "mono_weight", data.mono_weight)?;
            datum(out, "avrg_weight", data.avrg_weight)?;
            datum(out, "mono_weight_to_end", data.mono_weight_to_end)?;
            datum(out, "avrg_weight_to_end", data.avrg_weight_to_end)?;
            writeln!(out, "    </edge>")?;
        }
        writeln!(out, "  </graph>")?;
        writeln!(out, "</graphml>")
    }
}

fn datum(
    out: &mut impl Write,
    key: &str,
    value: Option<impl std::fmt::Display>,
) -> std::io::Result<()> {
    if let Some(value) = value {
        writeln!(out, "      <data key=\"{key}\">{value}</data>")?;
    }
    Ok(())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl Exporter for GraphmlExporter {
    fn name(&self) -> &'static str {
        "graphml"
    }

    fn start_up(&mut self) -> Result<(), EntryError> {
        fs::create_dir_all(&self.folder).map_err(|error| io_failure(self.name(), &error))
    }

    fn export(&mut self, graph: &ProteinGraph) -> Result<(), EntryError> {
        let path = graph_file(
            &self.folder,
            self.in_directories,
            graph.accession(),
            "graphml",
        );
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| io_failure(self.name(), &error))?;
        }
        let file = fs::File::create(path).map_err(|error| io_failure(self.name(), &error))?;
        let mut writer = BufWriter::new(file);
        Self::render(graph, &mut writer).map_err(|error| io_failure(self.name(), &error))?;
        writer
            .flush()
            .map_err(|error| io_failure(self.name(), &error))
    }

    fn tear_down(&mut self) -> Result<(), EntryError> {
        Ok(())
    }
}
