//! Render one graph of a [GraphDoc] as dot/svg for inspection.

use std::{fs::OpenOptions, io::Write};

use crate::utils::{self, VisualizerError};

use super::{GraphDoc, GraphId};

pub fn create_dot(doc: &GraphDoc, graph: GraphId) -> String {
    let mut dot = "strict digraph {\n\tnodesep=1\n".to_string();

    let data = doc.graph(graph);

    for nid in &data.nodes {
        let node = doc.node(*nid);
        let color = match node.kind.as_str() {
            kind if kind.contains("Group") => "orange",
            kind if kind.contains("Repeat") => "lightblue",
            kind if kind.contains("Input") || kind.contains("Value") => "lightgreen",
            _ => "white",
        };

        let label = match &node.label {
            Some(label) => format!("{} ({})", label, node.kind),
            None => node.kind.clone(),
        };

        dot += &format!(
            "\t{}\t[style=filled fillcolor={} label=\"{}\"]\n",
            nid, color, label
        );
    }

    for link in &data.links {
        dot += &format!(
            "\t{} -> {}\t[label=\"{}:{}\"]\n",
            link.from.node, link.to.node, link.from.index, link.to.index
        );
    }

    dot += "}\n";
    dot
}

pub fn visualize(doc: &GraphDoc, graph: GraphId, output_path: &str) -> Result<(), VisualizerError> {
    let dot = create_dot(doc, graph);
    let svg = utils::dot_to_svg(dot)?;

    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(output_path)
        .map_err(VisualizerError::IoErr)?
        .write_all(svg.as_bytes())
        .map_err(VisualizerError::IoErr)
}
