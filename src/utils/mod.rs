//! Utilities for graft.

use std::io;

use graphviz_rust::{self, cmd::Format, printer::PrinterContext};

pub type VisualizerResult = Result<String, VisualizerError>;

#[derive(Debug)]
pub enum VisualizerError {
    IoErr(io::Error),
    GraphvizIoError(io::Error),
    GraphvizError(String),
}

pub fn dot_to_svg(dot: String) -> VisualizerResult {
    let dot_graph = match graphviz_rust::parse(dot.as_str()) {
        Ok(g) => g,
        Err(e) => return Err(VisualizerError::GraphvizError(e)),
    };

    match graphviz_rust::exec(
        dot_graph,
        &mut PrinterContext::default(),
        vec![Format::Svg.into()],
    ) {
        Ok(s) => Ok(String::from_utf8(s).unwrap()),
        Err(e) => Err(VisualizerError::GraphvizIoError(e)),
    }
}
