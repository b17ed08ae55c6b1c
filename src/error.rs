use thiserror::Error;

use crate::datatypes::{EdgeRole, PairFamily, Vertex};

#[derive(Debug, Error, PartialEq)]
pub enum PbcError {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Mesher error: {0}")]
    Mesher(String),

    #[error("Geometry lookup error: no vertex within {tolerance} of ({x}, {y})", x = .point.x, y = .point.y)]
    GeometryLookup { point: Vertex, tolerance: f64 },

    #[error("Node count mismatch on {family} edges: {first} vs {second} nodes")]
    NodeCountMismatch {
        family: PairFamily,
        first: usize,
        second: usize,
    },

    #[error("Degenerate {role} edge: {count} node(s), both corners are required")]
    DegenerateEdge { role: EdgeRole, count: usize },

    #[error(
        "Tolerance mismatch on {family} edges at index {index}: \
         {first} vs {second} differ by more than {tolerance}"
    )]
    ToleranceMismatch {
        family: PairFamily,
        index: usize,
        first: f64,
        second: f64,
        tolerance: f64,
    },

    #[error("Duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Post processor error: {0}")]
    PostProcessor(String),
}
