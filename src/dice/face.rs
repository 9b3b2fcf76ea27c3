//! Face model
//!
//! A die is an ordered list of weighted faces; each face may carry nested
//! subfaces that are only rolled when the face itself is selected.

use serde::{Deserialize, Serialize};

fn default_visible() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

/// One weighted outcome node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    /// Display text
    pub face: String,
    /// Hidden faces emit no text but their subfaces are still rolled
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Relative probability within its layer, always > 0
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default, alias = "children")]
    pub subfaces: Vec<Face>,
}

impl Face {
    /// Visible, weight-1 leaf
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            face: label.into(),
            visible: true,
            weight: 1.0,
            subfaces: Vec::new(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn with_subfaces(mut self, subfaces: Vec<Face>) -> Self {
        self.subfaces = subfaces;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.subfaces.is_empty()
    }

    /// Number of layers below and including this face
    pub fn depth(&self) -> usize {
        1 + self.subfaces.iter().map(Face::depth).max().unwrap_or(0)
    }
}
