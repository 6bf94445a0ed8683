use serde::{Deserialize, Serialize};

/// Height/width ratio above which a container is treated as portrait.
pub const VERTICAL_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Horizontal,
    Vertical,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Horizontal => "horizontal",
            Layout::Vertical => "vertical",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

pub fn select_layout(width: u32, height: u32) -> Layout {
    if width == 0 {
        // An unmeasured container stays horizontal; any height over zero width
        // is infinitely tall.
        return if height == 0 {
            Layout::Horizontal
        } else {
            Layout::Vertical
        };
    }
    if f64::from(height) / f64::from(width) > VERTICAL_RATIO {
        Layout::Vertical
    } else {
        Layout::Horizontal
    }
}

/// Tracks the observed container size and re-derives the layout on resize.
#[derive(Debug, Clone, Default)]
pub struct LayoutTracker {
    dimensions: Dimensions,
    layout: Layout,
}

impl LayoutTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record new dimensions; returns true when the layout variant changed.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.dimensions = Dimensions { width, height };
        let next = select_layout(width, height);
        let changed = next != self.layout;
        self.layout = next;
        changed
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }
}
