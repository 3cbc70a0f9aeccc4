use egui::Pos2;
use serde::{Deserialize, Serialize};

use crate::tool::ToolSettings;

// Immutable stroke, e.g. replayed from a script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    #[serde(flatten)]
    settings: ToolSettings,
    points: Vec<Pos2>,
}

// Stroke being drawn: grows by one point per pointer move
#[derive(Debug, Clone, PartialEq)]
pub struct MutableStroke {
    settings: ToolSettings,
    points: Vec<Pos2>,
}

impl Stroke {
    pub fn new(settings: ToolSettings, points: Vec<Pos2>) -> Self {
        Self { settings, points }
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }
}

impl MutableStroke {
    // Start a stroke at the anchor point
    pub fn new(settings: ToolSettings, anchor: Pos2) -> Self {
        Self {
            settings: settings.clamped(),
            points: vec![anchor],
        }
    }

    // Add a point, returning the segment it extends the stroke by
    pub fn add_point(&mut self, point: Pos2) -> (Pos2, Pos2) {
        let last = self.last_point();
        self.points.push(point);
        (last, point)
    }

    pub fn last_point(&self) -> Pos2 {
        // Always holds at least the anchor
        self.points[self.points.len() - 1]
    }

    pub fn anchor(&self) -> Pos2 {
        self.points[0]
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    // Convert to an immutable Stroke
    pub fn to_stroke(&self) -> Stroke {
        Stroke::new(self.settings, self.points.clone())
    }
}
