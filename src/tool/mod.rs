mod eraser;
mod pencil;
pub mod color;

pub use eraser::EraserTool;
pub use pencil::PencilTool;

use egui::{Color32, Pos2};
use serde::{Deserialize, Serialize};

use crate::layer::AnnotationLayer;

pub const MIN_STROKE_WIDTH: f32 = 1.0;
pub const MAX_STROKE_WIDTH: f32 = 20.0;

/// A tool that turns one pointer-move segment into pixels on the annotation layer.
pub trait Tool: Send {
    fn name(&self) -> &'static str;
    fn apply_segment(&self, layer: &mut AnnotationLayer, from: Pos2, to: Pos2);
}

/// Which stroke tool is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingTool {
    #[default]
    Pencil,
    Eraser,
}

/// The tool options a UI collaborator exposes: tool, colour and width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub tool: DrawingTool,
    #[serde(with = "color::hex")]
    pub color: Color32,
    pub width: f32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            tool: DrawingTool::Pencil,
            color: Color32::BLACK,
            width: 2.0,
        }
    }
}

impl ToolSettings {
    /// Returns a copy with the width forced into the allowed range
    pub fn clamped(mut self) -> Self {
        self.width = if self.width.is_finite() {
            self.width.clamp(MIN_STROKE_WIDTH, MAX_STROKE_WIDTH)
        } else {
            MIN_STROKE_WIDTH
        };
        self
    }

    /// Builds the concrete tool for these settings
    pub fn build(&self) -> ToolType {
        let settings = self.clamped();
        match settings.tool {
            DrawingTool::Pencil => ToolType::Pencil(PencilTool {
                color: settings.color,
                width: settings.width,
            }),
            DrawingTool::Eraser => ToolType::Eraser(EraserTool {
                width: settings.width,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolType {
    Pencil(PencilTool),
    Eraser(EraserTool),
}

impl Tool for ToolType {
    fn name(&self) -> &'static str {
        match self {
            ToolType::Pencil(tool) => tool.name(),
            ToolType::Eraser(tool) => tool.name(),
        }
    }

    fn apply_segment(&self, layer: &mut AnnotationLayer, from: Pos2, to: Pos2) {
        match self {
            ToolType::Pencil(tool) => tool.apply_segment(layer, from, to),
            ToolType::Eraser(tool) => tool.apply_segment(layer, from, to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_is_clamped() {
        let settings = ToolSettings {
            width: 45.0,
            ..Default::default()
        };
        assert_eq!(settings.clamped().width, MAX_STROKE_WIDTH);

        let settings = ToolSettings {
            width: f32::NAN,
            ..Default::default()
        };
        assert_eq!(settings.clamped().width, MIN_STROKE_WIDTH);
    }

    #[test]
    fn test_build_picks_tool() {
        let eraser = ToolSettings {
            tool: DrawingTool::Eraser,
            width: 20.0,
            ..Default::default()
        };
        assert_eq!(eraser.build(), ToolType::Eraser(EraserTool { width: 20.0 }));
        assert_eq!(ToolSettings::default().build().name(), "Pencil");
    }

    #[test]
    fn test_settings_json() {
        let settings: ToolSettings =
            serde_json::from_str(r##"{"tool": "eraser", "color": "#ff0000", "width": 5}"##).unwrap();
        assert_eq!(settings.tool, DrawingTool::Eraser);
        assert_eq!(settings.color, Color32::RED);
        assert_eq!(settings.width, 5.0);
    }
}
