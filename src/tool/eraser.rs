use egui::Pos2;

use super::Tool;
use crate::layer::AnnotationLayer;

/// Clears annotation pixels back to transparent.
///
/// Erasing never paints a background colour: the base image shows through
/// whatever filters are applied to it later.
#[derive(Debug, Clone, PartialEq)]
pub struct EraserTool {
    pub width: f32,
}

impl Tool for EraserTool {
    fn name(&self) -> &'static str {
        "Eraser"
    }

    fn apply_segment(&self, layer: &mut AnnotationLayer, from: Pos2, to: Pos2) {
        layer.erase_segment(from, to, self.width);
    }
}
