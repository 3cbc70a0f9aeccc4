use egui::{Color32, Pos2};

use super::Tool;
use crate::layer::AnnotationLayer;

/// Paints round-joined lines in a solid colour
#[derive(Debug, Clone, PartialEq)]
pub struct PencilTool {
    pub color: Color32,
    pub width: f32,
}

impl Tool for PencilTool {
    fn name(&self) -> &'static str {
        "Pencil"
    }

    fn apply_segment(&self, layer: &mut AnnotationLayer, from: Pos2, to: Pos2) {
        layer.draw_segment(from, to, self.color.to_srgba_unmultiplied(), self.width);
    }
}
