//! The pointer state machine for the annotation tools.
//!
//! ```text
//!  ┌──────────┐  pointer down   ┌─────────────┐
//!  │          ├────────────────►│             │
//!  │   Idle   │                 │   Drawing   ├──┐ pointer move
//!  │          │◄────────────────┤             │◄─┘ (extends stroke)
//!  └──────────┘   pointer up    └─────────────┘
//!                 (commit)
//! ```
//!
//! Transitions are validated with [`EditorState::can_transition_to`]; a second
//! pointer-down while drawing is rejected rather than silently starting over.

use crate::error::EditorError;
use crate::stroke::MutableStroke;

/// The possible states of the editor.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditorState {
    /// No active operation
    #[default]
    Idle,
    /// Currently drawing a stroke
    Drawing { stroke: MutableStroke },
}

impl EditorState {
    /// Validates whether a transition to the new state is allowed
    pub fn can_transition_to(&self, new_state: &EditorState) -> bool {
        match (self, new_state) {
            (EditorState::Idle, EditorState::Drawing { .. }) => true,
            (EditorState::Drawing { .. }, EditorState::Idle) => true,
            // Idle -> Idle is a harmless reset
            (EditorState::Idle, EditorState::Idle) => true,
            _ => false,
        }
    }

    /// Moves to `new_state`, returning the state that was left.
    pub fn transition_to(&mut self, new_state: EditorState) -> Result<EditorState, EditorError> {
        if !self.can_transition_to(&new_state) {
            return Err(EditorError::InvalidTransition {
                from: self.name(),
                to: new_state.name(),
            });
        }
        Ok(std::mem::replace(self, new_state))
    }

    pub fn name(&self) -> &'static str {
        match self {
            EditorState::Idle => "Idle",
            EditorState::Drawing { .. } => "Drawing",
        }
    }

    /// Returns true if the editor is currently in an idle state
    pub fn is_idle(&self) -> bool {
        matches!(self, EditorState::Idle)
    }

    /// Returns true if the editor is currently in a drawing state
    pub fn is_drawing(&self) -> bool {
        matches!(self, EditorState::Drawing { .. })
    }

    /// Returns the stroke being drawn, if any
    pub fn current_stroke(&self) -> Option<&MutableStroke> {
        match self {
            EditorState::Drawing { stroke } => Some(stroke),
            EditorState::Idle => None,
        }
    }

    pub fn current_stroke_mut(&mut self) -> Option<&mut MutableStroke> {
        match self {
            EditorState::Drawing { stroke } => Some(stroke),
            EditorState::Idle => None,
        }
    }
}
