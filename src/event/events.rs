use uuid::Uuid;

use crate::filter::FilterState;

/// Notifications for display collaborators. Carry ids and sizes, never pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ImageLoaded {
        session: Uuid,
        width: u32,
        height: u32,
    },
    FilterApplied {
        generation: u64,
        state: FilterState,
    },
    StrokeStarted {
        tool: &'static str,
    },
    StrokeCommitted {
        tool: &'static str,
        points: usize,
    },
    HistoryChanged {
        can_undo: bool,
        can_redo: bool,
    },
    Reset,
}
