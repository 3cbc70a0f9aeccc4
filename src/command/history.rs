use std::collections::VecDeque;

use super::HistoryEntry;
use crate::error::{EditorError, EditorResult};
use crate::layer::AnnotationLayer;

/// Linear undo/redo history of annotation-layer snapshots.
///
/// Committing always clears the redo stack, so history never branches.
#[derive(Debug)]
pub struct HistoryStack {
    /// Snapshots to restore on undo, oldest first
    undo_stack: VecDeque<HistoryEntry>,
    /// Snapshots to restore on redo
    redo_stack: Vec<HistoryEntry>,
    /// Maximum undo depth, 0 for unbounded
    limit: usize,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(0)
    }
}

impl HistoryStack {
    /// Creates an empty history keeping at most `limit` undo entries (0 = unbounded)
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit,
        }
    }

    /// Records the state from before an edit and discards the redo branch
    pub fn commit(&mut self, entry: HistoryEntry) {
        log::debug!("History commit: {}", entry.description());
        self.undo_stack.push_back(entry);
        self.redo_stack.clear();
        self.prune();
    }

    /// Restores the most recent snapshot into `layer`, moving the current pixels to the redo stack
    pub fn undo(&mut self, layer: &mut AnnotationLayer) -> EditorResult<()> {
        let entry = self.undo_stack.pop_back().ok_or(EditorError::EmptyHistory)?;
        match Self::swap_into(layer, entry) {
            Ok(current) => {
                self.redo_stack.push(current);
                Ok(())
            }
            Err((entry, err)) => {
                self.undo_stack.push_back(entry);
                Err(err)
            }
        }
    }

    /// Re-applies the most recently undone snapshot
    pub fn redo(&mut self, layer: &mut AnnotationLayer) -> EditorResult<()> {
        let entry = self.redo_stack.pop().ok_or(EditorError::EmptyHistory)?;
        match Self::swap_into(layer, entry) {
            Ok(current) => {
                self.undo_stack.push_back(current);
                self.prune();
                Ok(())
            }
            Err((entry, err)) => {
                self.redo_stack.push(entry);
                Err(err)
            }
        }
    }

    /// Puts `entry` into the layer and returns the displaced pixels as an entry
    /// carrying the same description.
    fn swap_into(
        layer: &mut AnnotationLayer,
        entry: HistoryEntry,
    ) -> Result<HistoryEntry, (HistoryEntry, EditorError)> {
        let HistoryEntry { description, raster } = entry;
        match layer.restore(raster) {
            Ok(previous) => Ok(HistoryEntry::new(description, previous)),
            Err(raster) => {
                let err = EditorError::DimensionMismatch {
                    expected: layer.size(),
                    actual: raster.size(),
                };
                Err((HistoryEntry::new(description, raster), err))
            }
        }
    }

    /// Returns true if there are snapshots that can be undone
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are snapshots that can be redone
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(HistoryEntry::description)
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(HistoryEntry::description)
    }

    /// Bytes held by all snapshots
    pub fn memory_usage(&self) -> usize {
        self.undo_stack
            .iter()
            .chain(self.redo_stack.iter())
            .map(HistoryEntry::memory_size)
            .sum()
    }

    /// Clear both stacks
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn prune(&mut self) {
        if self.limit == 0 {
            return;
        }
        while self.undo_stack.len() > self.limit {
            if let Some(dropped) = self.undo_stack.pop_front() {
                log::debug!("History limit {} reached, dropping '{}'", self.limit, dropped.description());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Raster;

    fn paint(layer: &mut AnnotationLayer, history: &mut HistoryStack, value: u8) {
        history.commit(HistoryEntry::new("Pencil", layer.snapshot()));
        let [w, h] = layer.size();
        layer.restore(Raster::filled(w, h, [value, 0, 0, 255])).unwrap();
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut layer = AnnotationLayer::new(2, 2);
        let mut history = HistoryStack::new(0);
        paint(&mut layer, &mut history, 10);
        let painted = layer.snapshot();

        history.undo(&mut layer).unwrap();
        assert!(layer.raster().is_fully_transparent());
        assert_eq!((history.undo_len(), history.redo_len()), (0, 1));

        history.redo(&mut layer).unwrap();
        assert_eq!(layer.raster(), &painted);
        assert_eq!((history.undo_len(), history.redo_len()), (1, 0));
    }

    #[test]
    fn test_empty_history_is_reported() {
        let mut layer = AnnotationLayer::new(2, 2);
        let mut history = HistoryStack::default();
        assert!(matches!(history.undo(&mut layer), Err(EditorError::EmptyHistory)));
        assert!(matches!(history.redo(&mut layer), Err(EditorError::EmptyHistory)));
        assert_eq!(layer.version(), 0);
    }

    #[test]
    fn test_commit_discards_redo_branch() {
        let mut layer = AnnotationLayer::new(2, 2);
        let mut history = HistoryStack::new(0);
        for value in 1..=4 {
            paint(&mut layer, &mut history, value);
        }
        history.undo(&mut layer).unwrap();
        history.undo(&mut layer).unwrap();
        assert_eq!(history.redo_len(), 2);

        paint(&mut layer, &mut history, 99);
        assert_eq!(history.redo_len(), 0);
        assert_eq!(history.undo_len(), 3);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut layer = AnnotationLayer::new(1, 1);
        let mut history = HistoryStack::new(2);
        for value in 1..=5 {
            paint(&mut layer, &mut history, value);
        }
        assert_eq!(history.undo_len(), 2);

        history.undo(&mut layer).unwrap();
        history.undo(&mut layer).unwrap();
        assert_eq!(layer.raster().pixel(0, 0), Some([3, 0, 0, 255]));
        assert!(history.undo(&mut layer).is_err());
    }

    #[test]
    fn test_mismatched_snapshot_stays_on_stack() {
        let mut layer = AnnotationLayer::new(2, 2);
        let mut history = HistoryStack::new(0);
        history.commit(HistoryEntry::new("Pencil", Raster::transparent(3, 3)));

        assert!(matches!(
            history.undo(&mut layer),
            Err(EditorError::DimensionMismatch { expected: [2, 2], actual: [3, 3] })
        ));
        assert_eq!(history.undo_len(), 1);
    }
}
