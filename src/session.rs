//! The editing session: one source image, its filtered base, one annotation
//! layer and a linear history, behind a single API.
//!
//! UI screens are thin callers: they hand in decoded bytes and parameter
//! values and read back rasters or encoded bytes.

use std::sync::Arc;

use egui::Pos2;
use uuid::Uuid;

use crate::command::{HistoryEntry, HistoryStack};
use crate::compositor::{self, Viewport};
use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::event::{EventBus, EventHandler, SessionEvent};
use crate::export;
use crate::filter::{self, FilterState};
use crate::layer::AnnotationLayer;
use crate::raster::{Raster, SourceImage};
use crate::state::EditorState;
use crate::stroke::{MutableStroke, Stroke};
use crate::texture_manager::{TextureGenerationError, TextureManager};
use crate::tool::{DrawingTool, Tool, ToolSettings};
use crate::worker::{FilterOutcome, FilterWorker};

/// Everything that only exists once an image is loaded
#[derive(Debug)]
struct Canvas {
    source: SourceImage,
    /// `filter::apply(source, applied_state)`
    base: Raster,
    /// The state `base` was derived from; trails `filter_state` while a
    /// background recompute is in flight
    applied_state: FilterState,
    annotation: AnnotationLayer,
}

#[derive(Debug)]
pub struct EditorSession {
    id: Uuid,
    config: EditorConfig,
    canvas: Option<Canvas>,
    filter_state: FilterState,
    history: HistoryStack,
    state: EditorState,
    tool: ToolSettings,
    viewport: Viewport,
    /// Bumped whenever the preview would render differently
    preview_version: u64,
    /// Bumped on every filter request, image switch and reset
    generation: u64,
    /// Generation of the background recompute whose result is still awaited
    pending_generation: Option<u64>,
    worker: Option<FilterWorker>,
    event_bus: EventBus,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    /// Creates an empty session. Falls back to synchronous filtering if the
    /// worker thread cannot be started.
    pub fn new(config: EditorConfig) -> Self {
        let worker = if config.background_filtering {
            match FilterWorker::spawn() {
                Ok(worker) => Some(worker),
                Err(err) => {
                    log::warn!("Filtering on the calling thread, worker failed to start: {}", err);
                    None
                }
            }
        } else {
            None
        };

        let id = Uuid::new_v4();
        log::info!("Editor session {} created", id);
        Self {
            id,
            history: HistoryStack::new(config.history_limit),
            tool: config.default_tool.clamped(),
            config,
            canvas: None,
            filter_state: FilterState::NEUTRAL,
            state: EditorState::Idle,
            viewport: Viewport::default(),
            preview_version: 0,
            generation: 0,
            pending_generation: None,
            worker,
            event_bus: EventBus::new(),
        }
    }

    /// Stable id of this session, also the texture surface id of its preview
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Changes whenever [`preview_image`](Self::preview_image) would render
    /// something different: filter results, annotation edits, viewport changes.
    pub fn preview_version(&self) -> u64 {
        self.preview_version
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn subscribe(&self, handler: Box<dyn EventHandler>) {
        self.event_bus.subscribe(handler);
    }

    // ------------------------------------------------------------------
    // Image lifecycle

    /// Decodes `bytes` and starts editing it with neutral filters, an empty
    /// annotation layer and no history. On error nothing changes.
    pub fn load_image(&mut self, bytes: &[u8]) -> EditorResult<()> {
        let source = export::decode(bytes).map_err(|err| {
            log::error!("Failed to decode image: {}", err);
            err
        })?;
        self.load_source(source);
        Ok(())
    }

    /// Starts editing an already decoded image
    pub fn load_source(&mut self, source: SourceImage) {
        let [width, height] = source.size();
        log::info!("Session {} loaded {}x{} image", self.id, width, height);

        self.invalidate_pending();
        self.canvas = Some(Canvas {
            base: source.as_ref().clone(),
            applied_state: FilterState::NEUTRAL,
            annotation: AnnotationLayer::new(width, height),
            source,
        });
        self.filter_state = FilterState::NEUTRAL;
        self.history.clear();
        self.state = EditorState::Idle;
        self.preview_version += 1;

        self.event_bus.emit(SessionEvent::ImageLoaded {
            session: self.id,
            width,
            height,
        });
        self.emit_history_changed();
    }

    /// Restores the source image: neutral filters, cleared annotations, empty
    /// history, default tool and 1:1 zoom. Any in-flight recompute is discarded.
    pub fn reset(&mut self) -> EditorResult<()> {
        let canvas = self.canvas.as_mut().ok_or(EditorError::NotReady)?;
        canvas.base = canvas.source.as_ref().clone();
        canvas.applied_state = FilterState::NEUTRAL;
        canvas.annotation.end_stroke();
        canvas.annotation.clear();

        self.invalidate_pending();
        self.filter_state = FilterState::NEUTRAL;
        self.history.clear();
        self.state = EditorState::Idle;
        self.tool = self.config.default_tool.clamped();
        self.viewport = Viewport::default();
        self.preview_version += 1;

        log::info!("Session {} reset", self.id);
        self.event_bus.emit(SessionEvent::Reset);
        self.emit_history_changed();
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.canvas.as_ref().map(|canvas| &canvas.source)
    }

    /// The filtered base raster as last applied
    pub fn base(&self) -> Option<&Raster> {
        self.canvas.as_ref().map(|canvas| &canvas.base)
    }

    pub fn annotation(&self) -> Option<&AnnotationLayer> {
        self.canvas.as_ref().map(|canvas| &canvas.annotation)
    }

    // ------------------------------------------------------------------
    // Filters

    pub fn filter_state(&self) -> FilterState {
        self.filter_state
    }

    /// Replaces the filter parameters and re-derives the base from the source.
    ///
    /// With background filtering the new base lands on a later
    /// [`poll_filter`](Self::poll_filter) or [`wait_for_filter`](Self::wait_for_filter).
    pub fn set_filter_state(&mut self, state: FilterState) -> EditorResult<()> {
        let canvas = self.canvas.as_mut().ok_or(EditorError::NotReady)?;
        let state = state.clamped();
        self.filter_state = state;
        self.generation += 1;
        let generation = self.generation;

        match &self.worker {
            Some(worker) => {
                worker.submit(generation, Arc::clone(&canvas.source), state);
                self.pending_generation = Some(generation);
            }
            None => {
                canvas.base = filter::apply(&canvas.source, &state);
                canvas.applied_state = state;
                self.pending_generation = None;
                self.preview_version += 1;
                self.event_bus.emit(SessionEvent::FilterApplied { generation, state });
            }
        }
        Ok(())
    }

    /// Applies a finished background recompute, if the latest one is ready.
    /// Returns true when the base raster changed.
    pub fn poll_filter(&mut self) -> bool {
        let mut applied = false;
        while let Some(outcome) = self.worker.as_mut().and_then(FilterWorker::try_recv) {
            applied |= self.accept_outcome(outcome);
        }
        applied
    }

    /// Blocks until the latest requested recompute has been applied.
    pub fn wait_for_filter(&mut self) {
        while self.pending_generation.is_some() {
            let Some(outcome) = self.worker.as_mut().and_then(FilterWorker::recv_blocking) else {
                log::error!("Filter worker stopped with a recompute outstanding");
                self.pending_generation = None;
                return;
            };
            self.accept_outcome(outcome);
        }
    }

    /// True while a background recompute for the current parameters is outstanding
    pub fn filter_pending(&self) -> bool {
        self.pending_generation.is_some()
    }

    fn accept_outcome(&mut self, outcome: FilterOutcome) -> bool {
        if Some(outcome.generation) != self.pending_generation {
            log::debug!(
                "Ignoring stale filter result {} (current {})",
                outcome.generation,
                self.generation
            );
            return false;
        }
        let Some(canvas) = self.canvas.as_mut() else {
            return false;
        };
        if outcome.raster.size() != canvas.source.size() {
            log::error!("Filter result size {:?} does not match source", outcome.raster.size());
            return false;
        }
        canvas.base = outcome.raster;
        canvas.applied_state = outcome.state;
        self.pending_generation = None;
        self.preview_version += 1;
        self.event_bus.emit(SessionEvent::FilterApplied {
            generation: outcome.generation,
            state: outcome.state,
        });
        true
    }

    /// Invalidates any in-flight recompute
    fn invalidate_pending(&mut self) {
        self.generation += 1;
        self.pending_generation = None;
        if let Some(worker) = &self.worker {
            worker.cancel_pending();
        }
    }

    // ------------------------------------------------------------------
    // Drawing

    pub fn tool_settings(&self) -> ToolSettings {
        self.tool
    }

    /// Changes the tool options. A stroke already in progress keeps its own settings.
    pub fn set_tool_settings(&mut self, settings: ToolSettings) {
        self.tool = settings.clamped();
    }

    pub fn set_tool(&mut self, tool: DrawingTool) {
        self.tool.tool = tool;
    }

    pub fn editor_state(&self) -> &EditorState {
        &self.state
    }

    /// Starts a stroke at `pos` (image pixel coordinates)
    pub fn pointer_down(&mut self, pos: Pos2) -> EditorResult<()> {
        self.ensure_layer_dimensions()?;
        let canvas = self.canvas.as_mut().ok_or(EditorError::NotReady)?;
        let stroke = MutableStroke::new(self.tool, pos);
        let tool_name = stroke.settings().build().name();

        self.state.transition_to(EditorState::Drawing { stroke })?;
        canvas.annotation.begin_stroke();
        self.event_bus.emit(SessionEvent::StrokeStarted { tool: tool_name });
        Ok(())
    }

    /// Extends the current stroke to `pos`. Ignored while idle.
    pub fn pointer_move(&mut self, pos: Pos2) -> EditorResult<()> {
        let canvas = self.canvas.as_mut().ok_or(EditorError::NotReady)?;
        let Some(stroke) = self.state.current_stroke_mut() else {
            return Ok(());
        };
        let (from, to) = stroke.add_point(pos);
        stroke
            .settings()
            .build()
            .apply_segment(&mut canvas.annotation, from, to);
        self.preview_version += 1;
        Ok(())
    }

    /// Finishes the current stroke and commits the pre-stroke snapshot to history.
    /// Ignored while idle.
    pub fn pointer_up(&mut self) -> EditorResult<()> {
        if self.state.is_idle() {
            return Ok(());
        }
        let EditorState::Drawing { stroke } = self.state.transition_to(EditorState::Idle)? else {
            return Ok(());
        };
        let Some(before) = self
            .canvas
            .as_mut()
            .and_then(|canvas| canvas.annotation.end_stroke())
        else {
            return Ok(());
        };
        let tool_name = stroke.settings().build().name();

        // A press without any movement leaves no mark and no history entry.
        if stroke.points().len() > 1 {
            self.history.commit(HistoryEntry::new(tool_name, before));
            self.event_bus.emit(SessionEvent::StrokeCommitted {
                tool: tool_name,
                points: stroke.points().len(),
            });
            self.emit_history_changed();
        }
        Ok(())
    }

    /// Replays a complete stroke, e.g. from a script, as one undoable edit.
    pub fn apply_stroke(&mut self, stroke: &Stroke) -> EditorResult<()> {
        let Some((first, rest)) = stroke.points().split_first() else {
            return Ok(());
        };
        let previous_tool = self.tool;
        self.tool = stroke.settings().clamped();

        let result = self.pointer_down(*first).and_then(|()| {
            for point in rest {
                self.pointer_move(*point)?;
            }
            self.pointer_up()
        });

        self.tool = previous_tool;
        result
    }

    /// Erases every annotation as one undoable edit.
    pub fn clear_annotations(&mut self) -> EditorResult<()> {
        self.ensure_idle()?;
        let canvas = self.canvas.as_mut().ok_or(EditorError::NotReady)?;
        if canvas.annotation.raster().is_fully_transparent() {
            return Ok(());
        }
        self.history
            .commit(HistoryEntry::new("Clear", canvas.annotation.snapshot()));
        canvas.annotation.clear();
        self.preview_version += 1;
        self.emit_history_changed();
        Ok(())
    }

    // ------------------------------------------------------------------
    // History

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn undo(&mut self) -> EditorResult<()> {
        self.ensure_idle()?;
        let canvas = self.canvas.as_mut().ok_or(EditorError::NotReady)?;
        self.history.undo(&mut canvas.annotation)?;
        self.preview_version += 1;
        self.emit_history_changed();
        Ok(())
    }

    pub fn redo(&mut self) -> EditorResult<()> {
        self.ensure_idle()?;
        let canvas = self.canvas.as_mut().ok_or(EditorError::NotReady)?;
        self.history.redo(&mut canvas.annotation)?;
        self.preview_version += 1;
        self.emit_history_changed();
        Ok(())
    }

    fn ensure_idle(&self) -> EditorResult<()> {
        if self.state.is_drawing() {
            return Err(EditorError::InvalidTransition {
                from: self.state.name(),
                to: "History",
            });
        }
        Ok(())
    }

    fn emit_history_changed(&self) {
        self.event_bus.emit(SessionEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    // ------------------------------------------------------------------
    // Viewport and output

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Mutable viewport access. Counts as a preview change.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        self.preview_version += 1;
        &mut self.viewport
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        let before = self.viewport.zoom();
        self.viewport.set_zoom(zoom);
        if self.viewport.zoom() != before {
            self.preview_version += 1;
        }
    }

    /// Composite scaled by the session viewport, for display
    pub fn render_preview(&mut self) -> EditorResult<Raster> {
        self.ensure_layer_dimensions()?;
        let canvas = self.canvas.as_ref().ok_or(EditorError::NotReady)?;
        Ok(compositor::render_preview(
            &canvas.base,
            canvas.annotation.raster(),
            &self.viewport,
        ))
    }

    /// Preview as an egui image ready for texture upload
    pub fn preview_image(&mut self) -> EditorResult<egui::ColorImage> {
        Ok(self.render_preview()?.to_color_image())
    }

    /// Preview texture, re-rendered only when [`preview_version`](Self::preview_version) moved.
    pub fn preview_texture(
        &mut self,
        textures: &mut TextureManager,
        ctx: &egui::Context,
    ) -> Result<egui::TextureId, TextureGenerationError> {
        let (surface, version) = (self.id, self.preview_version);
        textures.get_or_create_texture(
            surface,
            version,
            || match self.preview_image() {
                Ok(image) => Ok(image),
                Err(EditorError::NotReady) => Err(TextureGenerationError::NotReady),
                Err(err) => Err(TextureGenerationError::Render(err)),
            },
            ctx,
        )
    }

    /// Composite at source resolution, independent of zoom.
    ///
    /// Waits for an outstanding background recompute, so the result always
    /// reflects [`filter_state`](Self::filter_state).
    pub fn export_raster(&mut self) -> EditorResult<Raster> {
        self.wait_for_filter();
        self.ensure_layer_dimensions()?;
        let canvas = self.canvas.as_ref().ok_or(EditorError::NotReady)?;
        Ok(compositor::export(&canvas.base, canvas.annotation.raster()))
    }

    /// Composite at source resolution encoded as PNG
    pub fn export_png(&mut self) -> EditorResult<Vec<u8>> {
        let raster = self.export_raster()?;
        let bytes = export::encode_png(&raster)?;
        log::info!("Exported {}x{} PNG", raster.width(), raster.height());
        Ok(bytes)
    }

    /// Composite flattened onto the configured paper colour, encoded as PNG.
    /// Render-only: the session is not modified.
    pub fn print_png(&mut self) -> EditorResult<Vec<u8>> {
        let raster = compositor::flatten_onto(&self.export_raster()?, self.config.print_background);
        export::encode_png(&raster)
    }

    /// Checks that the annotation layer still matches the source image.
    ///
    /// A mismatch is a bug: debug builds panic, release builds log it and
    /// start over with a blank annotation layer.
    fn ensure_layer_dimensions(&mut self) -> EditorResult<()> {
        let canvas = self.canvas.as_mut().ok_or(EditorError::NotReady)?;
        let expected = canvas.source.size();
        let actual = canvas.annotation.size();
        if expected == actual && canvas.base.size() == expected {
            return Ok(());
        }

        let err = EditorError::DimensionMismatch { expected, actual };
        debug_assert!(false, "{}", err);
        log::error!("{}; re-initializing layers", err);
        self.rebuild_layers();
        Ok(())
    }

    /// Recreates the annotation layer and base at source size, dropping history
    /// whose snapshots no longer fit.
    fn rebuild_layers(&mut self) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        let [width, height] = canvas.source.size();
        canvas.annotation = AnnotationLayer::new(width, height);
        canvas.base = filter::apply(&canvas.source, &canvas.applied_state);
        self.history.clear();
        self.state = EditorState::Idle;
        self.preview_version += 1;
        self.emit_history_changed();
    }
}
