use egui::{Color32, pos2};
use photo_markup::{
    AnnotationLayer, DrawingTool, EditorConfig, EditorError, EditorSession, HistoryEntry,
    HistoryStack, Raster, ToolSettings,
};
use std::sync::Arc;

fn session(width: u32, height: u32) -> EditorSession {
    let mut session = EditorSession::new(EditorConfig::synchronous());
    session.load_source(Arc::new(Raster::filled(width, height, [200, 200, 200, 255])));
    session
}

fn draw(session: &mut EditorSession, points: &[(f32, f32)]) {
    let (first, rest) = points.split_first().unwrap();
    session.pointer_down(pos2(first.0, first.1)).unwrap();
    for (x, y) in rest {
        session.pointer_move(pos2(*x, *y)).unwrap();
    }
    session.pointer_up().unwrap();
}

fn annotation_pixels(session: &EditorSession) -> Raster {
    session.annotation().unwrap().snapshot()
}

#[test]
fn test_pencil_undo_redo_round_trip() {
    let mut session = session(32, 32);
    session.set_tool_settings(ToolSettings {
        tool: DrawingTool::Pencil,
        color: Color32::from_rgb(255, 0, 0),
        width: 4.0,
    });

    draw(&mut session, &[(4.0, 4.0), (16.0, 20.0), (28.0, 8.0)]);
    let drawn = annotation_pixels(&session);
    assert!(!drawn.is_fully_transparent());

    session.undo().unwrap();
    assert!(session.annotation().unwrap().raster().is_fully_transparent());
    assert!(session.history().can_redo());

    session.redo().unwrap();
    assert_eq!(annotation_pixels(&session), drawn);
    assert!(!session.history().can_redo());
}

#[test]
fn test_new_stroke_after_undo_clears_redo() {
    let mut session = session(32, 32);
    draw(&mut session, &[(2.0, 2.0), (30.0, 2.0)]);
    draw(&mut session, &[(2.0, 10.0), (30.0, 10.0)]);

    session.undo().unwrap();
    assert_eq!(session.history().redo_len(), 1);

    draw(&mut session, &[(2.0, 20.0), (30.0, 20.0)]);
    assert_eq!(session.history().redo_len(), 0);
    assert!(matches!(session.redo(), Err(EditorError::EmptyHistory)));
    assert_eq!(session.history().undo_len(), 2);
}

#[test]
fn test_undo_all_then_redo_all() {
    let mut session = session(24, 24);
    let mut states = vec![annotation_pixels(&session)];
    for row in [3.0, 9.0, 15.0] {
        draw(&mut session, &[(1.0, row), (22.0, row)]);
        states.push(annotation_pixels(&session));
    }

    for expected in states.iter().rev().skip(1) {
        session.undo().unwrap();
        assert_eq!(&annotation_pixels(&session), expected);
    }
    assert!(matches!(session.undo(), Err(EditorError::EmptyHistory)));

    for expected in states.iter().skip(1) {
        session.redo().unwrap();
        assert_eq!(&annotation_pixels(&session), expected);
    }
}

#[test]
fn test_eraser_cancels_same_width_pencil() {
    let mut session = session(32, 32);
    draw(&mut session, &[(5.0, 16.0), (27.0, 16.0)]);

    session.set_tool(DrawingTool::Eraser);
    draw(&mut session, &[(5.0, 16.0), (27.0, 16.0)]);
    assert!(session.annotation().unwrap().raster().is_fully_transparent());

    // The base image is untouched by erasing.
    let export = session.export_raster().unwrap();
    assert!(export.data().chunks(4).all(|p| p == [200, 200, 200, 255]));
}

#[test]
fn test_history_limit_drops_oldest() {
    let config = EditorConfig {
        history_limit: 2,
        ..EditorConfig::synchronous()
    };
    let mut session = EditorSession::new(config);
    session.load_source(Arc::new(Raster::filled(16, 16, [0, 0, 0, 255])));

    for row in [2.0, 6.0, 10.0] {
        draw(&mut session, &[(1.0, row), (14.0, row)]);
    }
    assert_eq!(session.history().undo_len(), 2);
    session.undo().unwrap();
    session.undo().unwrap();
    // The first stroke can no longer be undone.
    assert!(!session.annotation().unwrap().raster().is_fully_transparent());
}

#[test]
fn test_stack_rejects_foreign_snapshot() {
    let mut stack = HistoryStack::new(0);
    let mut layer = AnnotationLayer::new(4, 4);
    stack.commit(HistoryEntry::new("Pencil", Raster::transparent(8, 8)));

    assert!(matches!(
        stack.undo(&mut layer),
        Err(EditorError::DimensionMismatch { .. })
    ));
    assert_eq!(stack.undo_len(), 1);
    assert_eq!(layer.size(), [4, 4]);
}

#[test]
fn test_translucent_stroke_has_even_colour_across_joins() {
    let mut session = session(40, 20);
    session.set_tool_settings(ToolSettings {
        tool: DrawingTool::Pencil,
        color: Color32::from_rgba_unmultiplied(0, 0, 255, 100),
        width: 6.0,
    });
    draw(&mut session, &[(2.0, 10.0), (10.0, 10.0), (20.0, 10.0), (30.0, 10.0), (38.0, 10.0)]);

    let raster = session.annotation().unwrap().raster();
    let along: Vec<_> = (4..36).map(|x| raster.pixel(x, 10)).collect();
    assert!(along.iter().all(|p| *p == along[0]));
    assert_eq!(along[0].map(|p| p[3]), Some(100));

    session.undo().unwrap();
    assert!(session.annotation().unwrap().raster().is_fully_transparent());
}
