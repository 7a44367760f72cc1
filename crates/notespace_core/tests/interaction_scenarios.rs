use notespace_core::persist::{DRAWING_ORDER_KEY, VIEWPORT_OFFSET_KEY};
use notespace_core::{
    to_screen, CanvasPoint, EventOutcome, GestureState, InputEvent, InteractionStateMachine,
    MemoryBlobRepository, Note, NoteId, NotePlacement, PointerTarget, RenderAdapter, ScreenPoint,
    Viewport, ViewportSize, WorkspaceConfig, WorkspaceState,
};
use std::collections::HashMap;

/// Renderer that mirrors element positions the way a host UI would.
#[derive(Default)]
struct RecordingRenderer {
    positions: HashMap<NoteId, ScreenPoint>,
    sizes: HashMap<NoteId, f64>,
    paint_order: Vec<NoteId>,
    repositions: usize,
    redraws: usize,
}

impl RecordingRenderer {
    fn apply(&mut self, placements: &[NotePlacement]) {
        for placement in placements {
            self.positions.insert(placement.id, placement.position);
            self.sizes.insert(placement.id, placement.display_size);
        }
    }
}

impl RenderAdapter for RecordingRenderer {
    fn render_note(&mut self, note: &Note, placement: NotePlacement) {
        self.paint_order.push(note.id);
        self.apply(&[placement]);
    }

    fn raise_note(&mut self, id: NoteId) {
        self.paint_order.retain(|current| *current != id);
        self.paint_order.push(id);
    }

    fn move_note(&mut self, id: NoteId, position: ScreenPoint) {
        self.positions.insert(id, position);
    }

    fn reposition(&mut self, _viewport: &Viewport, placements: &[NotePlacement]) {
        self.repositions += 1;
        self.apply(placements);
    }

    fn redraw(&mut self, _viewport: &Viewport, placements: &[NotePlacement]) {
        self.redraws += 1;
        self.apply(placements);
    }
}

struct Harness {
    workspace: WorkspaceState<MemoryBlobRepository>,
    machine: InteractionStateMachine,
    renderer: RecordingRenderer,
}

impl Harness {
    fn new() -> Self {
        let config = WorkspaceConfig::default();
        Self {
            workspace: WorkspaceState::load(MemoryBlobRepository::new(), &config),
            machine: InteractionStateMachine::from_config(&config),
            renderer: RecordingRenderer::default(),
        }
    }

    fn send(&mut self, event: InputEvent) -> EventOutcome {
        self.machine
            .handle(event, &mut self.workspace, &mut self.renderer)
    }

    fn create(&mut self) -> NoteId {
        match self.send(InputEvent::CreateRequested {
            viewport_size: ViewportSize::new(800.0, 600.0),
        }) {
            EventOutcome::NoteCreated(id) => id,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    fn screen_of(&self, id: NoteId) -> ScreenPoint {
        let note = self.workspace.note(id).unwrap();
        to_screen(CanvasPoint::new(note.x, note.y), self.workspace.viewport())
    }
}

fn at(x: f64, y: f64) -> ScreenPoint {
    ScreenPoint::new(x, y)
}

#[test]
fn dragging_first_of_two_notes_moves_it_to_top() {
    let mut harness = Harness::new();
    let first = harness.create();
    let second = harness.create();
    assert_eq!(
        harness.workspace.drawing_order().to_strings(),
        vec!["1", "2"]
    );

    let origin = harness.screen_of(first);
    let grab = at(origin.x + 15.0, origin.y + 20.0);
    assert_eq!(
        harness.send(InputEvent::PointerDown {
            position: grab,
            target: PointerTarget::Note { id: first, origin },
        }),
        EventOutcome::DragStarted(first)
    );
    // Raised the moment the drag starts, before any move.
    assert_eq!(
        harness.workspace.drawing_order().to_strings(),
        vec!["2", "1"]
    );
    assert_eq!(harness.renderer.paint_order, vec![second, first]);

    harness.send(InputEvent::PointerMove {
        position: at(grab.x + 100.0, grab.y + 40.0),
    });
    // Moves are visual-only until release.
    assert_eq!(harness.screen_of(first), origin);
    assert_eq!(
        harness.renderer.positions[&first],
        at(origin.x + 100.0, origin.y + 40.0)
    );

    let outcome = harness.send(InputEvent::PointerUp {
        position: at(grab.x + 120.0, grab.y + 50.0),
    });
    assert_eq!(
        outcome,
        EventOutcome::DragEnded {
            id: first,
            position: CanvasPoint::new(origin.x + 120.0, origin.y + 50.0),
        }
    );
    assert!(harness.machine.is_idle());
    assert_eq!(
        harness.workspace.drawing_order().to_strings(),
        vec!["2", "1"]
    );
    assert_eq!(harness.screen_of(first), at(origin.x + 120.0, origin.y + 50.0));

    let repo = harness.workspace.close();
    assert_eq!(repo.raw(DRAWING_ORDER_KEY), Some(r#"["2","1"]"#));
}

#[test]
fn drag_release_under_panned_viewport_stores_canvas_coordinates() {
    let mut harness = Harness::new();
    let id = harness.create();

    harness.send(InputEvent::PointerDown {
        position: at(0.0, 0.0),
        target: PointerTarget::Canvas,
    });
    harness.send(InputEvent::PointerMove {
        position: at(200.0, 100.0),
    });
    harness.send(InputEvent::PointerUp {
        position: at(200.0, 100.0),
    });

    let origin = harness.screen_of(id);
    harness.send(InputEvent::PointerDown {
        position: origin,
        target: PointerTarget::Note { id, origin },
    });
    harness.send(InputEvent::PointerUp {
        position: at(500.0, 300.0),
    });

    let note = harness.workspace.note(id).unwrap();
    assert_eq!((note.x, note.y), (300.0, 200.0));
}

#[test]
fn pan_shifts_offset_and_screen_positions_but_not_canvas() {
    let mut harness = Harness::new();
    let first = harness.create();
    let second = harness.create();
    let canvas_before: Vec<(f64, f64)> = [first, second]
        .iter()
        .map(|id| {
            let note = harness.workspace.note(*id).unwrap();
            (note.x, note.y)
        })
        .collect();
    let screen_before = [harness.screen_of(first), harness.screen_of(second)];

    assert_eq!(
        harness.send(InputEvent::PointerDown {
            position: at(400.0, 300.0),
            target: PointerTarget::Canvas,
        }),
        EventOutcome::PanStarted
    );
    harness.send(InputEvent::PointerMove {
        position: at(410.0, 295.0),
    });
    let outcome = harness.send(InputEvent::PointerMove {
        position: at(430.0, 290.0),
    });
    assert_eq!(
        outcome,
        EventOutcome::Panned {
            offset_x: 30.0,
            offset_y: -10.0
        }
    );
    assert_eq!(harness.renderer.repositions, 2);
    assert_eq!(
        harness.send(InputEvent::PointerUp {
            position: at(430.0, 290.0),
        }),
        EventOutcome::PanEnded
    );

    let viewport = *harness.workspace.viewport();
    assert_eq!((viewport.offset_x, viewport.offset_y), (30.0, -10.0));

    for (index, id) in [first, second].iter().enumerate() {
        let note = harness.workspace.note(*id).unwrap();
        assert_eq!((note.x, note.y), canvas_before[index]);
        let expected = at(screen_before[index].x + 30.0, screen_before[index].y - 10.0);
        assert_eq!(harness.screen_of(*id), expected);
        assert_eq!(harness.renderer.positions[id], expected);
    }
    assert!(harness.workspace.has_pending_save());
}

#[test]
fn second_pan_continues_from_current_offset() {
    let mut harness = Harness::new();
    for (from, to) in [((0.0, 0.0), (30.0, -10.0)), ((100.0, 100.0), (105.0, 120.0))] {
        harness.send(InputEvent::PointerDown {
            position: at(from.0, from.1),
            target: PointerTarget::Canvas,
        });
        harness.send(InputEvent::PointerMove {
            position: at(to.0, to.1),
        });
        harness.send(InputEvent::PointerUp {
            position: at(to.0, to.1),
        });
    }
    let viewport = harness.workspace.viewport();
    assert_eq!((viewport.offset_x, viewport.offset_y), (35.0, 10.0));
}

#[test]
fn zoom_rescales_every_note_without_moving_it() {
    let mut harness = Harness::new();
    let first = harness.create();
    let second = harness.create();
    let screen_before = [harness.screen_of(first), harness.screen_of(second)];

    assert_eq!(
        harness.send(InputEvent::Wheel { delta_y: -500.0 }),
        EventOutcome::Zoomed(50)
    );
    assert_eq!(harness.renderer.redraws, 1);
    assert_eq!(harness.renderer.sizes[&first], 100.0);
    assert_eq!(harness.renderer.sizes[&second], 100.0);
    assert_eq!(harness.screen_of(first), screen_before[0]);
    assert_eq!(harness.screen_of(second), screen_before[1]);

    assert_eq!(
        harness.send(InputEvent::Wheel { delta_y: -5000.0 }),
        EventOutcome::Zoomed(1)
    );
    assert_eq!(
        harness.send(InputEvent::Wheel { delta_y: 100_000.0 }),
        EventOutcome::Zoomed(250)
    );
}

#[test]
fn new_notes_use_zoomed_size_to_stay_visible() {
    let mut harness = Harness::new();
    harness.send(InputEvent::Wheel { delta_y: 1500.0 });
    assert_eq!(harness.workspace.viewport().zoom(), 250);

    for _ in 0..20 {
        let id = harness.create();
        let note = harness.workspace.note(id).unwrap();
        // 500px notes in an 800x600 viewport.
        assert!(note.x < 300.0 && note.y < 100.0);
        assert_eq!(harness.renderer.sizes[&id], 500.0);
    }
}

#[test]
fn content_edits_update_note_and_ignore_unknown_ids() {
    let mut harness = Harness::new();
    let id = harness.create();

    assert_eq!(
        harness.send(InputEvent::ContentEdited {
            id,
            content: "buy milk".to_string(),
        }),
        EventOutcome::ContentUpdated(id)
    );
    assert_eq!(harness.workspace.note(id).unwrap().content, "buy milk");

    let ghost = NoteId::new(42).unwrap();
    assert_eq!(
        harness.send(InputEvent::ContentEdited {
            id: ghost,
            content: "nope".to_string(),
        }),
        EventOutcome::Ignored
    );
    assert!(harness.workspace.note(ghost).is_none());
}

#[test]
fn gestures_are_mutually_exclusive() {
    let mut harness = Harness::new();
    let id = harness.create();
    let origin = harness.screen_of(id);

    harness.send(InputEvent::PointerDown {
        position: origin,
        target: PointerTarget::Note { id, origin },
    });
    assert!(matches!(
        harness.machine.state(),
        GestureState::Dragging { .. }
    ));

    assert_eq!(
        harness.send(InputEvent::PointerDown {
            position: at(1.0, 1.0),
            target: PointerTarget::Canvas,
        }),
        EventOutcome::Ignored
    );
    harness.send(InputEvent::PointerMove {
        position: at(origin.x + 5.0, origin.y + 5.0),
    });
    assert_eq!(harness.workspace.viewport(), &Viewport::default());

    harness.send(InputEvent::PointerUp {
        position: at(origin.x + 5.0, origin.y + 5.0),
    });
    assert!(harness.machine.is_idle());
}

#[test]
fn closing_after_interaction_persists_latest_state() {
    let mut harness = Harness::new();
    let id = harness.create();
    harness.send(InputEvent::ContentEdited {
        id,
        content: "draft".to_string(),
    });
    harness.send(InputEvent::Wheel { delta_y: 30.0 });

    let config = WorkspaceConfig::default();
    let repo = harness.workspace.close();
    let reloaded = WorkspaceState::load(repo, &config);
    assert_eq!(reloaded.note(id).unwrap().content, "draft");
    assert_eq!(reloaded.viewport().zoom(), 103);
    assert_eq!(reloaded.drawing_order().ids(), &[id]);
}

#[test]
fn whole_pan_gesture_is_stored_as_one_write_of_final_offset() {
    let mut harness = Harness::new();
    harness.send(InputEvent::PointerDown {
        position: at(0.0, 0.0),
        target: PointerTarget::Canvas,
    });
    for step in 1..=10 {
        harness.send(InputEvent::PointerMove {
            position: at(f64::from(step) * 3.0, f64::from(step) * -1.0),
        });
    }
    harness.send(InputEvent::PointerUp {
        position: at(30.0, -10.0),
    });

    let repo = harness.workspace.close();
    // The empty-store heal on load plus a single debounced save.
    assert_eq!(repo.write_count(), 2);
    assert_eq!(repo.raw(VIEWPORT_OFFSET_KEY), Some(r#"{"x":30.0,"y":-10.0}"#));
}

#[test]
fn overflowing_pan_leaves_viewport_unchanged() {
    let mut harness = Harness::new();
    harness.send(InputEvent::PointerDown {
        position: at(0.0, 0.0),
        target: PointerTarget::Canvas,
    });
    let outcome = harness.send(InputEvent::PointerMove {
        position: at(f64::INFINITY, 5.0),
    });
    assert_eq!(
        outcome,
        EventOutcome::Panned {
            offset_x: 0.0,
            offset_y: 5.0
        }
    );
    assert!(harness.workspace.viewport().offset_x.is_finite());
}

#[test]
fn overflowing_drag_snaps_note_back_to_stored_position() {
    let mut harness = Harness::new();
    let id = harness.create();
    let origin = harness.screen_of(id);

    harness.send(InputEvent::PointerDown {
        position: origin,
        target: PointerTarget::Note { id, origin },
    });
    let outcome = harness.send(InputEvent::PointerUp {
        position: at(f64::INFINITY, origin.y),
    });

    assert_eq!(
        outcome,
        EventOutcome::DragEnded {
            id,
            position: CanvasPoint::new(origin.x, origin.y),
        }
    );
    assert_eq!(harness.screen_of(id), origin);
    assert_eq!(harness.renderer.positions[&id], origin);
}
