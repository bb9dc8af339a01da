//! End-to-end interaction scenarios driven through the public gallery API,
//! without a GPU: clicks and cursor moves go through the real picker, and
//! frames are simulated by calling `Gallery::update` with fixed deltas.

use cgmath::{Deg, EuclideanSpace, Point3, Vector3};
use instant::Duration;
use winit::dpi::PhysicalPosition;

use vitrine::camera::{Camera, Projection};
use vitrine::gallery::{
    DEFAULT_TILT, EXPAND_TINT, FOCUS_POSITION, Gallery, InteractionState, RESTORE_TINT,
    RETREAT_POSITION, START_TINT,
};

const VIEWPORT: (f32, f32) = (800.0, 600.0);

fn view() -> (Camera, Projection) {
    (
        Camera::new((0.0, 0.0, 10.0), Deg(-90.0), Deg(0.0)),
        Projection::new(800, 600, Deg(75.0), 0.1, 1000.0),
    )
}

/// Project a world point to window coordinates, the inverse of the picker's
/// pointer-to-ray mapping.
fn screen_point(world: Point3<f32>, camera: &Camera, projection: &Projection) -> PhysicalPosition<f64> {
    let clip = projection.calc_matrix() * camera.calc_matrix() * world.to_homogeneous();
    let ndc_x = (clip.x / clip.w) as f64;
    let ndc_y = (clip.y / clip.w) as f64;
    PhysicalPosition::new(
        (ndc_x + 1.0) / 2.0 * VIEWPORT.0 as f64,
        (1.0 - ndc_y) / 2.0 * VIEWPORT.1 as f64,
    )
}

fn click(gallery: &mut Gallery, st: &mut InteractionState, pointer: PhysicalPosition<f64>) {
    let (camera, projection) = view();
    gallery.handle_click(st, pointer, VIEWPORT.0, VIEWPORT.1, &camera, &projection);
}

fn cursor(gallery: &mut Gallery, st: &mut InteractionState, pointer: PhysicalPosition<f64>) {
    let (camera, projection) = view();
    gallery.handle_cursor(st, pointer, VIEWPORT.0, VIEWPORT.1, &camera, &projection);
}

fn step(gallery: &mut Gallery, st: &InteractionState, secs: f32) {
    gallery.update(st, Duration::from_secs_f32(secs));
}

/// A pointer position no panel can ever be under.
fn far_corner() -> PhysicalPosition<f64> {
    PhysicalPosition::new(2.0, 2.0)
}

fn at(world: [f32; 3]) -> PhysicalPosition<f64> {
    let (camera, projection) = view();
    screen_point(Point3::new(world[0], world[1], world[2]), &camera, &projection)
}

#[test]
fn expand_then_restore_reindexes_the_row() {
    let mut gallery = Gallery::new(&[1.0, 1.0, 1.0]);
    let mut st = InteractionState::default();

    // A point where the middle panel is the closest surface under the ray.
    click(&mut gallery, &mut st, at([3.5, 0.0, 0.2]));
    assert_eq!(st.expanded, Some(1));

    // Mid-flight the tint sits strictly between its endpoints.
    step(&mut gallery, &st, 0.5);
    let tint = gallery.tint();
    assert!(tint[0] < START_TINT[0] && tint[0] > EXPAND_TINT[0]);

    step(&mut gallery, &st, 1.0);
    let panels = gallery.panels();
    assert_eq!(panels[1].position, Vector3::from(FOCUS_POSITION));
    assert_eq!(panels[0].position, Vector3::from(RETREAT_POSITION));
    assert_eq!(panels[2].position, Vector3::from(RETREAT_POSITION));
    assert_eq!(gallery.tint(), EXPAND_TINT);

    // Click the expanded panel again: everyone animates back, with the
    // formerly expanded panel now in slot 0 and its left neighbour shifted
    // up by one.
    click(&mut gallery, &mut st, at(FOCUS_POSITION));
    assert_eq!(st.expanded, None);
    assert_eq!(st.hovered, None);

    step(&mut gallery, &st, 1.2);
    let panels = gallery.panels();
    assert_eq!(panels[0].slot, 1);
    assert_eq!(panels[1].slot, 0);
    assert_eq!(panels[2].slot, 2);
    assert_eq!(panels[1].position, Vector3::new(-1.0, 0.0, 0.0));
    assert_eq!(panels[0].position, Vector3::new(0.0, 0.0, -0.1));
    assert_eq!(panels[2].position, Vector3::new(1.0, 0.0, -0.2));
    for panel in panels {
        assert_eq!(panel.tilt.0, DEFAULT_TILT);
    }
    assert_eq!(gallery.tint(), RESTORE_TINT);
}

#[test]
fn reindexing_persists_across_cycles() {
    let mut gallery = Gallery::new(&[1.0, 1.0, 1.0]);
    let mut st = InteractionState::default();

    // First cycle: expand and restore the middle panel; slots become 1,0,2.
    click(&mut gallery, &mut st, at([3.5, 0.0, 0.2]));
    step(&mut gallery, &st, 1.2);
    click(&mut gallery, &mut st, at(FOCUS_POSITION));
    step(&mut gallery, &st, 1.2);
    let slots: Vec<usize> = gallery.panels().iter().map(|p| p.slot).collect();
    assert_eq!(slots, vec![1, 0, 2]);

    // Second cycle: the same screen position now hits whichever panel took
    // slot 1, and the shift applies to the persisted slots.
    click(&mut gallery, &mut st, at([3.5, 0.0, 0.2]));
    assert_eq!(st.expanded, Some(0));
    step(&mut gallery, &st, 1.2);
    click(&mut gallery, &mut st, at(FOCUS_POSITION));
    step(&mut gallery, &st, 1.2);
    let slots: Vec<usize> = gallery.panels().iter().map(|p| p.slot).collect();
    assert_eq!(slots, vec![0, 1, 2]);
}

#[test]
fn clicks_off_the_expanded_panel_are_ignored() {
    let mut gallery = Gallery::new(&[1.0, 1.0, 1.0]);
    let mut st = InteractionState::default();

    click(&mut gallery, &mut st, at([0.0, 0.0, 0.0]));
    assert_eq!(st.expanded, Some(0));
    step(&mut gallery, &st, 1.2);

    // A miss must not collapse.
    click(&mut gallery, &mut st, far_corner());
    assert_eq!(st.expanded, Some(0));
}

#[test]
fn collapse_is_idempotent_under_hover_traffic() {
    let mut gallery = Gallery::new(&[1.0, 1.0, 1.0]);
    let mut st = InteractionState::default();

    click(&mut gallery, &mut st, at([0.0, 0.0, 0.0]));
    assert_eq!(st.expanded, Some(0));
    step(&mut gallery, &st, 1.2);

    // Hover on and off the expanded panel repeatedly; each flip schedules a
    // tilt micro-animation but never changes what is expanded.
    for _ in 0..5 {
        cursor(&mut gallery, &mut st, at(FOCUS_POSITION));
        step(&mut gallery, &st, 0.6);
        assert_eq!(gallery.panels()[0].tilt.0, 0.0);
        assert_eq!(st.expanded, Some(0));

        cursor(&mut gallery, &mut st, far_corner());
        step(&mut gallery, &st, 0.6);
        assert_eq!(gallery.panels()[0].tilt.0, DEFAULT_TILT);
        assert_eq!(st.expanded, Some(0));
    }

    click(&mut gallery, &mut st, at(FOCUS_POSITION));
    assert_eq!(st.expanded, None);
    assert_eq!(st.hovered, None);
}

#[test]
fn hover_miss_decays_vertical_offsets() {
    let mut gallery = Gallery::new(&[1.0, 1.0, 1.0]);
    let mut st = InteractionState::default();

    // Hover the front panel long enough for a visible bob.
    cursor(&mut gallery, &mut st, at([0.0, 0.0, 0.0]));
    assert_eq!(st.hovered, Some(0));
    for _ in 0..3 {
        step(&mut gallery, &st, 0.25);
    }
    let bobbed = gallery.panels()[0].position.y;
    assert!(bobbed.abs() > 1e-3);

    // Pointer leaves every panel: the hover clears and the offset decays
    // toward zero, a fraction per frame.
    cursor(&mut gallery, &mut st, far_corner());
    assert_eq!(st.hovered, None);
    let mut previous = bobbed.abs();
    for _ in 0..50 {
        step(&mut gallery, &st, 1.0 / 60.0);
        let y = gallery.panels()[0].position.y.abs();
        assert!(y <= previous);
        previous = y;
    }
    assert!(previous < 1e-3);
}

#[test]
fn tweens_own_positions_while_idle_motion_waits() {
    let mut gallery = Gallery::new(&[1.0, 1.0, 1.0]);
    let mut st = InteractionState::default();

    click(&mut gallery, &mut st, at([0.0, 0.0, 0.0]));
    step(&mut gallery, &st, 1.2);
    click(&mut gallery, &mut st, at(FOCUS_POSITION));
    assert_eq!(st.expanded, None);

    // The restore tween is in flight and the state is idle again, so hover
    // is live and lands on the panel still sitting at the focus position;
    // but the tween owns position.y, so no bob may appear.
    cursor(&mut gallery, &mut st, at(FOCUS_POSITION));
    assert_eq!(st.hovered, Some(0));
    for _ in 0..10 {
        step(&mut gallery, &st, 0.05);
        for panel in gallery.panels() {
            assert_eq!(panel.position.y, 0.0);
        }
    }
}

#[test]
fn retrigger_mid_flight_continues_from_the_current_value() {
    let mut gallery = Gallery::new(&[1.0, 1.0, 1.0]);
    let mut st = InteractionState::default();

    click(&mut gallery, &mut st, at([0.0, 0.0, 0.0]));
    step(&mut gallery, &st, 0.3);
    let mid_flight = gallery.panels()[0].position;
    assert!(mid_flight.x > -1.0 && mid_flight.x < FOCUS_POSITION[0]);

    // Collapse while the expand transition is still running: the restore
    // tween restarts from wherever the panel is right now, no snap.
    let pointer = at([mid_flight.x, mid_flight.y, mid_flight.z]);
    click(&mut gallery, &mut st, pointer);
    assert_eq!(st.expanded, None);

    step(&mut gallery, &st, 0.01);
    let after = gallery.panels()[0].position;
    assert!((after.x - mid_flight.x).abs() < 0.5);

    step(&mut gallery, &st, 1.2);
    assert_eq!(gallery.panels()[0].position, Vector3::new(-1.0, 0.0, 0.0));
}
