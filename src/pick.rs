//! Pointer hit-testing against the panel set.
//!
//! Picking is done on the CPU: the pointer coordinate becomes a world-space
//! ray through the camera, the ray is tested against every panel's tilted
//! rectangle, and the closest hit by ray distance wins. A miss is the
//! normal outcome and yields `None`. The whole path is a pure function of
//! its inputs, called once per click and once per cursor move.

use cgmath::{EuclideanSpace, InnerSpace, Quaternion, Rotation3, Vector3};
use winit::dpi::PhysicalPosition;

use crate::camera::{Camera, Projection, Ray};
use crate::gallery::Panel;

/// Return the id of the closest panel under the pointer, or `None`.
pub fn pick(
    pointer: PhysicalPosition<f64>,
    viewport_width: f32,
    viewport_height: f32,
    camera: &Camera,
    projection: &Projection,
    panels: &[Panel],
) -> Option<u32> {
    let ray = camera.cast_ray_from_mouse(pointer, viewport_width, viewport_height, projection);
    let mut closest: Option<(f32, u32)> = None;
    for panel in panels {
        if let Some(t) = intersect_panel(&ray, panel) {
            if closest.is_none_or(|(best, _)| t < best) {
                closest = Some((t, panel.id));
            }
        }
    }
    closest.map(|(_, id)| id)
}

/// Ray distance to the panel's rectangle, or `None` when the ray misses or
/// the panel is behind the origin.
fn intersect_panel(ray: &Ray, panel: &Panel) -> Option<f32> {
    let rotation = Quaternion::from_angle_y(panel.tilt);
    let normal = rotation * Vector3::unit_z();

    let denom = ray.direction.dot(normal);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = (panel.position - ray.origin.to_vec()).dot(normal) / denom;
    if t <= 0.0 {
        return None;
    }

    let local = (ray.origin + ray.direction * t).to_vec() - panel.position;
    let right = rotation * Vector3::unit_x();
    let up = rotation * Vector3::unit_y();
    let inside = local.dot(right).abs() <= panel.width / 2.0
        && local.dot(up).abs() <= panel.height / 2.0;
    inside.then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Deg, Rad};

    fn view() -> (Camera, Projection) {
        (
            Camera::new((0.0, 0.0, 10.0), Deg(-90.0), Deg(0.0)),
            Projection::new(800, 600, Deg(75.0), 0.1, 1000.0),
        )
    }

    fn panel(id: u32, x: f32, z: f32) -> Panel {
        Panel {
            id,
            slot: id as usize,
            position: Vector3::new(x, 0.0, z),
            tilt: Rad(0.0),
            width: 2.0,
            height: 2.0,
        }
    }

    #[test]
    fn center_pointer_hits_centered_panel() {
        let (camera, projection) = view();
        let panels = [panel(0, 0.0, 0.0)];
        let hit = pick(
            PhysicalPosition::new(400.0, 300.0),
            800.0,
            600.0,
            &camera,
            &projection,
            &panels,
        );
        assert_eq!(hit, Some(0));
    }

    #[test]
    fn pointer_off_every_panel_is_a_miss() {
        let (camera, projection) = view();
        let panels = [panel(0, 0.0, 0.0)];
        let hit = pick(
            PhysicalPosition::new(10.0, 10.0),
            800.0,
            600.0,
            &camera,
            &projection,
            &panels,
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn closest_of_two_overlapping_panels_wins() {
        let (camera, projection) = view();
        // Both cover the view center; the one nearer the camera must win.
        let panels = [panel(0, 0.0, -3.0), panel(1, 0.0, 2.0)];
        let hit = pick(
            PhysicalPosition::new(400.0, 300.0),
            800.0,
            600.0,
            &camera,
            &projection,
            &panels,
        );
        assert_eq!(hit, Some(1));
    }

    #[test]
    fn panels_behind_the_camera_are_ignored() {
        let (camera, projection) = view();
        let panels = [panel(0, 0.0, 20.0)];
        let hit = pick(
            PhysicalPosition::new(400.0, 300.0),
            800.0,
            600.0,
            &camera,
            &projection,
            &panels,
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn repeated_picks_are_deterministic() {
        let (camera, projection) = view();
        let panels = [panel(0, -1.0, 0.0), panel(1, 0.0, -0.1), panel(2, 1.0, -0.2)];
        let pointer = PhysicalPosition::new(430.0, 310.0);
        let first = pick(pointer, 800.0, 600.0, &camera, &projection, &panels);
        for _ in 0..16 {
            assert_eq!(pick(pointer, 800.0, 600.0, &camera, &projection, &panels), first);
        }
    }

    #[test]
    fn degenerate_viewport_does_not_panic() {
        let (camera, projection) = view();
        let panels = [panel(0, 0.0, 0.0)];
        let _ = pick(
            PhysicalPosition::new(123.0, -456.0),
            0.0,
            0.0,
            &camera,
            &projection,
            &panels,
        );
    }
}
