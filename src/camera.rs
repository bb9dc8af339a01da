//! Camera types, controller and uniforms for view/projection.
//!
//! The gallery uses a single fixed observer: a perspective camera in front of
//! the panel row. Orbit-style input (pan/rotate/zoom) is wired through
//! [`CameraController`] but disabled by default; the controller's `update`
//! still runs every frame so inertia/damping keeps working the moment an
//! input axis is enabled again.
//!
//! [`Camera::cast_ray_from_mouse`] turns a pointer coordinate into a
//! world-space [`Ray`] for CPU picking.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3};
use instant::Duration;
use winit::dpi::PhysicalPosition;
use winit::event::{MouseScrollDelta, WindowEvent};

/// wgpu clip space covers z in [0, 1] while cgmath produces OpenGL-style
/// [-1, 1]; this matrix converts between the two.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// The single observer: a position plus yaw/pitch orientation.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: pitch.into(),
        }
    }

    /// Unit view direction derived from yaw and pitch.
    pub fn forward(&self) -> Vector3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }

    /// Cast a world-space ray from the camera through a pointer position.
    ///
    /// Pointer coordinates are normalized to the signed unit square with
    /// screen-up positive. Out-of-range input (including a detached or
    /// zero-size viewport) is clamped into [-1, 1] instead of propagating a
    /// division by zero.
    pub fn cast_ray_from_mouse(
        &self,
        coords: PhysicalPosition<f64>,
        width: f32,
        height: f32,
        projection: &Projection,
    ) -> Ray {
        let ndc_x = ((coords.x as f32 / width.max(1.0)) * 2.0 - 1.0).clamp(-1.0, 1.0);
        let ndc_y = (1.0 - (coords.y as f32 / height.max(1.0)) * 2.0).clamp(-1.0, 1.0);

        let forward = self.forward();
        let right = forward.cross(Vector3::unit_y()).normalize();
        let up = right.cross(forward);

        let tan_fov = (projection.fovy.0 / 2.0).tan();
        let direction = (forward
            + right * ndc_x * projection.aspect * tan_fov
            + up * ndc_y * tan_fov)
            .normalize();

        Ray {
            origin: self.position,
            direction,
        }
    }
}

/// A world-space half-line used for picking.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

/// Perspective projection parameters, resized with the surface.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Track a viewport resize. Only the aspect ratio changes; scene state is
    /// untouched.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Orbit-style input accumulator with per-frame damping.
///
/// Every input axis is disabled for the gallery; the fields stay so the
/// frame driver's damping hook has something to advance.
#[derive(Clone, Copy, Debug)]
pub struct CameraController {
    speed: f32,
    sensitivity: f32,
    pub enable_rotate: bool,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    rotate_horizontal: f32,
    rotate_vertical: f32,
    scroll: f32,
}

impl CameraController {
    const DAMPING: f32 = 0.7;

    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            speed,
            sensitivity,
            enable_rotate: false,
            enable_zoom: false,
            enable_pan: false,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
            scroll: 0.0,
        }
    }

    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        if !self.enable_rotate {
            return;
        }
        self.rotate_horizontal += dx as f32 * self.sensitivity;
        self.rotate_vertical += dy as f32 * self.sensitivity;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            if self.enable_zoom {
                self.scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y * 10.0,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
            }
        }
    }

    /// Apply accumulated input and decay it. With all axes disabled the
    /// accumulators are zero and this is the no-op damping hook the frame
    /// driver advances each tick.
    pub fn update(&mut self, camera: &mut Camera, dt: Duration) {
        let dt = dt.as_secs_f32();

        camera.yaw += Rad(self.rotate_horizontal * dt);
        camera.pitch -= Rad(self.rotate_vertical * dt);
        camera.position += camera.forward() * self.scroll * self.speed * dt;

        self.rotate_horizontal *= Self::DAMPING;
        self.rotate_vertical *= Self::DAMPING;
        self.scroll *= Self::DAMPING;
    }
}

/// The GPU-visible camera data uploaded once per frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera state bundled with its GPU resources, owned by the context.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: CameraController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

pub fn camera_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("camera_bind_group_layout"),
    })
}
