use std::f32::consts::{PI, TAU};

use glam::Vec3;
use orbitview_input::ControlAction;

use crate::PerspectiveCamera;

const EPS: f32 = 1e-6;

/// Orbit controller: rotates, pans and dollies a camera around its target.
///
/// Input accumulates into pending deltas; [`OrbitControls::update`] applies
/// them once per frame. With damping on, each update applies only
/// `damping_factor` of what is pending and keeps the rest, so motion eases
/// out over the following frames even without new input.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
    pan_offset: Vec3,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_damping(mut self, damping_factor: f32) -> Self {
        self.enable_damping = true;
        self.damping_factor = damping_factor;
        self
    }

    /// Rotate around the vertical axis. Positive angles turn the view left.
    pub fn rotate_left(&mut self, angle: f32) {
        self.theta_delta -= angle;
    }

    /// Rotate toward the pole. Positive angles tilt the view up.
    pub fn rotate_up(&mut self, angle: f32) {
        self.phi_delta -= angle;
    }

    /// Move toward the target; `scale` is below 1 for real movement.
    pub fn dolly_in(&mut self, scale: f32) {
        self.scale *= scale;
    }

    pub fn dolly_out(&mut self, scale: f32) {
        self.scale /= scale;
    }

    /// Pan by a screen-space delta, keeping the point under the cursor fixed
    /// at the target's depth.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32, camera: &PerspectiveCamera) {
        if viewport_height <= 0.0 {
            return;
        }
        let distance = (camera.position - camera.target).length()
            * (camera.fov_degrees().to_radians() * 0.5).tan();
        let left = -camera.right() * (2.0 * dx * distance / viewport_height);
        let up = camera.camera_up() * (2.0 * dy * distance / viewport_height);
        self.pan_offset += (left + up) * self.pan_speed;
    }

    pub fn zoom_scale(&self) -> f32 {
        0.95_f32.powf(self.zoom_speed)
    }

    /// Feed one input action.
    pub fn apply(&mut self, action: ControlAction, viewport_height: f32, camera: &PerspectiveCamera) {
        match action {
            ControlAction::Rotate { dx, dy } => {
                if viewport_height <= 0.0 {
                    return;
                }
                self.rotate_left(TAU * dx / viewport_height * self.rotate_speed);
                self.rotate_up(TAU * dy / viewport_height * self.rotate_speed);
            }
            ControlAction::Pan { dx, dy } => self.pan(dx, dy, viewport_height, camera),
            ControlAction::Dolly { steps } => {
                // zoom_scale < 1, so positive steps shrink the orbit radius.
                self.scale *= self.zoom_scale().powf(steps);
            }
        }
    }

    /// Whether any input is still waiting to be applied.
    pub fn is_settled(&self) -> bool {
        self.theta_delta.abs() < EPS
            && self.phi_delta.abs() < EPS
            && (self.scale - 1.0).abs() < EPS
            && self.pan_offset.length_squared() < EPS
    }

    /// Apply pending input to the camera. Call once per frame.
    ///
    /// Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - camera.target;
        let mut radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.theta_delta * step;
        phi += self.phi_delta * step;
        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);

        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        let old_position = camera.position;
        let old_target = camera.target;
        camera.target += self.pan_offset * step;
        let offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = camera.target + offset;

        if self.enable_damping {
            let keep = 1.0 - self.damping_factor;
            self.theta_delta *= keep;
            self.phi_delta *= keep;
            self.pan_offset *= keep;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        old_position.distance_squared(camera.position) > EPS
            || old_target.distance_squared(camera.target) > EPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0).with_position(Vec3::new(1.0, 1.5, 1.0))
    }

    fn azimuth(cam: &PerspectiveCamera) -> f32 {
        let o = cam.position - cam.target;
        o.x.atan2(o.z)
    }

    #[test]
    fn idle_update_does_not_move() {
        let mut cam = camera();
        let mut controls = OrbitControls::new().with_damping(0.05);
        let before = cam.position;
        assert!(!controls.update(&mut cam));
        assert!((cam.position - before).length() < 1e-5);
    }

    #[test]
    fn undamped_rotation_applies_at_once() {
        let mut cam = camera();
        let mut controls = OrbitControls::new();
        let start = azimuth(&cam);
        controls.rotate_left(0.5);
        assert!(controls.update(&mut cam));
        assert!((azimuth(&cam) - (start - 0.5)).abs() < 1e-4);
        assert!(controls.is_settled());
        assert!(!controls.update(&mut cam));
    }

    #[test]
    fn damped_rotation_decelerates() {
        let mut cam = camera();
        let mut controls = OrbitControls::new().with_damping(0.05);
        controls.rotate_left(0.5);

        let mut last = azimuth(&cam);
        let mut previous_step = f32::INFINITY;
        for _ in 0..20 {
            assert!(controls.update(&mut cam));
            let now = azimuth(&cam);
            let step = (now - last).abs();
            assert!(step < previous_step);
            assert!(step > 0.0);
            previous_step = step;
            last = now;
        }
        assert!(!controls.is_settled());
    }

    #[test]
    fn damped_rotation_converges_to_full_delta() {
        let mut cam = camera();
        let mut controls = OrbitControls::new().with_damping(0.05);
        let start = azimuth(&cam);
        controls.rotate_left(0.5);
        for _ in 0..1000 {
            controls.update(&mut cam);
        }
        assert!((azimuth(&cam) - (start - 0.5)).abs() < 1e-3);
    }

    #[test]
    fn radius_is_preserved_by_rotation() {
        let mut cam = camera();
        let radius = (cam.position - cam.target).length();
        let mut controls = OrbitControls::new();
        controls.rotate_left(1.0);
        controls.rotate_up(0.3);
        controls.update(&mut cam);
        assert!(((cam.position - cam.target).length() - radius).abs() < 1e-4);
    }

    #[test]
    fn polar_angle_is_clamped() {
        let mut cam = camera();
        let mut controls = OrbitControls::new();
        controls.rotate_up(10.0);
        controls.update(&mut cam);
        let o = cam.position - cam.target;
        // Stays just short of the pole, never flips over it.
        assert!(o.y > 0.0);
        assert!(o.x.abs() + o.z.abs() > 0.0);
    }

    #[test]
    fn dolly_in_moves_closer() {
        let mut cam = camera();
        let mut controls = OrbitControls::new();
        let radius = (cam.position - cam.target).length();
        controls.apply(ControlAction::Dolly { steps: 1.0 }, 600.0, &cam);
        controls.update(&mut cam);
        let after = (cam.position - cam.target).length();
        assert!((after - radius * 0.95).abs() < 1e-4);

        controls.apply(ControlAction::Dolly { steps: -1.0 }, 600.0, &cam);
        controls.update(&mut cam);
        assert!(((cam.position - cam.target).length() - radius).abs() < 1e-4);
    }

    #[test]
    fn distance_limits_hold() {
        let mut cam = camera();
        let mut controls = OrbitControls::new();
        controls.min_distance = 1.0;
        controls.dolly_in(0.01);
        controls.update(&mut cam);
        assert!(((cam.position - cam.target).length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let mut cam = camera();
        let mut controls = OrbitControls::new();
        let offset_before = cam.position - cam.target;
        controls.apply(ControlAction::Pan { dx: 100.0, dy: 0.0 }, 600.0, &cam);
        controls.update(&mut cam);
        assert!(cam.target.length() > 0.0);
        assert!(((cam.position - cam.target) - offset_before).length() < 1e-4);
        // Dragging right slides the scene right, so the target moves left.
        assert!(cam.target.dot(cam.right()) < 0.0);
    }

    #[test]
    fn rotate_action_scales_with_viewport() {
        let cam = camera();
        let mut small = OrbitControls::new();
        let mut large = OrbitControls::new();
        small.apply(ControlAction::Rotate { dx: 10.0, dy: 0.0 }, 300.0, &cam);
        large.apply(ControlAction::Rotate { dx: 10.0, dy: 0.0 }, 600.0, &cam);
        assert!((small.theta_delta - 2.0 * large.theta_delta).abs() < 1e-6);
    }

    #[test]
    fn zero_height_viewport_ignores_drag() {
        let cam = camera();
        let mut controls = OrbitControls::new();
        controls.apply(ControlAction::Rotate { dx: 10.0, dy: 5.0 }, 0.0, &cam);
        controls.apply(ControlAction::Pan { dx: 10.0, dy: 5.0 }, 0.0, &cam);
        assert!(controls.is_settled());
    }
}
