use glam::{Mat4, Vec3};

// diffed frame to frame, so equality is exact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub camera_to_world: Mat4,
    pub inverse_projection: Mat4,
}

// right-handed, Y up
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    // radians
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            // looking down -Z
            yaw: -90.0_f32.to_radians(),
            pitch: 0.0,
            fov_y: 45.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        let (sin_y, cos_y) = self.yaw.sin_cos();
        let (sin_p, cos_p) = self.pitch.sin_cos();
        Vec3::new(cos_p * cos_y, sin_p, cos_p * sin_y).normalize()
    }

    pub fn look_at(&mut self, target: Vec3) {
        let dir = (target - self.position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        self.pitch = dir.y.asin().clamp(-1.5, 1.5);
        self.yaw = dir.z.atan2(dir.x);
    }

    // around the Y axis, keeping `target` in view
    pub fn orbit(&mut self, target: Vec3, angle: f32) {
        let offset = self.position - target;
        let rotated = Mat4::from_rotation_y(angle).transform_vector3(offset);
        self.position = target + rotated;
        self.look_at(target);
    }

    #[must_use]
    pub fn pose(&self, aspect: f32) -> CameraPose {
        let view = Mat4::look_at_rh(self.position, self.position + self.forward(), Vec3::Y);
        let proj = Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far);

        CameraPose {
            camera_to_world: view.inverse(),
            inverse_projection: proj.inverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_sits_on_positive_z() {
        let pose = Camera::default().pose(16.0 / 9.0);
        let origin = pose.camera_to_world.transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, 3.0), 1e-5));
        let forward = pose.camera_to_world.transform_vector3(Vec3::NEG_Z);
        assert!(forward.abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn orbit_keeps_distance_and_aim() {
        let mut camera = Camera::default();
        camera.orbit(Vec3::ZERO, 0.5);
        assert!((camera.position.length() - 3.0).abs() < 1e-4);
        let to_target = (-camera.position).normalize();
        assert!(camera.forward().abs_diff_eq(to_target, 1e-4));
    }

    #[test]
    fn aspect_change_changes_pose() {
        let camera = Camera::default();
        assert_ne!(camera.pose(1.0), camera.pose(2.0));
    }
}
