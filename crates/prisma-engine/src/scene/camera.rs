use glam::{Mat4, Vec3};

/// Perspective camera.
///
/// Cameras here are static after placement; only the aspect ratio mutates,
/// on viewport resize.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    fov_y_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_degrees,
            aspect,
            near,
            far,
        }
    }

    /// Updates the aspect ratio after a viewport resize.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_aspect_changes_projection() {
        let mut cam = Camera::perspective(50.0, 1.0, 0.01, 100.0);
        let before = cam.projection_matrix();
        cam.set_aspect(2.0);
        let after = cam.projection_matrix();
        assert_ne!(before, after);
        // Vertical scale is aspect-independent.
        assert_eq!(before.y_axis, after.y_axis);
    }

    #[test]
    fn view_projection_is_projection_times_view() {
        let mut cam = Camera::perspective(50.0, 16.0 / 9.0, 0.01, 100.0);
        cam.position = Vec3::new(0.0, 0.0, 30.0);
        let vp = cam.view_projection_matrix();
        assert_eq!(vp, cam.projection_matrix() * cam.view_matrix());
    }
}
