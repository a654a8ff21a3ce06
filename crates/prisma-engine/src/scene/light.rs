use glam::Vec3;

/// Point light fed to lit passes as a uniform.
#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    pub position: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 50.0),
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}
