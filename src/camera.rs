use strata_geom::{Frustum, Mat4, Vec3};
use strata_world::ChunkCoord;

pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,   // degrees
    pub pitch: f32, // degrees
    pub fovy: f32,  // degrees
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub move_speed: f32,
}

impl FlyCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: -45.0,
            pitch: -15.0,
            fovy: 70.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            move_speed: 8.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let yaw_rad = self.yaw.to_radians();
        let pitch_rad = self.pitch.to_radians();
        Vec3::new(
            yaw_rad.cos() * pitch_rad.cos(),
            pitch_rad.sin(),
            yaw_rad.sin() * pitch_rad.cos(),
        )
        .normalized()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::UP).normalized()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalized()
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at(self.position, self.position + self.forward(), Vec3::UP)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective(self.fovy.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_proj(&self.view_proj())
    }

    /// Chunk the camera is in; drives streaming.
    pub fn chunk(&self) -> ChunkCoord {
        ChunkCoord::of_position(self.position.x, self.position.y, self.position.z)
    }

    pub fn look(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-89.9, 89.9);
    }

    /// Moves along `wish_dir` (camera-independent, normalized here) at `move_speed`.
    pub fn fly(&mut self, wish_dir: Vec3, dt: f32) {
        if wish_dir.length() > 0.0 {
            self.position += wish_dir.normalized() * self.move_speed * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ahead_is_inside_frustum() {
        let cam = FlyCamera::new(Vec3::new(10.0, 50.0, 10.0));
        let ahead = cam.position + cam.forward() * 20.0;
        assert!(cam.frustum().contains_point(ahead));
        let behind = cam.position - cam.forward() * 20.0;
        assert!(!cam.frustum().contains_point(behind));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = FlyCamera::new(Vec3::ZERO);
        cam.look(10.0, 500.0);
        assert!(cam.pitch < 90.0);
        assert_eq!(cam.chunk(), ChunkCoord::new(0, 0, 0));
    }
}
