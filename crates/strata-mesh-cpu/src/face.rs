use strata_blocks::FaceRole;
use strata_geom::Vec3;

/// Block face; north is -Z, east is +X.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    PosY = 0,
    NegY = 1,
    PosX = 2,
    NegX = 3,
    PosZ = 4,
    NegZ = 5,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosY,
        Face::NegY,
        Face::PosX,
        Face::NegX,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Returns the `[0..6)` index of this face.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Converts a face index `[0..6)` back into a `Face` value.
    /// Falls back to `PosY` for out-of-range indices.
    #[inline]
    pub fn from_index(i: usize) -> Face {
        match i {
            0 => Face::PosY,
            1 => Face::NegY,
            2 => Face::PosX,
            3 => Face::NegX,
            4 => Face::PosZ,
            5 => Face::NegZ,
            _ => Face::PosY,
        }
    }

    #[inline]
    pub fn opposite(self) -> Face {
        match self {
            Face::PosY => Face::NegY,
            Face::NegY => Face::PosY,
            Face::PosX => Face::NegX,
            Face::NegX => Face::PosX,
            Face::PosZ => Face::NegZ,
            Face::NegZ => Face::PosZ,
        }
    }

    #[inline]
    pub fn axis(self) -> Axis {
        match self {
            Face::PosY | Face::NegY => Axis::Y,
            Face::PosX | Face::NegX => Axis::X,
            Face::PosZ | Face::NegZ => Axis::Z,
        }
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        matches!(self, Face::PosY | Face::PosX | Face::PosZ)
    }

    /// Returns the unit-normal vector for this face.
    #[inline]
    pub fn normal(self) -> Vec3 {
        let (dx, dy, dz) = self.delta();
        Vec3::new(dx as f32, dy as f32, dz as f32)
    }

    /// Returns the integer grid delta `(dx,dy,dz)` when stepping out of this face.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Face::PosY => (0, 1, 0),
            Face::NegY => (0, -1, 0),
            Face::PosX => (1, 0, 0),
            Face::NegX => (-1, 0, 0),
            Face::PosZ => (0, 0, 1),
            Face::NegZ => (0, 0, -1),
        }
    }

    /// Top/bottom/side role for texture lookup.
    #[inline]
    pub fn role(self) -> FaceRole {
        match self {
            Face::PosY => FaceRole::Top,
            Face::NegY => FaceRole::Bottom,
            _ => FaceRole::Side,
        }
    }

    /// In-plane `(u, v)` axes: Y faces use `(x, z)`, X faces `(z, y)`, Z faces `(x, y)`.
    #[inline]
    pub fn plane_axes(self) -> (Axis, Axis) {
        match self.axis() {
            Axis::Y => (Axis::X, Axis::Z),
            Axis::X => (Axis::Z, Axis::Y),
            Axis::Z => (Axis::X, Axis::Y),
        }
    }

    /// Texture `(s, t)` for a block-local vertex position on this face.
    #[inline]
    pub fn tex_coords(self, p: Vec3) -> (f32, f32) {
        match self {
            Face::PosY => (p.x, p.z),
            Face::NegY => (1.0 - p.x, 1.0 - p.z),
            Face::NegZ => (1.0 - p.x, 1.0 - p.y),
            Face::PosX => (1.0 - p.z, 1.0 - p.y),
            Face::PosZ => (p.x, 1.0 - p.y),
            Face::NegX => (p.z, 1.0 - p.y),
        }
    }
}

impl Axis {
    #[inline]
    pub fn of(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    #[inline]
    pub fn of_arr(self, v: [f32; 3]) -> f32 {
        v[self as usize]
    }

    #[inline]
    pub fn of_delta(self, d: (i32, i32, i32)) -> i32 {
        match self {
            Axis::X => d.0,
            Axis::Y => d.1,
            Axis::Z => d.2,
        }
    }

    /// Unit step along this axis.
    #[inline]
    pub fn unit(self) -> (i32, i32, i32) {
        match self {
            Axis::X => (1, 0, 0),
            Axis::Y => (0, 1, 0),
            Axis::Z => (0, 0, 1),
        }
    }
}
