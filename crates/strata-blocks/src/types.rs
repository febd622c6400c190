use crate::atlas::AtlasRegion;

pub type BlockId = u8;

/// Id 0 is always air.
pub const AIR: BlockId = 0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FaceRole {
    Top,
    Bottom,
    Side,
}

/// Vertex stream a block's geometry is written to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum RenderGroup {
    /// Opaque and alpha-tested cubes.
    Terrain = 0,
    /// Cross-shaped foliage.
    Plant = 1,
    /// Translucent liquids.
    Liquid = 2,
}

impl RenderGroup {
    pub const COUNT: usize = 3;
    pub const ALL: [RenderGroup; RenderGroup::COUNT] =
        [RenderGroup::Terrain, RenderGroup::Plant, RenderGroup::Liquid];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            RenderGroup::Terrain => "terrain",
            RenderGroup::Plant => "plant",
            RenderGroup::Liquid => "liquid",
        }
    }
}

/// Axis-aligned box in block-local unit space (`0..=1` on each axis).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ModelBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl ModelBox {
    pub const FULL: ModelBox = ModelBox {
        min: [0.0, 0.0, 0.0],
        max: [1.0, 1.0, 1.0],
    };

    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        let lo = [min[0].min(max[0]), min[1].min(max[1]), min[2].min(max[2])];
        let hi = [min[0].max(max[0]), min[1].max(max[1]), min[2].max(max[2])];
        Self { min: lo, max: hi }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Air,
    Cube,
    /// Two diagonal quads, never face-culled.
    Cross,
    Liquid,
    /// Data-driven sub-cube boxes.
    Model { boxes: Vec<ModelBox> },
}

impl Shape {
    pub fn group(&self) -> RenderGroup {
        match self {
            Shape::Cross => RenderGroup::Plant,
            Shape::Liquid => RenderGroup::Liquid,
            Shape::Air | Shape::Cube | Shape::Model { .. } => RenderGroup::Terrain,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FaceRegions {
    pub top: AtlasRegion,
    pub side: AtlasRegion,
    pub bottom: AtlasRegion,
}

impl FaceRegions {
    pub fn uniform(r: AtlasRegion) -> Self {
        Self {
            top: r,
            side: r,
            bottom: r,
        }
    }

    #[inline]
    pub fn for_role(&self, role: FaceRole) -> AtlasRegion {
        match role {
            FaceRole::Top => self.top,
            FaceRole::Bottom => self.bottom,
            FaceRole::Side => self.side,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BlockType {
    pub id: BlockId,
    pub name: String,
    /// Opaque for face culling and ambient occlusion.
    pub solid: bool,
    pub collidable: bool,
    pub shape: Shape,
    /// Ambient occlusion on model quads.
    pub ao: bool,
    pub faces: FaceRegions,
}

impl BlockType {
    pub fn air() -> Self {
        Self {
            id: AIR,
            name: "air".to_string(),
            solid: false,
            collidable: false,
            shape: Shape::Air,
            ao: false,
            faces: FaceRegions::default(),
        }
    }

    #[inline]
    pub fn is_air(&self) -> bool {
        matches!(self.shape, Shape::Air)
    }

    #[inline]
    pub fn group(&self) -> RenderGroup {
        self.shape.group()
    }
}
