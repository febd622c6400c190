//! Block types, texture atlas and the block registry.
#![forbid(unsafe_code)]

pub mod atlas;
pub mod config;
pub mod registry;
pub mod types;

pub use atlas::{AtlasRegion, TextureAtlas};
pub use registry::BlockRegistry;
pub use types::{AIR, BlockId, BlockType, FaceRegions, FaceRole, ModelBox, RenderGroup, Shape};
