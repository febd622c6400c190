use serde::Deserialize;

use crate::atlas::AtlasConfig;

#[derive(Deserialize, Clone, Debug)]
pub struct BlocksConfig {
    pub atlas: AtlasConfig,
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct BlockDef {
    pub name: String,
    #[serde(default)]
    pub id: Option<u8>,
    #[serde(default)]
    pub solid: Option<bool>,
    #[serde(default)]
    pub collidable: Option<bool>,
    #[serde(default)]
    pub ao: Option<bool>,
    #[serde(default)]
    pub shape: Option<ShapeConfig>,
    pub textures: TexturesConfig,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum ShapeConfig {
    // shape = "cube" | "cross" | "liquid"
    Simple(String),
    // shape = { model = [[x0, y0, z0, x1, y1, z1], ...] } in 1/16ths of a block
    Model { model: Vec<[f32; 6]> },
}

#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum TexturesConfig {
    // textures = "stone"
    All(String),
    // textures = { top = "grass_top", side = "grass_side", bottom = "dirt" }
    Faces {
        #[serde(default)]
        all: Option<String>,
        #[serde(default)]
        top: Option<String>,
        #[serde(default)]
        side: Option<String>,
        #[serde(default)]
        bottom: Option<String>,
    },
}
