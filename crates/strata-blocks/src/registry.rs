use hashbrown::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::atlas::{AtlasRegion, TextureAtlas};
use crate::config::{BlockDef, BlocksConfig, ShapeConfig, TexturesConfig};
use crate::types::{AIR, BlockId, BlockType, FaceRegions, ModelBox, Shape};

const BUILTIN_BLOCKS: &str = include_str!("../data/blocks.toml");

/// Id-indexed block table, built once and shared read-only.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    pub atlas: TextureAtlas,
    pub blocks: Vec<BlockType>,
    pub by_name: HashMap<String, BlockId>,
    air: BlockType,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// Registry holding only air.
    pub fn new() -> Self {
        let air = BlockType::air();
        let mut by_name = HashMap::new();
        by_name.insert(air.name.clone(), AIR);
        Self {
            atlas: TextureAtlas::new(16),
            blocks: vec![air.clone()],
            by_name,
            air,
        }
    }

    /// The block table shipped with the engine.
    pub fn builtin() -> Result<Self, Box<dyn Error>> {
        Self::from_toml_str(BUILTIN_BLOCKS)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(toml_str)?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = BlockRegistry::new();
        reg.atlas = TextureAtlas::from_config(cfg.atlas)?;
        for def in cfg.blocks.into_iter() {
            if def.name == "air" {
                continue;
            }
            let id = match def.id {
                Some(id) => id,
                None => {
                    let next = reg.blocks.len();
                    if next > usize::from(BlockId::MAX) {
                        return Err(format!("too many blocks; '{}' has no free id", def.name).into());
                    }
                    next as BlockId
                }
            };
            if id == AIR {
                return Err(format!("block '{}' cannot take id 0 (air)", def.name).into());
            }
            let ty = compile_block(&reg.atlas, id, def)?;
            reg.insert(ty)?;
        }
        Ok(reg)
    }

    fn insert(&mut self, ty: BlockType) -> Result<(), Box<dyn Error>> {
        let ix = ty.id as usize;
        if self.by_name.contains_key(&ty.name) {
            return Err(format!("duplicate block name '{}'", ty.name).into());
        }
        if ix < self.blocks.len() && !self.blocks[ix].is_air() {
            return Err(format!(
                "block id {} used by both '{}' and '{}'",
                ty.id, self.blocks[ix].name, ty.name
            )
            .into());
        }
        // Gaps left by explicit ids resolve to air.
        while self.blocks.len() <= ix {
            self.blocks.push(self.air.clone());
        }
        self.by_name.insert(ty.name.clone(), ty.id);
        self.blocks[ix] = ty;
        Ok(())
    }

    #[inline]
    pub fn get(&self, id: BlockId) -> Option<&BlockType> {
        self.blocks.get(id as usize)
    }

    /// Like `get`, but unknown ids resolve to air.
    #[inline]
    pub fn resolve(&self, id: BlockId) -> &BlockType {
        self.blocks.get(id as usize).unwrap_or(&self.air)
    }

    #[inline]
    pub fn is_solid(&self, id: BlockId) -> bool {
        self.resolve(id).solid
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.len() <= 1
    }
}

fn compile_block(atlas: &TextureAtlas, id: BlockId, def: BlockDef) -> Result<BlockType, Box<dyn Error>> {
    let shape = compile_shape(&def.name, def.shape)?;
    let default_solid = matches!(shape, Shape::Cube);
    let solid = def.solid.unwrap_or(default_solid);
    let collidable = def
        .collidable
        .unwrap_or(matches!(shape, Shape::Cube | Shape::Model { .. }));
    let faces = compile_faces(atlas, &def.name, def.textures)?;
    Ok(BlockType {
        id,
        name: def.name,
        solid,
        collidable,
        ao: def.ao.unwrap_or(true),
        shape,
        faces,
    })
}

fn compile_shape(name: &str, cfg: Option<ShapeConfig>) -> Result<Shape, Box<dyn Error>> {
    match cfg {
        None => Ok(Shape::Cube),
        Some(ShapeConfig::Simple(s)) => match s.as_str() {
            "cube" => Ok(Shape::Cube),
            "cross" => Ok(Shape::Cross),
            "liquid" => Ok(Shape::Liquid),
            other => Err(format!("block '{name}': unknown shape '{other}'").into()),
        },
        Some(ShapeConfig::Model { model }) => {
            if model.is_empty() {
                return Err(format!("block '{name}': model needs at least one box").into());
            }
            let boxes = model
                .into_iter()
                .map(|b| {
                    let s = 1.0 / 16.0;
                    ModelBox::new(
                        [b[0] * s, b[1] * s, b[2] * s],
                        [b[3] * s, b[4] * s, b[5] * s],
                    )
                })
                .collect();
            Ok(Shape::Model { boxes })
        }
    }
}

fn compile_faces(
    atlas: &TextureAtlas,
    name: &str,
    cfg: TexturesConfig,
) -> Result<FaceRegions, Box<dyn Error>> {
    let lookup = |key: &str| -> Result<AtlasRegion, Box<dyn Error>> {
        atlas
            .region(key)
            .ok_or_else(|| format!("block '{name}': texture '{key}' is not in the atlas").into())
    };
    match cfg {
        TexturesConfig::All(key) => Ok(FaceRegions::uniform(lookup(&key)?)),
        TexturesConfig::Faces {
            all,
            top,
            side,
            bottom,
        } => {
            let pick = |face: Option<String>| -> Result<AtlasRegion, Box<dyn Error>> {
                match face.or_else(|| all.clone()) {
                    Some(key) => lookup(&key),
                    None => Err(format!("block '{name}': missing texture and no 'all' fallback").into()),
                }
            };
            // Bottom falls back to top, matching blocks that only list top and side.
            let bottom = bottom.or_else(|| top.clone());
            Ok(FaceRegions {
                top: pick(top)?,
                side: pick(side)?,
                bottom: pick(bottom)?,
            })
        }
    }
}
