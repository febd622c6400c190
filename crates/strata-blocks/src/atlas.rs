use hashbrown::HashMap;
use std::error::Error;

use serde::Deserialize;

/// UV rectangle of one atlas tile.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AtlasRegion {
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl AtlasRegion {
    pub const FULL: AtlasRegion = AtlasRegion {
        u0: 0.0,
        v0: 0.0,
        u1: 1.0,
        v1: 1.0,
    };

    /// Maps tile-local `(s, t)` in `[0, 1]` into the atlas.
    #[inline]
    pub fn remap(&self, s: f32, t: f32) -> (f32, f32) {
        (
            self.u0 + (self.u1 - self.u0) * s,
            self.v0 + (self.v1 - self.v0) * t,
        )
    }
}

/// Square grid atlas; tile index = position in the configured texture list.
#[derive(Default, Clone, Debug)]
pub struct TextureAtlas {
    pub tiles_per_row: u32,
    pub keys: Vec<String>,
    pub by_key: HashMap<String, u32>,
}

impl TextureAtlas {
    pub fn new(tiles_per_row: u32) -> Self {
        Self {
            tiles_per_row: tiles_per_row.max(1),
            keys: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    pub fn from_config(cfg: AtlasConfig) -> Result<Self, Box<dyn Error>> {
        let mut atlas = TextureAtlas::new(cfg.tiles_per_row);
        let capacity = (atlas.tiles_per_row * atlas.tiles_per_row) as usize;
        if cfg.textures.len() > capacity {
            return Err(format!(
                "atlas holds {capacity} tiles but {} textures are listed",
                cfg.textures.len()
            )
            .into());
        }
        for key in cfg.textures {
            atlas.insert(key)?;
        }
        Ok(atlas)
    }

    fn insert(&mut self, key: String) -> Result<u32, Box<dyn Error>> {
        if self.by_key.contains_key(&key) {
            return Err(format!("duplicate atlas texture '{key}'").into());
        }
        let ix = self.keys.len() as u32;
        self.by_key.insert(key.clone(), ix);
        self.keys.push(key);
        Ok(ix)
    }

    pub fn index_of(&self, key: &str) -> Option<u32> {
        self.by_key.get(key).copied()
    }

    pub fn tile(&self, index: u32) -> AtlasRegion {
        let n = self.tiles_per_row.max(1);
        let size = 1.0 / n as f32;
        let col = (index % n) as f32;
        let row = (index / n) as f32;
        AtlasRegion {
            u0: col * size,
            v0: row * size,
            u1: (col + 1.0) * size,
            v1: (row + 1.0) * size,
        }
    }

    pub fn region(&self, key: &str) -> Option<AtlasRegion> {
        self.index_of(key).map(|ix| self.tile(ix))
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct AtlasConfig {
    #[serde(default = "default_tiles_per_row")]
    pub tiles_per_row: u32,
    pub textures: Vec<String>,
}

fn default_tiles_per_row() -> u32 {
    16
}
