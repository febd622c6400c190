//! Reference world generators. They fill a `World` before streaming starts.

use std::error::Error;

use fastnoise_lite::{FastNoiseLite, NoiseType};
use serde::Deserialize;
use strata_blocks::{AIR, BlockId, BlockRegistry};

use crate::world::World;

pub trait WorldGenerator {
    fn generate(&self, world: &World, reg: &BlockRegistry) -> Result<(), Box<dyn Error>>;
}

fn block_id(reg: &BlockRegistry, name: &str) -> Result<BlockId, Box<dyn Error>> {
    reg.id_by_name(name)
        .ok_or_else(|| format!("generator needs block '{name}' but the registry has none").into())
}

#[derive(Clone, Debug, Deserialize)]
pub struct FlatLayer {
    pub block: String,
    pub thickness: u32,
}

/// Horizontal layers stacked from y = 0.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FlatGenerator {
    pub layers: Vec<FlatLayer>,
}

impl Default for FlatGenerator {
    fn default() -> Self {
        let layer = |block: &str, thickness| FlatLayer {
            block: block.to_string(),
            thickness,
        };
        Self {
            layers: vec![
                layer("bedrock", 1),
                layer("stone", 28),
                layer("dirt", 3),
                layer("grass", 1),
            ],
        }
    }
}

impl WorldGenerator for FlatGenerator {
    fn generate(&self, world: &World, reg: &BlockRegistry) -> Result<(), Box<dyn Error>> {
        let mut column: Vec<BlockId> = Vec::new();
        for layer in &self.layers {
            let id = block_id(reg, &layer.block)?;
            column.extend(std::iter::repeat_n(id, layer.thickness as usize));
        }
        column.truncate(world.size_y().max(0) as usize);
        for z in 0..world.size_z() {
            for x in 0..world.size_x() {
                for (y, &id) in column.iter().enumerate() {
                    if id != AIR {
                        world.set_raw(x, y as i32, z, id);
                    }
                }
            }
        }
        log::info!(
            "flat world generated: {} layers, {} blocks tall",
            self.layers.len(),
            column.len()
        );
        Ok(())
    }
}

/// Height-field terrain with sea, beaches and scattered plants.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NoiseGenerator {
    pub seed: i32,
    pub sea_level: i32,
    pub base_height: f32,
    pub amplitude: f32,
    pub frequency: f32,
    /// Share of grass columns that get a plant on top.
    pub plant_density: f32,
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self {
            seed: 1337,
            sea_level: 40,
            base_height: 44.0,
            amplitude: 18.0,
            frequency: 0.012,
            plant_density: 0.08,
        }
    }
}

impl NoiseGenerator {
    fn height_at(&self, noise: &FastNoiseLite, x: i32, z: i32) -> i32 {
        let n = noise.get_noise_2d(x as f32, z as f32);
        (self.base_height + n * self.amplitude).round() as i32
    }
}

impl WorldGenerator for NoiseGenerator {
    fn generate(&self, world: &World, reg: &BlockRegistry) -> Result<(), Box<dyn Error>> {
        let bedrock = block_id(reg, "bedrock")?;
        let stone = block_id(reg, "stone")?;
        let dirt = block_id(reg, "dirt")?;
        let grass = block_id(reg, "grass")?;
        let sand = block_id(reg, "sand")?;
        let water = block_id(reg, "water")?;
        let plants = [
            block_id(reg, "tall_grass")?,
            block_id(reg, "flower")?,
            block_id(reg, "rose")?,
        ];

        let mut terrain = FastNoiseLite::with_seed(self.seed);
        terrain.set_noise_type(Some(NoiseType::OpenSimplex2));
        terrain.set_frequency(Some(self.frequency));
        let mut scatter = FastNoiseLite::with_seed(self.seed ^ 0x5EED);
        scatter.set_noise_type(Some(NoiseType::Value));
        scatter.set_frequency(Some(0.9));

        let top = world.size_y() - 1;
        for z in 0..world.size_z() {
            for x in 0..world.size_x() {
                let h = self.height_at(&terrain, x, z).clamp(1, top - 1);
                let beach = h <= self.sea_level + 1;
                for y in 0..=h {
                    let id = if y == 0 {
                        bedrock
                    } else if y < h - 3 {
                        stone
                    } else if beach {
                        sand
                    } else if y < h {
                        dirt
                    } else {
                        grass
                    };
                    world.set_raw(x, y, z, id);
                }
                for y in (h + 1)..=self.sea_level.min(top) {
                    world.set_raw(x, y, z, water);
                }
                if !beach && h < top {
                    let r = (scatter.get_noise_2d(x as f32, z as f32) + 1.0) * 0.5;
                    if r < self.plant_density {
                        let pick = ((r / self.plant_density.max(f32::EPSILON)) * plants.len() as f32) as usize;
                        world.set_raw(x, h + 1, z, plants[pick.min(plants.len() - 1)]);
                    }
                }
            }
        }
        log::info!(
            "noise world generated: seed {}, sea level {}",
            self.seed,
            self.sea_level
        );
        Ok(())
    }
}
