//! `strata.toml` loading and command-line overrides.

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use strata_render::MAX_QUADS_U16;
use strata_runtime::SchedulerConfig;
use strata_world::WorldConfig;
use strata_world::generation::{FlatGenerator, NoiseGenerator, WorldGenerator};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Streaming radius in chunks (Chebyshev distance).
    pub render_radius: i32,
    pub workers: usize,
    pub batch_capacity: usize,
    /// Quads per GPU buffer; larger groups are split.
    pub max_quads: usize,
    pub skip_near_far: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            render_radius: 8,
            workers: 1,
            batch_capacity: 8,
            max_quads: 16384,
            skip_near_far: true,
        }
    }
}

impl EngineConfig {
    /// `max_quads` limited to what the shared `u16` index buffer can address.
    pub fn quads_per_buffer(&self) -> usize {
        self.max_quads.clamp(1, MAX_QUADS_U16)
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            workers: self.workers,
            batch_capacity: self.batch_capacity,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GeneratorConfig {
    Flat(FlatGenerator),
    Noise(NoiseGenerator),
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig::Noise(NoiseGenerator::default())
    }
}

impl GeneratorConfig {
    pub fn as_generator(&self) -> &dyn WorldGenerator {
        match self {
            GeneratorConfig::Flat(g) => g,
            GeneratorConfig::Noise(g) => g,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub world: WorldConfig,
    pub generator: GeneratorConfig,
    /// Block table; the built-in one when unset.
    pub blocks: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("reading {}: {e}", path.display()))?;
        let cfg = Self::from_toml_str(&text)?;
        log::info!("loaded config from {}", path.display());
        Ok(cfg)
    }

    /// Command-line values win over the file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(r) = cli.radius {
            self.engine.render_radius = r;
        }
        if let Some(w) = cli.workers {
            self.engine.workers = w;
        }
        if let Some(b) = cli.batch {
            self.engine.batch_capacity = b;
        }
        if let Some(blocks) = &cli.blocks {
            self.blocks = Some(blocks.clone());
        }
        if let Some(kind) = cli.generator {
            let same = matches!(
                (kind, &self.generator),
                (GeneratorKind::Flat, GeneratorConfig::Flat(_))
                    | (GeneratorKind::Noise, GeneratorConfig::Noise(_))
            );
            if !same {
                self.generator = match kind {
                    GeneratorKind::Flat => GeneratorConfig::Flat(FlatGenerator::default()),
                    GeneratorKind::Noise => GeneratorConfig::Noise(NoiseGenerator::default()),
                };
            }
        }
        if let (Some(seed), GeneratorConfig::Noise(g)) = (cli.seed, &mut self.generator) {
            g.seed = seed;
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum GeneratorKind {
    Flat,
    Noise,
}

/// Headless chunk streaming driver.
#[derive(Parser, Debug)]
#[command(name = "strata", version, about)]
pub struct Cli {
    /// Config file (TOML); defaults are used when absent.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Block table (TOML) replacing the built-in one.
    #[arg(long)]
    pub blocks: Option<PathBuf>,
    #[arg(long)]
    pub radius: Option<i32>,
    #[arg(long)]
    pub workers: Option<usize>,
    #[arg(long)]
    pub batch: Option<usize>,
    #[arg(long, value_enum)]
    pub generator: Option<GeneratorKind>,
    #[arg(long)]
    pub seed: Option<i32>,
    /// Frames to simulate.
    #[arg(long, default_value_t = 240)]
    pub frames: u32,
    /// Camera speed in blocks per frame.
    #[arg(long, default_value_t = 0.5)]
    pub speed: f32,
    /// Place or remove a block near the camera every N frames (0 disables).
    #[arg(long, default_value_t = 10)]
    pub edit_every: u32,
    /// Also write the log to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    pub log_level: log::LevelFilter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.engine, EngineConfig::default());
        assert_eq!(cfg.world, WorldConfig::default());
        assert!(matches!(cfg.generator, GeneratorConfig::Noise(_)));
    }

    #[test]
    fn sections_parse() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [engine]
            render_radius = 4
            workers = 3

            [world]
            chunks_x = 8

            [generator]
            kind = "flat"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.engine.render_radius, 4);
        assert_eq!(cfg.engine.workers, 3);
        assert_eq!(cfg.engine.batch_capacity, 8);
        assert_eq!(cfg.world.chunks_x, 8);
        let GeneratorConfig::Flat(flat) = cfg.generator else {
            panic!("expected flat generator");
        };
        assert_eq!(flat.layers.len(), 4);
    }

    #[test]
    fn shipped_config_parses() {
        let cfg = AppConfig::from_toml_str(include_str!("../strata.toml")).unwrap();
        assert_eq!(cfg.engine.render_radius, 6);
        assert_eq!(cfg.engine.scheduler().workers, 2);
        assert!(matches!(cfg.generator, GeneratorConfig::Noise(ref n) if n.seed == 1337));
    }

    #[test]
    fn quads_per_buffer_fits_the_index_buffer() {
        let mut cfg = EngineConfig {
            max_quads: 20_000,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.quads_per_buffer(), MAX_QUADS_U16);
        cfg.max_quads = 0;
        assert_eq!(cfg.quads_per_buffer(), 1);
        cfg.max_quads = 500;
        assert_eq!(cfg.quads_per_buffer(), 500);
    }

    #[test]
    fn cli_overrides_file() {
        let mut cfg = AppConfig::default();
        let cli = Cli::parse_from([
            "strata",
            "--radius",
            "3",
            "--generator",
            "noise",
            "--seed",
            "7",
            "--log-level",
            "debug",
        ]);
        cfg.apply_cli(&cli);
        assert_eq!(cfg.engine.render_radius, 3);
        let GeneratorConfig::Noise(noise) = &cfg.generator else {
            panic!("expected noise generator");
        };
        assert_eq!(noise.seed, 7);
        assert_eq!(cli.log_level, log::LevelFilter::Debug);
    }
}
