//! Strata: voxel chunk streaming and meshing over a pluggable GPU backend.
#![forbid(unsafe_code)]

pub mod camera;
pub mod config;
pub mod engine;
pub mod logging;
pub mod streaming;

pub use camera::FlyCamera;
pub use config::{AppConfig, Cli, EngineConfig, GeneratorConfig, GeneratorKind};
pub use engine::{Engine, EngineError, FrameStats};
pub use streaming::{StreamingManager, StreamingStats};

pub use strata_blocks as blocks;
pub use strata_geom as geom;
pub use strata_mesh_cpu as mesh;
pub use strata_render as render;
pub use strata_runtime as runtime;
pub use strata_world as world;
