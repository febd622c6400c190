//! Shared constants for strata-mesh-cpu.

/// Floats per vertex: position (3), shade (1), uv (2).
pub const VERTEX_STRIDE: usize = 6;
pub const VERTS_PER_QUAD: usize = 4;
pub const FLOATS_PER_QUAD: usize = VERTEX_STRIDE * VERTS_PER_QUAD;

// Base face shades
pub const SHADE_TOP: f32 = 1.0;
pub const SHADE_NORTH_SOUTH: f32 = 0.86;
pub const SHADE_EAST_WEST: f32 = 0.75;
pub const SHADE_BOTTOM: f32 = 0.69;

/// Multiplier applied per occluding neighbour.
pub const AO_FACTOR: f32 = 0.75;

// Cross plants fade towards the ground.
pub const PLANT_SHADE_BOTTOM: f32 = 0.85;
pub const PLANT_SHADE_TOP: f32 = 1.0;

/// Tolerance for "on the block boundary" and "fully covered" tests on model quads.
pub const BOUNDARY_EPS: f32 = 0.001;

/// Quads reserved the first time a group is written in a packet.
pub(crate) const INITIAL_QUAD_CAP: usize = 256;
