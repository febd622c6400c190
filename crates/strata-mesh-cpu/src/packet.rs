use strata_blocks::RenderGroup;
use strata_world::ChunkCoord;

use crate::mesh_build::MeshBuild;

/// CPU geometry of one chunk, one vertex stream per render group.
///
/// Packets are pooled: `reset` keeps every stream's capacity.
#[derive(Default, Clone, Debug)]
pub struct MeshPacket {
    pub coord: ChunkCoord,
    pub groups: [MeshBuild; RenderGroup::COUNT],
    /// Set when the build panicked; such a packet carries no geometry.
    pub failed: bool,
}

impl MeshPacket {
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            ..Self::default()
        }
    }

    pub fn reset(&mut self, coord: ChunkCoord) {
        self.coord = coord;
        self.failed = false;
        self.clear_geometry();
    }

    pub fn clear_geometry(&mut self) {
        for g in &mut self.groups {
            g.clear_keep_capacity();
        }
    }

    #[inline]
    pub fn group(&self, g: RenderGroup) -> &MeshBuild {
        &self.groups[g.index()]
    }

    #[inline]
    pub fn group_mut(&mut self, g: RenderGroup) -> &mut MeshBuild {
        &mut self.groups[g.index()]
    }

    pub fn quad_count(&self) -> usize {
        self.groups.iter().map(MeshBuild::quad_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(MeshBuild::is_empty)
    }
}
