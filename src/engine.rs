use std::sync::Arc;

use strata_blocks::{BlockId, BlockRegistry};
use strata_render::{GpuBackend, GpuError, QuadIndex, VisibilityCuller};
use strata_runtime::{ChunkBuilder, SchedulerError, SchedulerStats};
use strata_world::World;

use crate::camera::FlyCamera;
use crate::config::EngineConfig;
use crate::streaming::{StreamingManager, StreamingStats};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("GPU failure: {0}")]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("engine has been shut down")]
    ShutDown,
}

/// What one call to [`Engine::render`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub table_chunks: usize,
    pub visible_chunks: usize,
    pub culled_chunks: usize,
    pub draw_calls: usize,
    pub quads: usize,
    pub pending_dirty: usize,
    pub pending_updates: usize,
    pub building: bool,
}

/// Streams, meshes and draws a shared [`World`] through a [`GpuBackend`].
///
/// Everything runs on the calling thread except meshing, which uses the scheduler's pool.
pub struct Engine<B: GpuBackend> {
    cfg: EngineConfig,
    world: Arc<World>,
    registry: Arc<BlockRegistry>,
    backend: B,
    streaming: StreamingManager,
    index: QuadIndex,
    culler: VisibilityCuller,
    frame: u64,
    shut_down: bool,
}

impl<B: GpuBackend> Engine<B> {
    pub fn new(
        config: EngineConfig,
        registry: Arc<BlockRegistry>,
        world: Arc<World>,
        backend: B,
    ) -> Result<Self, EngineError> {
        let streaming = StreamingManager::new(&config, Arc::clone(&world), Arc::clone(&registry))?;
        Self::assemble(config, registry, world, backend, streaming)
    }

    /// Like [`Engine::new`] but meshing through `builder`.
    pub fn with_builder(
        config: EngineConfig,
        registry: Arc<BlockRegistry>,
        world: Arc<World>,
        backend: B,
        builder: Arc<dyn ChunkBuilder>,
    ) -> Result<Self, EngineError> {
        let streaming = StreamingManager::with_builder(
            &config,
            Arc::clone(&world),
            Arc::clone(&registry),
            builder,
        )?;
        Self::assemble(config, registry, world, backend, streaming)
    }

    fn assemble(
        config: EngineConfig,
        registry: Arc<BlockRegistry>,
        world: Arc<World>,
        mut backend: B,
        streaming: StreamingManager,
    ) -> Result<Self, EngineError> {
        if config.quads_per_buffer() != config.max_quads {
            log::warn!(
                "max_quads {} limited to {} by the u16 index buffer",
                config.max_quads,
                config.quads_per_buffer()
            );
        }
        let index = QuadIndex::new(&mut backend, config.quads_per_buffer())?;
        let culler = VisibilityCuller::new(config.skip_near_far);
        log::info!(
            "engine up: radius {} chunks, {} workers, batch {}, {} quads per buffer",
            config.render_radius,
            config.workers,
            config.batch_capacity,
            index.max_quads()
        );
        Ok(Self {
            cfg: config,
            world,
            registry,
            backend,
            streaming,
            index,
            culler,
            frame: 0,
            shut_down: false,
        })
    }

    /// Streams around the camera, then draws every visible chunk.
    pub fn render(&mut self, camera: &FlyCamera) -> Result<FrameStats, EngineError> {
        if self.shut_down {
            return Err(EngineError::ShutDown);
        }
        self.frame += 1;
        self.streaming.update(&mut self.backend, camera.chunk())?;

        let view_proj = camera.view_proj();
        let frustum = strata_geom::Frustum::from_view_proj(&view_proj);
        self.backend.begin_frame(&view_proj);
        let draw = self
            .streaming
            .table()
            .draw(&mut self.backend, &self.index, &frustum, &self.culler);
        self.backend.end_frame();

        Ok(FrameStats {
            frame: self.frame,
            table_chunks: self.streaming.table().len(),
            visible_chunks: draw.visible_chunks,
            culled_chunks: draw.culled_chunks,
            draw_calls: draw.draw_calls,
            quads: draw.quads,
            pending_dirty: self.streaming.pending_dirty(),
            pending_updates: self.streaming.pending_updates(),
            building: self.streaming.is_building(),
        })
    }

    /// Dirty-propagates an edit made behind the engine's back.
    pub fn notify_edit(&self, x: i32, y: i32, z: i32) {
        self.world.mark_block_dirty(x, y, z);
    }

    #[inline]
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockId {
        self.world.get(x, y, z)
    }

    /// Returns false outside the world.
    pub fn set_block(&self, x: i32, y: i32, z: i32, id: BlockId) -> bool {
        self.world.set(x, y, z, id)
    }

    /// Waits for the batch in flight and releases every GPU resource. Further renders fail.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.streaming.shutdown(&mut self.backend);
        self.index.dispose(&mut self.backend);
        log::info!("engine shut down after {} frames", self.frame);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn streaming(&self) -> &StreamingManager {
        &self.streaming
    }

    pub fn streaming_stats(&self) -> StreamingStats {
        self.streaming.stats()
    }

    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.streaming.scheduler().stats()
    }

    /// Quads per vertex buffer, as covered by the shared index buffer.
    pub fn max_quads(&self) -> usize {
        self.index.max_quads()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

impl<B: GpuBackend> Drop for Engine<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
