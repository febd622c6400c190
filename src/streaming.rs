//! Keeps chunk geometry resident around the camera: dirty-driven rebuilds, ring scans and
//! eviction, with at most one mesh batch in flight.

use std::collections::VecDeque;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use strata_blocks::BlockRegistry;
use strata_mesh_cpu::Face;
use strata_render::{GpuBackend, GpuError, RenderTable};
use strata_runtime::{AsyncBuildScheduler, ChunkBuilder, SchedulerError};
use strata_world::{ChunkCoord, World};

use crate::config::EngineConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    pub batches: usize,
    pub uploaded: usize,
    pub stale: usize,
    pub evicted: usize,
    pub rescans: usize,
}

pub struct StreamingManager {
    world: Arc<World>,
    scheduler: AsyncBuildScheduler,
    table: RenderTable,
    dirty_rx: Receiver<ChunkCoord>,
    dirty: VecDeque<ChunkCoord>,
    updates: VecDeque<ChunkCoord>,
    center: Option<ChunkCoord>,
    radius: i32,
    max_quads: usize,
    batch: Vec<ChunkCoord>,
    stats: StreamingStats,
}

impl StreamingManager {
    pub fn new(
        cfg: &EngineConfig,
        world: Arc<World>,
        reg: Arc<BlockRegistry>,
    ) -> Result<Self, SchedulerError> {
        let scheduler = AsyncBuildScheduler::new(cfg.scheduler(), Arc::clone(&world), reg)?;
        Ok(Self::with_scheduler(cfg, world, scheduler))
    }

    /// Streams with a custom chunk builder in place of the CPU mesher.
    pub fn with_builder(
        cfg: &EngineConfig,
        world: Arc<World>,
        reg: Arc<BlockRegistry>,
        builder: Arc<dyn ChunkBuilder>,
    ) -> Result<Self, SchedulerError> {
        let scheduler =
            AsyncBuildScheduler::with_builder(cfg.scheduler(), Arc::clone(&world), reg, builder)?;
        Ok(Self::with_scheduler(cfg, world, scheduler))
    }

    fn with_scheduler(cfg: &EngineConfig, world: Arc<World>, scheduler: AsyncBuildScheduler) -> Self {
        let dirty_rx = world.dirty_events();
        let batch = Vec::with_capacity(scheduler.batch_capacity());
        Self {
            world,
            scheduler,
            table: RenderTable::new(),
            dirty_rx,
            dirty: VecDeque::new(),
            updates: VecDeque::new(),
            center: None,
            radius: cfg.render_radius.max(0),
            max_quads: cfg.quads_per_buffer(),
            batch,
            stats: StreamingStats::default(),
        }
    }

    #[inline]
    pub fn table(&self) -> &RenderTable {
        &self.table
    }

    #[inline]
    pub fn radius(&self) -> i32 {
        self.radius
    }

    #[inline]
    pub fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    pub fn pending_dirty(&self) -> usize {
        self.dirty.len()
    }

    pub fn pending_updates(&self) -> usize {
        self.updates.len()
    }

    pub fn is_building(&self) -> bool {
        self.scheduler.is_busy()
    }

    pub fn stats(&self) -> StreamingStats {
        self.stats
    }

    pub fn scheduler(&self) -> &AsyncBuildScheduler {
        &self.scheduler
    }

    /// One frame of streaming around `center`.
    pub fn update(
        &mut self,
        backend: &mut dyn GpuBackend,
        center: ChunkCoord,
    ) -> Result<(), GpuError> {
        let merged = self.merge(backend, center);
        self.drain_dirty();
        if self.center != Some(center) {
            self.rescan(center);
        }
        self.evict(backend, center);
        self.submit_next(center);
        merged
    }

    /// Blocks until the work in flight has finished, then disposes every chunk buffer.
    pub fn shutdown(&mut self, backend: &mut dyn GpuBackend) {
        self.scheduler.wait();
        self.scheduler.discard();
        for c in self.updates.drain(..) {
            if let Some(chunk) = self.world.chunk(c) {
                chunk.reset_new();
            }
        }
        self.dirty.clear();
        let live = self.table.len();
        self.table.dispose_all(backend);
        log::info!("streaming shut down, disposed {live} chunk records");
    }

    fn merge(&mut self, backend: &mut dyn GpuBackend, center: ChunkCoord) -> Result<(), GpuError> {
        let Some(done) = self.scheduler.take() else {
            return Ok(());
        };
        let keep = self.radius + 1;
        let mut result = Ok(());
        for packet in done.packets() {
            if packet.failed {
                continue;
            }
            let Some(chunk) = self.world.chunk(packet.coord) else {
                continue;
            };
            if result.is_err() {
                // Geometry never reached the GPU; build it again once the backend recovers.
                self.world.mark_dirty(packet.coord);
                continue;
            }
            if !chunk.is_safe_to_read() {
                log::warn!("chunk {:?} still building at merge, skipped", packet.coord);
                continue;
            }
            if packet.coord.chebyshev(center) > keep {
                chunk.reset_new();
                self.stats.stale += 1;
                log::debug!("discarded stale build for {:?}", packet.coord);
                continue;
            }
            match self.table.upload(backend, packet, self.max_quads) {
                Ok(()) => self.stats.uploaded += 1,
                Err(e) => {
                    log::error!("upload of chunk {:?} failed: {e}", packet.coord);
                    self.world.mark_dirty(packet.coord);
                    result = Err(e);
                }
            }
        }
        self.scheduler.recycle(done);
        result
    }

    fn drain_dirty(&mut self) {
        self.dirty.extend(self.dirty_rx.try_iter());
    }

    fn rescan(&mut self, center: ChunkCoord) {
        for c in self.updates.drain(..) {
            if let Some(chunk) = self.world.chunk(c) {
                chunk.reset_new();
            }
        }
        for ring in 0..=self.radius {
            center.for_each_in_ring(ring, |c| {
                if !self.world.in_bounds_chunk(c) {
                    return;
                }
                let existed = self.world.chunk_exists(c);
                let Some(chunk) = self.world.ensure_chunk(c) else {
                    return;
                };
                if !existed {
                    // Neighbours meshed while this chunk was missing skipped their faces toward it.
                    for face in Face::ALL {
                        let (dx, dy, dz) = face.delta();
                        let n = c.offset(dx, dy, dz);
                        let meshed = self
                            .world
                            .chunk(n)
                            .is_some_and(|nc| nc.build_count() > 0 || !nc.is_safe_to_read());
                        if meshed {
                            self.world.mark_dirty(n);
                        }
                    }
                }
                if chunk.take_new() {
                    self.updates.push_back(c);
                }
            });
        }
        log::debug!(
            "rescan around {center:?}: {} chunks queued",
            self.updates.len()
        );
        self.center = Some(center);
        self.stats.rescans += 1;
    }

    fn evict(&mut self, backend: &mut dyn GpuBackend, center: ChunkCoord) {
        let keep = self.radius + 1;
        let evicted = self
            .table
            .evict_where(backend, |c| c.chebyshev(center) > keep);
        for &c in &evicted {
            // In-flight chunks are reset when their stale result is merged.
            if let Some(chunk) = self.world.chunk(c).filter(|ch| ch.is_safe_to_read()) {
                chunk.reset_new();
            }
        }
        if !evicted.is_empty() {
            log::debug!("evicted {} chunks", evicted.len());
            self.stats.evicted += evicted.len();
        }
    }

    fn submit_next(&mut self, center: ChunkCoord) {
        if self.scheduler.is_busy() {
            return;
        }
        let capacity = self.scheduler.batch_capacity();
        let keep = self.radius + 1;
        self.batch.clear();
        while self.batch.len() < capacity {
            let Some(c) = self.dirty.pop_front() else {
                break;
            };
            let Some(chunk) = self.world.chunk(c) else {
                continue;
            };
            if !chunk.take_dirty() {
                continue;
            }
            if c.chebyshev(center) > keep {
                chunk.reset_new();
                continue;
            }
            chunk.take_new();
            if !self.batch.contains(&c) {
                self.batch.push(c);
            }
        }
        while self.batch.len() < capacity {
            let Some(c) = self.updates.pop_front() else {
                break;
            };
            if !self.batch.contains(&c) {
                self.batch.push(c);
            }
        }
        if self.batch.is_empty() {
            return;
        }
        match self.scheduler.submit(&self.batch) {
            Ok(()) => self.stats.batches += 1,
            Err(e) => {
                log::warn!("batch of {} chunks not submitted: {e}", self.batch.len());
                for &c in self.batch.iter().rev() {
                    self.updates.push_front(c);
                }
            }
        }
    }
}
