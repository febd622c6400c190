//! Runtime mesh scheduling: one batch of chunk builds in flight on a rayon pool.
#![forbid(unsafe_code)]

mod packet_pool;

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use strata_blocks::BlockRegistry;
use strata_mesh_cpu::{ChunkMesher, MeshPacket};
use strata_world::{ChunkCoord, World};

pub use crate::packet_pool::{PacketBatch, PacketPool};

/// Fills one packet from the world; implemented by the CPU mesher.
pub trait ChunkBuilder: Send + Sync {
    fn build_chunk(
        &self,
        world: &World,
        reg: &BlockRegistry,
        coord: ChunkCoord,
        packet: &mut MeshPacket,
    ) -> usize;
}

impl ChunkBuilder for ChunkMesher {
    fn build_chunk(
        &self,
        world: &World,
        reg: &BlockRegistry,
        coord: ChunkCoord,
        packet: &mut MeshPacket,
    ) -> usize {
        ChunkMesher::build(world, reg, coord, packet)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub workers: usize,
    pub batch_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            batch_capacity: 8,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("failed to start mesh worker pool: {0}")]
    Pool(#[from] ThreadPoolBuildError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("a batch is already outstanding")]
    Busy,
    #[error("batch of {len} chunks exceeds capacity {capacity}")]
    TooLarge { len: usize, capacity: usize },
    #[error("no free packet batch")]
    NoFreeBatch,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Chunks handed to workers.
    pub submitted: usize,
    /// Chunks whose build finished without panicking.
    pub completed: usize,
    pub failed: usize,
    /// Chunks whose results were dropped unread.
    pub discarded: usize,
}

#[derive(Default)]
struct Counters {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    discarded: AtomicUsize,
}

/// A finished batch, owned by the consumer until it is recycled.
pub struct CompletedBatch {
    batch: PacketBatch,
}

impl CompletedBatch {
    #[inline]
    pub fn packets(&self) -> &[MeshPacket] {
        self.batch.packets()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    pub fn failed(&self) -> usize {
        self.packets().iter().filter(|p| p.failed).count()
    }
}

/// Builds chunk meshes off the main thread, one batch at a time.
///
/// The main thread submits, polls with [`is_done`](Self::is_done) and never blocks. Each chunk's
/// safe-to-read flag is cleared on submit and published by the worker once its packet is written.
pub struct AsyncBuildScheduler {
    world: Arc<World>,
    reg: Arc<BlockRegistry>,
    builder: Arc<dyn ChunkBuilder>,
    pool: ThreadPool,
    packets: PacketPool,
    result_tx: Sender<PacketBatch>,
    result_rx: Receiver<PacketBatch>,
    in_flight: bool,
    ready: Option<PacketBatch>,
    discard_pending: bool,
    counters: Arc<Counters>,
}

impl AsyncBuildScheduler {
    pub fn new(
        cfg: SchedulerConfig,
        world: Arc<World>,
        reg: Arc<BlockRegistry>,
    ) -> Result<Self, SchedulerError> {
        Self::with_builder(cfg, world, reg, Arc::new(ChunkMesher))
    }

    pub fn with_builder(
        cfg: SchedulerConfig,
        world: Arc<World>,
        reg: Arc<BlockRegistry>,
        builder: Arc<dyn ChunkBuilder>,
    ) -> Result<Self, SchedulerError> {
        let workers = cfg.workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("strata-mesh-{i}"))
            .build()?;
        let (result_tx, result_rx) = unbounded();
        log::info!(
            "mesh scheduler: {} workers, batch capacity {}",
            workers,
            cfg.batch_capacity
        );
        Ok(Self {
            world,
            reg,
            builder,
            pool,
            packets: PacketPool::double_buffered(cfg.batch_capacity.max(1)),
            result_tx,
            result_rx,
            in_flight: false,
            ready: None,
            discard_pending: false,
            counters: Arc::new(Counters::default()),
        })
    }

    #[inline]
    pub fn batch_capacity(&self) -> usize {
        self.packets.batch_capacity()
    }

    /// True while a batch is in flight or a completed one has not been taken.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.in_flight || self.ready.is_some()
    }

    pub fn submit(&mut self, coords: &[ChunkCoord]) -> Result<(), SubmitError> {
        if self.is_busy() {
            return Err(SubmitError::Busy);
        }
        let capacity = self.batch_capacity();
        if coords.len() > capacity {
            return Err(SubmitError::TooLarge {
                len: coords.len(),
                capacity,
            });
        }
        let mut batch = self.packets.try_acquire().ok_or(SubmitError::NoFreeBatch)?;
        batch.assign(coords);
        for &c in coords {
            if let Some(chunk) = self.world.chunk(c) {
                chunk.begin_build();
            }
        }
        self.counters
            .submitted
            .fetch_add(coords.len(), Ordering::Relaxed);
        self.in_flight = true;

        let world = Arc::clone(&self.world);
        let reg = Arc::clone(&self.reg);
        let builder = Arc::clone(&self.builder);
        let counters = Arc::clone(&self.counters);
        let tx = self.result_tx.clone();
        log::debug!("submitting batch of {} chunks", coords.len());
        self.pool.spawn(move || {
            batch
                .packets_mut()
                .par_iter_mut()
                .for_each(|packet| build_packet(builder.as_ref(), &world, &reg, &counters, packet));
            let _ = tx.send(batch);
        });
        Ok(())
    }

    /// Non-blocking poll for the in-flight batch.
    pub fn is_done(&mut self) -> bool {
        if self.ready.is_some() {
            return true;
        }
        if !self.in_flight {
            return false;
        }
        match self.result_rx.try_recv() {
            Ok(batch) => {
                self.receive(batch);
                self.ready.is_some()
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                log::error!("mesh result channel disconnected");
                self.in_flight = false;
                false
            }
        }
    }

    /// Blocks until the in-flight batch (if any) has arrived. Used on shutdown and in tests.
    pub fn wait(&mut self) -> bool {
        if self.in_flight {
            match self.result_rx.recv() {
                Ok(batch) => self.receive(batch),
                Err(_) => self.in_flight = false,
            }
        }
        self.ready.is_some()
    }

    fn receive(&mut self, batch: PacketBatch) {
        self.in_flight = false;
        if std::mem::take(&mut self.discard_pending) {
            self.discard_batch(batch);
        } else {
            self.ready = Some(batch);
        }
    }

    /// Consumes the completed result, if there is one.
    pub fn take(&mut self) -> Option<CompletedBatch> {
        if !self.is_done() {
            return None;
        }
        self.ready.take().map(|batch| CompletedBatch { batch })
    }

    /// Drops the pending result without reading it. If the batch is still being built, the
    /// discard is applied once it arrives.
    pub fn discard(&mut self) {
        if let Some(batch) = self.ready.take() {
            self.discard_batch(batch);
        } else if self.in_flight {
            self.discard_pending = true;
        }
    }

    fn discard_batch(&mut self, mut batch: PacketBatch) {
        for packet in batch.packets() {
            if let Some(chunk) = self.world.chunk(packet.coord) {
                chunk.reset_new();
            }
        }
        self.counters
            .discarded
            .fetch_add(batch.len(), Ordering::Relaxed);
        log::debug!("discarded batch of {} chunks", batch.len());
        batch.clear_geometry();
        self.packets.release(batch);
    }

    /// Returns a consumed batch's packet array to the pool.
    pub fn recycle(&mut self, done: CompletedBatch) {
        self.packets.release(done.batch);
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
        }
    }
}

fn build_packet(
    builder: &dyn ChunkBuilder,
    world: &World,
    reg: &BlockRegistry,
    counters: &Counters,
    packet: &mut MeshPacket,
) {
    let coord = packet.coord;
    let result = catch_unwind(AssertUnwindSafe(|| {
        builder.build_chunk(world, reg, coord, packet)
    }));
    let chunk = world.chunk(coord);
    match result {
        Ok(_) => {
            counters.completed.fetch_add(1, Ordering::Relaxed);
            if let Some(chunk) = chunk {
                chunk.publish_build();
            }
        }
        Err(payload) => {
            log::error!(
                "mesh build for chunk {:?} panicked: {}",
                coord,
                panic_message(payload.as_ref())
            );
            counters.failed.fetch_add(1, Ordering::Relaxed);
            packet.clear_geometry();
            packet.failed = true;
            if let Some(chunk) = chunk {
                chunk.abort_build();
            }
            world.mark_dirty(coord);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
