use crossbeam_channel::{Receiver, Sender, bounded};
use strata_mesh_cpu::MeshPacket;
use strata_world::ChunkCoord;

/// Fixed-capacity array of packets handed to the workers as one unit.
pub struct PacketBatch {
    packets: Vec<MeshPacket>,
    len: usize,
}

impl PacketBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            packets: (0..capacity).map(|_| MeshPacket::default()).collect(),
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.packets.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Assigns `coords` to the leading packets, keeping their stream capacity.
    /// The caller guarantees `coords.len() <= capacity()`.
    pub(crate) fn assign(&mut self, coords: &[ChunkCoord]) {
        self.len = coords.len().min(self.packets.len());
        for (packet, &c) in self.packets.iter_mut().zip(coords) {
            packet.reset(c);
        }
    }

    #[inline]
    pub fn packets(&self) -> &[MeshPacket] {
        &self.packets[..self.len]
    }

    #[inline]
    pub(crate) fn packets_mut(&mut self) -> &mut [MeshPacket] {
        &mut self.packets[..self.len]
    }

    pub(crate) fn clear_geometry(&mut self) {
        for p in self.packets_mut() {
            p.clear_geometry();
        }
    }
}

/// Lock-free free list of packet batches; batches are allocated once up front.
pub struct PacketPool {
    available_tx: Sender<PacketBatch>,
    available_rx: Receiver<PacketBatch>,
    batch_capacity: usize,
    batches: usize,
}

impl PacketPool {
    pub fn new(batches: usize, batch_capacity: usize) -> Self {
        let batches = batches.max(1);
        let (tx, rx) = bounded(batches);
        for _ in 0..batches {
            let _ = tx.send(PacketBatch::with_capacity(batch_capacity));
        }
        Self {
            available_tx: tx,
            available_rx: rx,
            batch_capacity,
            batches,
        }
    }

    /// Two batches: one being built while the other is merged.
    pub fn double_buffered(batch_capacity: usize) -> Self {
        Self::new(2, batch_capacity)
    }

    pub fn try_acquire(&self) -> Option<PacketBatch> {
        self.available_rx.try_recv().ok()
    }

    pub fn release(&self, mut batch: PacketBatch) {
        batch.len = 0;
        if self.available_tx.try_send(batch).is_err() {
            log::error!("packet pool overflow: batch released twice");
        }
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.available_rx.len()
    }

    #[inline]
    pub fn batch_capacity(&self) -> usize {
        self.batch_capacity
    }

    #[inline]
    pub fn batches(&self) -> usize {
        self.batches
    }
}
