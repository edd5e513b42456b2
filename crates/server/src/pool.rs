//! Free list of per-connection receive/transmit buffers.
//!
//! Every accepted connection takes a [`BufferPair`] from the pool and gives it back when it
//! closes. A pair is cleared on the way back in, so a connection never observes bytes left
//! behind by the previous owner. Capacity is kept, which is the point: after warm-up the
//! reactor stops allocating per connection.

use bytes::BytesMut;
use tracing::trace;

/// Receive and transmit buffers owned by one connection.
///
/// Not `Clone`: the only way to hand a pair back is to move it into [`BufferPool::release`],
/// so a pair cannot be released twice.
#[derive(Debug)]
pub struct BufferPair {
    pub(crate) rx: BytesMut,
    pub(crate) tx: BytesMut,
}

impl BufferPair {
    fn with_capacity(rx_capacity: usize, tx_capacity: usize) -> Self {
        Self { rx: BytesMut::with_capacity(rx_capacity), tx: BytesMut::with_capacity(tx_capacity) }
    }

    pub fn rx(&self) -> &BytesMut {
        &self.rx
    }

    pub fn tx(&self) -> &BytesMut {
        &self.tx
    }

    pub fn rx_mut(&mut self) -> &mut BytesMut {
        &mut self.rx
    }

    pub fn tx_mut(&mut self) -> &mut BytesMut {
        &mut self.tx
    }

    fn clear(&mut self) {
        self.rx.clear();
        self.tx.clear();
    }
}

/// Single-threaded pool of [`BufferPair`]s.
///
/// The pool never shrinks; the number of pairs it ever creates equals the highest number of
/// connections that were open at the same time.
#[derive(Debug, Default)]
pub struct BufferPool {
    free: Vec<BufferPair>,
    allocated: usize,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a pair with both buffers empty and at least the requested capacities.
    pub fn acquire(&mut self, rx_capacity: usize, tx_capacity: usize) -> BufferPair {
        match self.free.pop() {
            Some(mut pair) => {
                pair.rx.reserve(rx_capacity);
                pair.tx.reserve(tx_capacity);
                pair
            }
            None => {
                self.allocated += 1;
                trace!(allocated = self.allocated, "allocating buffer pair");
                BufferPair::with_capacity(rx_capacity, tx_capacity)
            }
        }
    }

    /// Clears `pair` and puts it back on the free list.
    pub fn release(&mut self, mut pair: BufferPair) {
        pair.clear();
        self.free.push(pair);
    }

    /// Number of pairs waiting on the free list.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Number of pairs this pool has ever allocated.
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Number of pairs currently handed out.
    pub fn in_use(&self) -> usize {
        self.allocated - self.free.len()
    }
}
