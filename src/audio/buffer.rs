//! Latest-wins frame slot shared by the audio callback and the render loop.
//!
//! Triple-buffered: the writer fills a private back slot and swaps it into
//! the shared middle position; the reader swaps the middle slot into its
//! private front slot when a fresh frame is waiting. Neither side blocks,
//! and a frame is only ever visible once fully written.
//!
//! # Safety
//!
//! Sound as long as there is exactly one `FrameWriter` and one `FrameReader`,
//! which `channel()` guarantees (neither handle is `Clone`).

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use super::frame::{fit_into, AudioFrame, FrameFit};

const INDEX_MASK: u8 = 0b011;
const FRESH_BIT: u8 = 0b100;

struct Shared {
    slots: [UnsafeCell<Box<[f32]>>; 3],
    /// Index of the middle slot, plus FRESH_BIT when unread
    middle: AtomicU8,
    published: AtomicU64,
    sample_rate_hz: u32,
}

// Safety: each slot is touched by at most one side at a time; ownership
// of the middle slot changes hands only through the atomic swap.
unsafe impl Send for Shared {}
unsafe impl Sync for Shared {}

/// Create a frame slot holding silence of `chunk_size` samples.
pub fn channel(chunk_size: usize, sample_rate_hz: u32) -> (FrameWriter, FrameReader) {
    let slot = || UnsafeCell::new(vec![0.0f32; chunk_size].into_boxed_slice());
    let shared = Arc::new(Shared {
        slots: [slot(), slot(), slot()],
        middle: AtomicU8::new(1),
        published: AtomicU64::new(0),
        sample_rate_hz,
    });

    (
        FrameWriter {
            shared: Arc::clone(&shared),
            back: 2,
        },
        FrameReader { shared, front: 0 },
    )
}

/// Write side, owned by the capture callback
pub struct FrameWriter {
    shared: Arc<Shared>,
    back: u8,
}

impl FrameWriter {
    /// Replace the stored frame with `samples`, fitted to the chunk size.
    ///
    /// Wait-free and allocation-free. Any frame not yet read is dropped.
    pub fn publish(&mut self, samples: &[f32]) -> FrameFit {
        // Safety: the back slot is never reachable by the reader
        let slot = unsafe { &mut *self.shared.slots[self.back as usize].get() };
        let fit = fit_into(slot, samples);

        let previous = self
            .shared
            .middle
            .swap(self.back | FRESH_BIT, Ordering::AcqRel);
        self.back = previous & INDEX_MASK;
        self.shared.published.fetch_add(1, Ordering::Relaxed);

        fit
    }

    pub fn chunk_size(&self) -> usize {
        // Safety: own slot, length never changes
        unsafe { (&*self.shared.slots[self.back as usize].get()).len() }
    }
}

/// Read side, owned by the render loop
pub struct FrameReader {
    shared: Arc<Shared>,
    front: u8,
}

impl FrameReader {
    /// Copy of the most recently published frame (silence before the first publish)
    pub fn snapshot(&mut self) -> AudioFrame {
        self.acquire_latest();

        // Safety: the front slot is never reachable by the writer
        let slot = unsafe { &*self.shared.slots[self.front as usize].get() };
        AudioFrame::from_samples(slot, slot.len(), self.shared.sample_rate_hz)
    }

    /// Total frames published so far (including ones superseded before being read)
    pub fn published(&self) -> u64 {
        self.shared.published.load(Ordering::Relaxed)
    }

    fn acquire_latest(&mut self) {
        if self.shared.middle.load(Ordering::Relaxed) & FRESH_BIT == 0 {
            return;
        }
        let previous = self.shared.middle.swap(self.front, Ordering::AcqRel);
        self.front = previous & INDEX_MASK;
    }
}
