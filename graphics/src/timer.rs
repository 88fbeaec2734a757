//! Non-blocking GPU frame timer.

use crate::backend::{GpuBackend, GpuQuery};
use crate::error::GraphicsError;

/// Two query slots used alternately so a frame's timing is read while the
/// next frame is being recorded.
#[derive(Debug)]
pub struct GpuTimer {
    queries: [GpuQuery; 2],
    pending: [bool; 2],
    current: usize,
    active: bool,
    last: Option<u64>,
}

impl GpuTimer {
    pub fn new(backend: &dyn GpuBackend) -> Result<Self, GraphicsError> {
        Ok(Self {
            queries: [backend.create_query()?, backend.create_query()?],
            pending: [false; 2],
            current: 0,
            active: false,
            last: None,
        })
    }

    /// Collect the other slot's result if ready, then start timing this
    /// frame. Returns the most recent result.
    ///
    /// If the current slot still holds an unread result, it is polled once
    /// more; when that is still unavailable this frame goes untimed.
    pub fn begin_frame(&mut self, backend: &dyn GpuBackend) -> Option<u64> {
        let other = 1 - self.current;
        self.collect(backend, other);

        if self.pending[self.current] {
            self.collect(backend, self.current);
        }
        if !self.pending[self.current] {
            backend.begin_query(self.queries[self.current]);
            self.active = true;
        } else {
            log::trace!("GpuTimer: slot {} still pending, frame untimed", self.current);
        }
        self.last
    }

    /// Stop timing and swap slots.
    pub fn end_frame(&mut self, backend: &dyn GpuBackend) {
        if self.active {
            backend.end_query(self.queries[self.current]);
            self.pending[self.current] = true;
            self.active = false;
        }
        self.current = 1 - self.current;
    }

    /// Most recent frame time in nanoseconds.
    pub fn last_result(&self) -> Option<u64> {
        self.last
    }

    fn collect(&mut self, backend: &dyn GpuBackend, slot: usize) {
        if self.pending[slot]
            && let Some(elapsed) = backend.query_result(self.queries[slot])
        {
            self.last = Some(elapsed);
            self.pending[slot] = false;
        }
    }
}
