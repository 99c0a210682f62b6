//! Coalescing redraw request flag.

/// Pending-redraw flag owned by the rendering context.
///
/// Requests are idempotent: any number of requests between two renders
/// yield a single render.
#[derive(Debug, Clone, Default)]
pub struct RedrawSignal {
    pending: bool,
    /// Requests received since the last render, for diagnostics.
    coalesced: u32,
}

impl RedrawSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a redraw.
    ///
    /// Returns true if this request armed the flag, false if a redraw was
    /// already pending.
    pub fn request(&mut self) -> bool {
        self.coalesced = self.coalesced.saturating_add(1);
        !std::mem::replace(&mut self.pending, true)
    }

    /// Check if a redraw is pending.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending request. Returns true if a render should happen now.
    pub fn take(&mut self) -> bool {
        if self.pending {
            log::trace!("Redraw taken ({} requests coalesced)", self.coalesced);
        }
        self.coalesced = 0;
        std::mem::take(&mut self.pending)
    }
}
