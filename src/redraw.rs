//! Frame-aligned redraw coalescing.
//!
//! Every state change bumps a revision and asks for a draw. Requests made
//! before the next frame merge into one: the overlay is skipped only if every
//! merged request asked to skip it. When the frame runs, a request whose
//! revision was already painted is dropped, so frames are idempotent.

/// A pending repaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRequest {
    /// Leave the transient overlay layer alone (structure is still recomputed)
    pub skip_overlay: bool,
    /// Paint even if nothing changed since the last frame
    pub force: bool,
}

impl DrawRequest {
    fn merge(self, other: DrawRequest) -> DrawRequest {
        DrawRequest {
            skip_overlay: self.skip_overlay && other.skip_overlay,
            force: self.force || other.force,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RedrawScheduler {
    pending: Option<DrawRequest>,
    revision: u64,
    painted_revision: Option<u64>,
    frames: u64,
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that drawable state changed.
    pub fn invalidate(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Queue a draw. Returns `true` when this is the first request since the
    /// last frame, i.e. the caller should schedule a frame callback.
    pub fn request(&mut self, request: DrawRequest) -> bool {
        match self.pending {
            Some(current) => {
                tracing::trace!("draw request coalesced");
                self.pending = Some(current.merge(request));
                false
            }
            None => {
                self.pending = Some(request);
                true
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of frames actually produced.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Consume the pending request for this frame. Returns `None` when nothing
    /// is pending or when the current revision was already painted and the
    /// request is not forced.
    pub fn take(&mut self) -> Option<DrawRequest> {
        let request = self.pending.take()?;
        if !request.force && self.painted_revision == Some(self.revision) {
            tracing::trace!(revision = self.revision, "frame skipped, nothing changed");
            return None;
        }
        self.painted_revision = Some(self.revision);
        self.frames += 1;
        Some(request)
    }

    /// Drop any pending request and forget what was painted.
    pub fn reset(&mut self) {
        self.pending = None;
        self.painted_revision = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PLAIN: DrawRequest = DrawRequest {
        skip_overlay: false,
        force: false,
    };
    const SKIP: DrawRequest = DrawRequest {
        skip_overlay: true,
        force: false,
    };

    #[test]
    fn test_requests_coalesce_into_one_frame() {
        let mut scheduler = RedrawScheduler::new();
        scheduler.invalidate();
        assert!(scheduler.request(SKIP));
        assert!(!scheduler.request(PLAIN));
        assert!(!scheduler.request(SKIP));
        let request = scheduler.take().unwrap();
        assert!(!request.skip_overlay);
        assert!(scheduler.take().is_none());
        assert_eq!(scheduler.frames(), 1);
    }

    #[test]
    fn test_skip_overlay_survives_when_all_agree() {
        let mut scheduler = RedrawScheduler::new();
        scheduler.invalidate();
        scheduler.request(SKIP);
        scheduler.request(SKIP);
        assert!(scheduler.take().unwrap().skip_overlay);
    }

    #[test]
    fn test_unchanged_revision_is_not_repainted() {
        let mut scheduler = RedrawScheduler::new();
        scheduler.invalidate();
        scheduler.request(PLAIN);
        assert!(scheduler.take().is_some());
        scheduler.request(PLAIN);
        assert!(scheduler.take().is_none());
        scheduler.request(DrawRequest {
            skip_overlay: false,
            force: true,
        });
        assert!(scheduler.take().is_some());
        assert_eq!(scheduler.frames(), 2);
    }
}
