/// Identifier of a requested animation frame, as returned by `requestAnimationFrame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Source of "call me before the next repaint" callbacks.
///
/// Implementations arrange for the owner's `on_frame` to run once per granted request.
pub trait FrameScheduler {
    /// `None` when the host refused the request (no window, for example).
    fn request_frame(&mut self) -> Option<FrameHandle>;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Deterministic scheduler for headless use: requests queue up until the caller fires them.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: i32,
    pending: Vec<FrameHandle>,
    cancelled: Vec<FrameHandle>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[FrameHandle] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn cancelled(&self) -> &[FrameHandle] {
        &self.cancelled
    }

    /// Drain the queue, as the browser does when it runs frame callbacks.
    pub fn fire(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.pending)
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending.push(handle);
        Some(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.retain(|pending| *pending != handle);
        self.cancelled.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_removes_pending_request() {
        let mut scheduler = ManualScheduler::new();
        let first = scheduler.request_frame().expect("granted");
        let second = scheduler.request_frame().expect("granted");
        assert_ne!(first, second);

        scheduler.cancel_frame(first);
        assert_eq!(scheduler.pending(), &[second]);
        assert_eq!(scheduler.cancelled(), &[first]);
        assert_eq!(scheduler.fire(), vec![second]);
        assert!(!scheduler.has_pending());
    }
}
