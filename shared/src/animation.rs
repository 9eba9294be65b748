use crate::data::{Domain, Snapshot, blend_snapshots, snapshots_equal};
use crate::frame::{FrameHandle, FrameScheduler};

/// Cubic ease-out: decelerating to zero velocity.
pub fn cubic_ease_out(t: f64) -> f64 {
    let t = t - 1.0;
    t * t * t + 1.0
}

/// What the host should do after a frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTick {
    /// Nothing was animating; no redraw needed.
    Idle,
    /// Redraw; another frame has been requested.
    Animating,
    /// Redraw one last time at the target values.
    Converged,
}

/// Tweens fill values from the displayed snapshot to a new target.
///
/// Converged: `previous == target` and progress is 1. Animating: progress runs from 0 to 1
/// over `duration_ms` with cubic ease-out, one step per frame callback.
#[derive(Debug, Clone)]
pub struct AnimationDriver {
    previous: Snapshot,
    target: Snapshot,
    previous_domain: Domain,
    target_domain: Domain,
    progress: f64,
    start_ms: Option<f64>,
    duration_ms: f64,
    pending: Option<FrameHandle>,
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self {
            previous: Snapshot::new(),
            target: Snapshot::new(),
            previous_domain: Domain::FALLBACK,
            target_domain: Domain::FALLBACK,
            progress: 1.0,
            start_ms: None,
            duration_ms: 0.0,
            pending: None,
        }
    }
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a new snapshot. Returns true when an animation was started.
    pub fn update(
        &mut self,
        snapshot: Snapshot,
        enabled: bool,
        duration_ms: f64,
        scheduler: &mut dyn FrameScheduler,
    ) -> bool {
        self.cancel(scheduler);
        let domain = Domain::from_values(snapshot.values().copied());

        if !enabled || snapshots_equal(&self.target, &snapshot) {
            self.converge_to(snapshot, domain);
            return false;
        }

        let (previous, previous_domain) = if self.target.is_empty() {
            (snapshot.clone(), domain)
        } else {
            (self.frame_snapshot(), self.frame_domain())
        };
        if self.is_animating() {
            tracing::debug!(
                progress = self.progress,
                "value animation interrupted; restarting from displayed values"
            );
        }

        self.previous = previous;
        self.previous_domain = previous_domain;
        self.target = snapshot;
        self.target_domain = domain;
        self.progress = 0.0;
        self.start_ms = None;
        self.duration_ms = duration_ms;
        self.pending = scheduler.request_frame();
        if self.pending.is_none() {
            tracing::warn!("frame request refused; jumping to target values");
            self.settle();
            return false;
        }
        tracing::debug!(
            regions = self.target.len(),
            duration_ms,
            "value animation started"
        );
        true
    }

    /// Advance from a frame callback.
    pub fn on_frame(
        &mut self,
        timestamp_ms: f64,
        scheduler: &mut dyn FrameScheduler,
    ) -> FrameTick {
        self.pending = None;
        if !self.is_animating() {
            return FrameTick::Idle;
        }

        let start = *self.start_ms.get_or_insert(timestamp_ms);
        let raw = if self.duration_ms <= 0.0 {
            1.0
        } else {
            ((timestamp_ms - start) / self.duration_ms).clamp(0.0, 1.0)
        };
        self.progress = cubic_ease_out(raw);

        if raw < 1.0 {
            self.pending = scheduler.request_frame();
            if self.pending.is_some() {
                tracing::trace!(progress = self.progress, "animation frame");
                return FrameTick::Animating;
            }
            tracing::warn!(
                progress = self.progress,
                "frame request refused; jumping to target values"
            );
        }
        self.settle();
        tracing::debug!("value animation converged");
        FrameTick::Converged
    }

    /// Cancel the pending frame request, if any. Progress is left where it is.
    pub fn cancel(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_frame(handle);
        }
    }

    /// Cancel and jump straight to the target.
    pub fn finish(&mut self, scheduler: &mut dyn FrameScheduler) {
        self.cancel(scheduler);
        self.settle();
    }

    fn settle(&mut self) {
        let target = std::mem::take(&mut self.target);
        let domain = self.target_domain;
        self.converge_to(target, domain);
    }

    fn converge_to(&mut self, snapshot: Snapshot, domain: Domain) {
        self.previous = snapshot.clone();
        self.target = snapshot;
        self.previous_domain = domain;
        self.target_domain = domain;
        self.progress = 1.0;
        self.start_ms = None;
    }

    pub fn is_animating(&self) -> bool {
        self.progress < 1.0
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending.is_some()
    }

    /// Eased progress in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn target(&self) -> &Snapshot {
        &self.target
    }

    /// Value to draw this frame; falls back to the target when there is no previous value.
    pub fn frame_value(&self, id: &str) -> Option<f64> {
        let target = *self.target.get(id)?;
        if !self.is_animating() {
            return Some(target);
        }
        Some(match self.previous.get(id) {
            Some(&prev) => prev + (target - prev) * self.progress,
            None => target,
        })
    }

    pub fn frame_snapshot(&self) -> Snapshot {
        if self.is_animating() {
            blend_snapshots(&self.previous, &self.target, self.progress)
        } else {
            self.target.clone()
        }
    }

    /// Data domain blended by the same progress as the values.
    pub fn frame_domain(&self) -> Domain {
        Domain::lerp(self.previous_domain, self.target_domain, self.progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ManualScheduler;

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-9,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    fn snapshot(pairs: &[(&str, f64)]) -> Snapshot {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn seeded(scheduler: &mut ManualScheduler) -> AnimationDriver {
        let mut driver = AnimationDriver::new();
        driver.update(snapshot(&[("a", 0.0), ("b", 10.0)]), false, 1000.0, scheduler);
        driver
    }

    #[test]
    fn ease_out_endpoints() {
        assert_close(cubic_ease_out(0.0), 0.0);
        assert_close(cubic_ease_out(1.0), 1.0);
        assert_close(cubic_ease_out(0.5), 0.875);
    }

    #[test]
    fn disabled_update_converges_immediately() {
        let mut scheduler = ManualScheduler::new();
        let driver = seeded(&mut scheduler);
        assert!(!driver.is_animating());
        assert!(!scheduler.has_pending());
        assert_eq!(driver.frame_value("b"), Some(10.0));
        assert_eq!(driver.frame_domain(), Domain::new(0.0, 10.0));
    }

    #[test]
    fn equal_snapshot_does_not_animate() {
        let mut scheduler = ManualScheduler::new();
        let mut driver = seeded(&mut scheduler);
        assert!(!driver.update(snapshot(&[("a", 0.0), ("b", 10.0)]), true, 1000.0, &mut scheduler));
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn animation_converges_to_target() {
        let mut scheduler = ManualScheduler::new();
        let mut driver = seeded(&mut scheduler);
        let target = snapshot(&[("a", 100.0), ("b", 10.0)]);
        assert!(driver.update(target, true, 1000.0, &mut scheduler));
        assert_eq!(scheduler.pending().len(), 1);
        assert_eq!(driver.frame_value("a"), Some(0.0));

        scheduler.fire();
        assert_eq!(driver.on_frame(5000.0, &mut scheduler), FrameTick::Animating);
        assert_close(driver.progress(), 0.0);

        scheduler.fire();
        assert_eq!(driver.on_frame(5500.0, &mut scheduler), FrameTick::Animating);
        assert_close(driver.frame_value("a").expect("a"), 87.5);
        let domain = driver.frame_domain();
        assert_close(domain.min, 8.75);
        assert_close(domain.max, 88.75);

        scheduler.fire();
        assert_eq!(driver.on_frame(6000.0, &mut scheduler), FrameTick::Converged);
        assert!(!scheduler.has_pending());
        assert!(!driver.is_animating());
        assert_eq!(driver.frame_value("a"), Some(100.0));
        assert_eq!(driver.frame_domain(), Domain::new(10.0, 100.0));
        assert_eq!(driver.on_frame(6016.0, &mut scheduler), FrameTick::Idle);
    }

    #[test]
    fn new_ids_appear_at_target_value() {
        let mut scheduler = ManualScheduler::new();
        let mut driver = seeded(&mut scheduler);
        driver.update(snapshot(&[("a", 50.0), ("c", 7.0)]), true, 1000.0, &mut scheduler);
        scheduler.fire();
        driver.on_frame(0.0, &mut scheduler);
        scheduler.fire();
        driver.on_frame(250.0, &mut scheduler);
        assert_eq!(driver.frame_value("c"), Some(7.0));
        assert_eq!(driver.frame_value("b"), None);
    }

    #[test]
    fn interruption_restarts_from_displayed_values() {
        let mut scheduler = ManualScheduler::new();
        let mut driver = seeded(&mut scheduler);
        driver.update(snapshot(&[("a", 100.0), ("b", 10.0)]), true, 1000.0, &mut scheduler);
        scheduler.fire();
        driver.on_frame(0.0, &mut scheduler);
        scheduler.fire();
        driver.on_frame(500.0, &mut scheduler);
        let displayed = driver.frame_value("a").expect("a");
        let stale = scheduler.pending()[0];

        driver.update(snapshot(&[("a", 0.0), ("b", 10.0)]), true, 1000.0, &mut scheduler);
        assert!(scheduler.cancelled().contains(&stale));
        assert_eq!(scheduler.pending().len(), 1);
        assert_close(driver.frame_value("a").expect("a"), displayed);
    }

    #[test]
    fn first_data_has_nothing_to_tween_from() {
        let mut scheduler = ManualScheduler::new();
        let mut driver = AnimationDriver::new();
        assert!(driver.update(snapshot(&[("a", 42.0)]), true, 1000.0, &mut scheduler));
        assert_eq!(driver.frame_value("a"), Some(42.0));
        assert_eq!(driver.frame_domain(), Domain::new(42.0, 42.0));
    }

    #[test]
    fn zero_duration_converges_on_first_frame() {
        let mut scheduler = ManualScheduler::new();
        let mut driver = seeded(&mut scheduler);
        driver.update(snapshot(&[("a", 1.0)]), true, 0.0, &mut scheduler);
        scheduler.fire();
        assert_eq!(driver.on_frame(10.0, &mut scheduler), FrameTick::Converged);
        assert_eq!(driver.frame_value("a"), Some(1.0));
    }

    #[test]
    fn cancel_and_finish() {
        let mut scheduler = ManualScheduler::new();
        let mut driver = seeded(&mut scheduler);
        driver.update(snapshot(&[("a", 9.0)]), true, 1000.0, &mut scheduler);
        driver.cancel(&mut scheduler);
        assert!(!scheduler.has_pending());
        assert!(driver.is_animating());

        driver.finish(&mut scheduler);
        assert!(!driver.is_animating());
        assert_eq!(driver.frame_value("a"), Some(9.0));
    }

    struct RefusingScheduler;

    impl FrameScheduler for RefusingScheduler {
        fn request_frame(&mut self) -> Option<FrameHandle> {
            None
        }

        fn cancel_frame(&mut self, _handle: FrameHandle) {}
    }

    #[test]
    fn refused_frame_request_jumps_to_target() {
        let mut scheduler = RefusingScheduler;
        let mut driver = AnimationDriver::new();
        driver.update(snapshot(&[("a", 0.0)]), false, 1000.0, &mut scheduler);

        assert!(!driver.update(snapshot(&[("a", 100.0)]), true, 1000.0, &mut scheduler));
        assert!(!driver.is_animating());
        assert!(!driver.has_pending_frame());
        assert_eq!(driver.frame_value("a"), Some(100.0));
        assert_eq!(driver.frame_domain(), Domain::new(100.0, 100.0));
    }

    #[test]
    fn refused_follow_up_frame_converges() {
        let mut manual = ManualScheduler::new();
        let mut driver = seeded(&mut manual);
        driver.update(snapshot(&[("a", 100.0), ("b", 10.0)]), true, 1000.0, &mut manual);
        manual.fire();

        let mut refusing = RefusingScheduler;
        assert_eq!(driver.on_frame(0.0, &mut refusing), FrameTick::Converged);
        assert!(!driver.is_animating());
        assert_eq!(driver.frame_value("a"), Some(100.0));
        assert_eq!(driver.on_frame(16.0, &mut refusing), FrameTick::Idle);
    }
}
