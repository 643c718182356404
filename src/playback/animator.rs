//! Avatar animation driven from the UI frame loop
//!
//! The animator never owns a thread or a timer. The UI calls [`AvatarAnimator::tick`]
//! every frame and schedules a repaint after the returned delay, so frame
//! advancement is cooperative and never blocks rendering.

use std::time::{Duration, Instant};

/// Default delay between avatar frames
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct AvatarAnimator {
    frame_count: usize,
    frame_index: usize,
    interval: Duration,
    running: bool,
    last_advance: Option<Instant>,
}

impl AvatarAnimator {
    pub fn new(frame_count: usize, interval: Duration) -> Self {
        Self {
            frame_count: frame_count.max(1),
            frame_index: 0,
            interval,
            running: false,
            last_advance: None,
        }
    }

    /// Start cycling frames; calling this while running is a no-op
    pub fn start(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_advance = Some(now);
    }

    /// Stop cycling and hold the first frame
    pub fn stop(&mut self) {
        self.running = false;
        self.frame_index = 0;
        self.last_advance = None;
    }

    /// Advance the animation if an interval has elapsed
    ///
    /// Returns the delay until the next frame is due, or `None` while idle.
    pub fn tick(&mut self, now: Instant) -> Option<Duration> {
        if !self.running {
            return None;
        }

        let last = *self.last_advance.get_or_insert(now);
        let elapsed = now.saturating_duration_since(last);
        if elapsed >= self.interval {
            // Skip frames that were missed while the window was not repainting
            let steps = (elapsed.as_millis() / self.interval.as_millis().max(1)) as usize;
            self.frame_index = (self.frame_index + steps) % self.frame_count;
            self.last_advance = Some(last + self.interval * steps as u32);
        }

        let since = now.saturating_duration_since(self.last_advance.unwrap_or(now));
        Some(self.interval.saturating_sub(since))
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for AvatarAnimator {
    fn default() -> Self {
        Self::new(1, DEFAULT_FRAME_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(100);

    #[test]
    fn test_idle_animator_holds_first_frame() {
        let mut animator = AvatarAnimator::new(4, TICK);
        let t0 = Instant::now();
        assert_eq!(animator.tick(t0 + TICK * 5), None);
        assert_eq!(animator.frame_index(), 0);
        assert!(!animator.is_running());
    }

    #[test]
    fn test_frames_cycle_while_running() {
        let mut animator = AvatarAnimator::new(3, TICK);
        let t0 = Instant::now();
        animator.start(t0);

        assert_eq!(animator.tick(t0 + Duration::from_millis(50)), Some(Duration::from_millis(50)));
        assert_eq!(animator.frame_index(), 0);

        animator.tick(t0 + TICK);
        assert_eq!(animator.frame_index(), 1);
        animator.tick(t0 + TICK * 2);
        assert_eq!(animator.frame_index(), 2);
        animator.tick(t0 + TICK * 3);
        assert_eq!(animator.frame_index(), 0);
    }

    #[test]
    fn test_missed_frames_are_skipped() {
        let mut animator = AvatarAnimator::new(10, TICK);
        let t0 = Instant::now();
        animator.start(t0);
        animator.tick(t0 + Duration::from_millis(350));
        assert_eq!(animator.frame_index(), 3);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut animator = AvatarAnimator::new(4, TICK);
        let t0 = Instant::now();
        animator.start(t0);
        animator.tick(t0 + TICK);
        animator.start(t0 + TICK + Duration::from_millis(10));
        assert_eq!(animator.frame_index(), 1);
        animator.tick(t0 + TICK * 2);
        assert_eq!(animator.frame_index(), 2);
    }

    #[test]
    fn test_stop_resets_to_first_frame() {
        let mut animator = AvatarAnimator::new(4, TICK);
        let t0 = Instant::now();
        animator.start(t0);
        animator.tick(t0 + TICK * 2);
        assert_eq!(animator.frame_index(), 2);

        animator.stop();
        assert!(!animator.is_running());
        assert_eq!(animator.frame_index(), 0);
        assert_eq!(animator.tick(t0 + TICK * 3), None);
    }

    #[test]
    fn test_single_frame_animation() {
        let mut animator = AvatarAnimator::new(0, TICK);
        assert_eq!(animator.frame_count(), 1);
        let t0 = Instant::now();
        animator.start(t0);
        animator.tick(t0 + TICK * 3);
        assert_eq!(animator.frame_index(), 0);
    }
}
