//! Frame pacing for the interactive front end.
//!
//! The simulation advances one tick per presented frame, so the field's speed
//! follows the frame rate. [`FramePacer`] keeps that rate at the configured
//! target by sleeping out the remainder of each frame interval.
//!
//! # Example
//!
//! ```ignore
//! let mut pacer = FramePacer::new(60);
//!
//! // In the frame loop:
//! pacer.wait();
//! engine.advance();
//! ```

use std::time::{Duration, Instant};

/// Sleeps each frame up to a fixed interval and measures the achieved rate.
#[derive(Debug)]
pub struct FramePacer {
    /// Target time between frames.
    frame_interval: Duration,
    /// When the last frame was released.
    last_frame: Instant,
    /// Total frames since start.
    frame_count: u64,
    /// Measured FPS (updated periodically).
    fps: f32,
    /// Frame count at last FPS update.
    fps_frame_count: u64,
    /// Time of last FPS calculation.
    fps_update_time: Instant,
    /// How often to update FPS calculation.
    fps_update_interval: Duration,
}

impl FramePacer {
    /// Pace to `target_fps` frames per second (clamped to at least 1).
    pub fn new(target_fps: u32) -> Self {
        let now = Instant::now();
        Self {
            frame_interval: Duration::from_micros(1_000_000 / u64::from(target_fps.max(1))),
            last_frame: now,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Block until one frame interval has passed since the previous frame.
    ///
    /// Returns the freshly measured FPS when a measurement window closed
    /// on this frame.
    pub fn wait(&mut self) -> Option<f32> {
        let now = Instant::now();
        let deadline = self.deadline();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        self.record_frame(Instant::now())
    }

    /// When the next frame may start.
    #[inline]
    pub fn deadline(&self) -> Instant {
        self.last_frame + self.frame_interval
    }

    /// Mark a frame as released at `now`.
    pub fn record_frame(&mut self, now: Instant) -> Option<f32> {
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.saturating_duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
            return Some(self.fps);
        }
        None
    }

    #[inline]
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Last measured frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_from_target() {
        assert_eq!(FramePacer::new(60).frame_interval(), Duration::from_micros(16_666));
        assert_eq!(FramePacer::new(1).frame_interval(), Duration::from_secs(1));
        // Zero is clamped instead of dividing by zero
        assert_eq!(FramePacer::new(0).frame_interval(), Duration::from_secs(1));
    }

    #[test]
    fn wait_sleeps_out_the_interval() {
        let mut pacer = FramePacer::new(100);
        pacer.wait();
        let start = Instant::now();
        pacer.wait();
        assert!(start.elapsed() >= Duration::from_millis(9));
        assert_eq!(pacer.frame(), 2);
    }

    #[test]
    fn fps_is_measured_over_half_second_windows() {
        let mut pacer = FramePacer::new(60);
        let start = pacer.fps_update_time;

        for i in 1..30 {
            let at = start + Duration::from_millis(i * 10);
            assert_eq!(pacer.record_frame(at), None);
        }
        let fps = pacer
            .record_frame(start + Duration::from_millis(500))
            .expect("window should close at 500ms");
        assert!((fps - 60.0).abs() < 0.01, "fps {fps}");
        assert_eq!(pacer.fps(), fps);
        assert_eq!(pacer.frame(), 30);
    }

    #[test]
    fn deadline_follows_last_frame() {
        let mut pacer = FramePacer::new(50);
        let at = Instant::now() + Duration::from_secs(1);
        pacer.record_frame(at);
        assert_eq!(pacer.deadline(), at + Duration::from_millis(20));
    }
}
