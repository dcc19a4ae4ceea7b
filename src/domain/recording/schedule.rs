//! Segment schedule value object

use thiserror::Error;

use super::duration::Duration;

/// Default interval between segment starts (30s)
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Default length of each recorded segment (33s, giving 3s overlap)
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(33);

/// Default internal buffering granularity (3s)
pub const DEFAULT_CHUNK: Duration = Duration::from_secs(3);

/// Error when a schedule would not produce gapless audio
#[derive(Debug, Clone, Error)]
pub enum ScheduleError {
    #[error("Segment window ({window}) must be longer than the start interval ({interval}) to create overlap")]
    NoOverlap { interval: Duration, window: Duration },

    #[error("Segment timings must be non-zero")]
    Zero,
}

/// Timing of overlapping segment production for one session.
///
/// A new segment starts every `interval`, and each segment records for
/// `window`. The window always exceeds the interval, so consecutive segments
/// overlap and no audio is lost even if a single segment's transcription is
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSchedule {
    interval: Duration,
    window: Duration,
    chunk: Duration,
}

impl SegmentSchedule {
    /// Create a schedule, validating the overlap invariant
    pub fn new(
        interval: Duration,
        window: Duration,
        chunk: Duration,
    ) -> Result<Self, ScheduleError> {
        if interval.as_millis() == 0 || window.as_millis() == 0 || chunk.as_millis() == 0 {
            return Err(ScheduleError::Zero);
        }
        if window <= interval {
            return Err(ScheduleError::NoOverlap { interval, window });
        }
        Ok(Self {
            interval,
            window,
            chunk,
        })
    }

    /// Interval between segment starts
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Recording length of each segment
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Internal buffering granularity
    pub const fn chunk(&self) -> Duration {
        self.chunk
    }

    /// Overlap between consecutive segments
    pub fn overlap(&self) -> Duration {
        Duration::from_millis(self.window.as_millis() - self.interval.as_millis())
    }
}

impl Default for SegmentSchedule {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            window: DEFAULT_WINDOW,
            chunk: DEFAULT_CHUNK,
        }
    }
}
