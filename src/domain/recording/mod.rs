//! Recording domain - durations and the segment schedule

pub mod duration;
pub mod schedule;

pub use duration::Duration;
pub use schedule::{ScheduleError, SegmentSchedule};
