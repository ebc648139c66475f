//! Campaign clock. Owns the real-to-game time accumulator, the speed
//! setting and the time-stop flag.
//!
//! The clock never advances the campaign date on its own. It only decides
//! how much game time is available and how that time splits into detection
//! intervals; `CampaignEngine::advance` spends it.

use crate::{
    date::{SimDate, DAYS_PER_YEAR, SECONDS_PER_DAY, SECONDS_PER_HOUR},
    types::GameSeconds,
};
use serde::{Deserialize, Serialize};

/// Longest stretch of game time that may pass between two radar,
/// alien-interest and UFO-movement evaluations.
pub const DETECTION_INTERVAL: GameSeconds = (SECONDS_PER_HOUR / 2) as GameSeconds;

/// Minimum accumulated game time before a frame does any work.
pub const MIN_STEP_SECONDS: f64 = 1.0;

/// Most game time a single frame may bank: one calendar year.
pub const MAX_TIMER_SECONDS: f64 = (SECONDS_PER_DAY as f64) * (DAYS_PER_YEAR as f64);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampaignClock {
    /// Game seconds per real second.
    scale: f64,
    lapse: TimeLapse,
    /// Game seconds accumulated but not yet spent on the date.
    timer: f64,
    time_stop_requested: bool,
}

impl CampaignClock {
    pub fn new(lapse: TimeLapse) -> Self {
        Self {
            scale: lapse.scale(),
            lapse,
            timer: 0.0,
            time_stop_requested: false,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn lapse(&self) -> TimeLapse {
        self.lapse
    }

    pub fn accumulated(&self) -> f64 {
        self.timer
    }

    /// Select one of the preset speeds.
    pub fn set_lapse(&mut self, lapse: TimeLapse) {
        self.lapse = lapse;
        self.scale = lapse.scale();
    }

    /// Set an arbitrary speed. Negative or non-finite values stop time.
    pub fn set_scale(&mut self, scale: f64) {
        debug_assert!(scale.is_finite() && scale >= 0.0, "invalid time scale: {scale}");
        self.scale = if scale.is_finite() && scale > 0.0 { scale } else { 0.0 };
        self.lapse = TimeLapse::closest_to(self.scale);
    }

    pub fn faster(&mut self) {
        self.set_lapse(self.lapse.faster());
    }

    pub fn slower(&mut self) {
        self.set_lapse(self.lapse.slower());
    }

    /// Halt time after the current detection interval. Every following
    /// `advance` does nothing until [`CampaignClock::resume`] is called.
    pub fn request_time_stop(&mut self) {
        self.time_stop_requested = true;
    }

    pub fn resume(&mut self) {
        self.time_stop_requested = false;
    }

    pub fn is_time_stopped(&self) -> bool {
        self.time_stop_requested
    }

    /// Add one frame worth of real time. Returns true once at least one
    /// game second is available.
    pub fn accumulate(&mut self, frame_seconds: f64) -> bool {
        debug_assert!(
            frame_seconds.is_finite() && frame_seconds >= 0.0,
            "invalid frame delta: {frame_seconds}"
        );
        if frame_seconds.is_finite() && frame_seconds > 0.0 {
            self.timer += frame_seconds * self.scale;
        }
        if self.timer.is_nan() || self.timer > MAX_TIMER_SECONDS {
            log::warn!(
                "frame banked {} game seconds, clamped to {MAX_TIMER_SECONDS}",
                self.timer
            );
            self.timer = MAX_TIMER_SECONDS;
        }
        self.timer >= MIN_STEP_SECONDS
    }

    /// Split the whole seconds currently accumulated into detection
    /// intervals, measured from the position of `date` inside its interval.
    pub fn plan(&self, date: &SimDate) -> IntervalPlan {
        let whole_seconds = self.timer.max(0.0).floor() as GameSeconds;
        let offset = date.whole_seconds() % DETECTION_INTERVAL;
        IntervalPlan {
            whole_seconds,
            first_slice: DETECTION_INTERVAL - offset,
            checks: offset.saturating_add(whole_seconds) / DETECTION_INTERVAL,
        }
    }

    /// Remove `seconds` of game time that were spent on the date.
    pub fn consume(&mut self, seconds: GameSeconds) {
        self.timer = (self.timer - seconds as f64).max(0.0);
    }

    /// Drop whatever time is left for this frame.
    pub fn discard(&mut self) {
        self.timer = 0.0;
    }
}

impl Default for CampaignClock {
    fn default() -> Self {
        Self::new(TimeLapse::FiveSeconds)
    }
}

/// How one frame's worth of game time splits into detection intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalPlan {
    /// `floor(accumulated)`: the game seconds this frame may spend.
    pub whole_seconds: GameSeconds,
    /// Seconds from the current date to the next interval boundary.
    pub first_slice: GameSeconds,
    /// Interval boundaries crossed by spending `whole_seconds`.
    pub checks: u64,
}

impl IntervalPlan {
    /// Size of the `index`-th interval slice.
    pub fn slice(&self, index: u64) -> GameSeconds {
        if index == 0 {
            self.first_slice
        } else {
            DETECTION_INTERVAL
        }
    }
}

/// Where the engine is inside one `advance` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockPhase {
    #[default]
    Idle,
    Accumulating,
    DispatchingIntervals,
    DispatchingGranularities,
    PostTick,
}

/// Preset game speeds offered to the player.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TimeLapse {
    Stopped,
    FiveSeconds,
    FiveMinutes,
    TwentyMinutes,
    OneHour,
    TwelveHours,
    OneDay,
    FiveDays,
}

impl TimeLapse {
    pub const ALL: [TimeLapse; 8] = [
        Self::Stopped,
        Self::FiveSeconds,
        Self::FiveMinutes,
        Self::TwentyMinutes,
        Self::OneHour,
        Self::TwelveHours,
        Self::OneDay,
        Self::FiveDays,
    ];

    /// Game seconds per real second.
    pub fn scale(&self) -> f64 {
        match self {
            Self::Stopped       => 0.0,
            Self::FiveSeconds   => 5.0,
            Self::FiveMinutes   => 5.0 * 60.0,
            Self::TwentyMinutes => 20.0 * 60.0,
            Self::OneHour       => 3_600.0,
            Self::TwelveHours   => 12.0 * 3_600.0,
            Self::OneDay        => 24.0 * 3_600.0,
            Self::FiveDays      => 5.0 * 24.0 * 3_600.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Stopped       => "stopped",
            Self::FiveSeconds   => "5 sec",
            Self::FiveMinutes   => "5 mins",
            Self::TwentyMinutes => "20 mins",
            Self::OneHour       => "1 hour",
            Self::TwelveHours   => "12 hours",
            Self::OneDay        => "1 day",
            Self::FiveDays      => "5 days",
        }
    }

    pub fn faster(&self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + 1).min(Self::ALL.len() - 1)]
    }

    pub fn slower(&self) -> Self {
        Self::ALL[self.index().saturating_sub(1)]
    }

    /// Preset whose scale is nearest to `scale`.
    pub fn closest_to(scale: f64) -> Self {
        Self::ALL
            .iter()
            .copied()
            .min_by(|a, b| {
                let da = (a.scale() - scale).abs();
                let db = (b.scale() - scale).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(Self::Stopped)
    }

    /// Parse a label or snake_case name, e.g. `"1 hour"` or `"one_hour"`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| {
            l.label() == s
                || serde_json::to_value(l)
                    .ok()
                    .and_then(|v| v.as_str().map(|name| name == s))
                    .unwrap_or(false)
        })
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|l| l == self).unwrap_or(0)
    }
}
