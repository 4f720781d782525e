use log::debug;
use serde::{Deserialize, Serialize};

use super::imbalance_detector::Verdict;

/// Which channel currently receives a one-sample delay to bring the pair
/// back into alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrectionDirection {
    DelayI,
    #[default]
    None,
    DelayQ,
}

impl CorrectionDirection {
    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            1 => Some(CorrectionDirection::DelayI),
            0 => Some(CorrectionDirection::None),
            -1 => Some(CorrectionDirection::DelayQ),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> i8 {
        match self {
            CorrectionDirection::DelayI => 1,
            CorrectionDirection::None => 0,
            CorrectionDirection::DelayQ => -1,
        }
    }

    /// Next candidate in the search order: None -> DelayI -> DelayQ -> None.
    pub(crate) fn advanced(self) -> Self {
        match self {
            CorrectionDirection::None => CorrectionDirection::DelayI,
            CorrectionDirection::DelayI => CorrectionDirection::DelayQ,
            CorrectionDirection::DelayQ => CorrectionDirection::None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Consecutive misaligned verdicts tolerated before the correction
    /// direction advances.
    pub max_failure_count: u32,
    /// Consecutive aligned verdicts after which the search locks in the
    /// current direction and disables itself.
    pub max_success_count: u32,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            max_failure_count: 5,
            max_success_count: 100,
        }
    }
}

/// Hysteresis state machine for the delay correction. While searching it
/// counts the detector's verdicts; enough failures in a row advance the
/// direction, enough successes lock it in and end the search. Counters
/// never move on a no-signal verdict or while idle.
pub struct CorrectionTracker {
    config: CorrectionConfig,
    searching: bool,
    failure_count: u32,
    success_count: u32,
    direction: CorrectionDirection,
}

impl CorrectionTracker {
    pub fn new(config: CorrectionConfig) -> Self {
        Self {
            config,
            searching: false,
            failure_count: 0,
            success_count: 0,
            direction: CorrectionDirection::None,
        }
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn direction(&self) -> CorrectionDirection {
        self.direction
    }

    pub fn start_auto_detect(&mut self) {
        self.searching = true;
        self.direction = CorrectionDirection::None;
        self.failure_count = 0;
        self.success_count = 0;
    }

    pub fn stop_auto_detect(&mut self) {
        self.searching = false;
        self.direction = CorrectionDirection::None;
    }

    pub fn set_manual(&mut self, direction: CorrectionDirection) {
        self.searching = false;
        self.direction = direction;
    }

    /// Feeds one detector verdict into the search. Returns true when the
    /// correction direction changed, so the caller can discard any carry
    /// state tied to the previous direction.
    pub fn observe(&mut self, verdict: Verdict) -> bool {
        if !self.searching {
            return false;
        }
        match verdict {
            Verdict::NoSignal => false,
            Verdict::Misaligned => {
                self.failure_count += 1;
                if self.failure_count > self.config.max_failure_count {
                    self.direction = self.direction.advanced();
                    self.failure_count = 0;
                    self.success_count = 0;
                    debug!("correction direction advanced to {:?}", self.direction);
                    true
                } else {
                    false
                }
            }
            Verdict::Aligned => {
                self.failure_count = 0;
                self.success_count += 1;
                if self.success_count > self.config.max_success_count {
                    self.searching = false;
                    debug!("auto-detect converged, locking {:?}", self.direction);
                }
                false
            }
        }
    }
}
