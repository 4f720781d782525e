use std::any::Any;

use log::debug;
use rustc_hash::FxHashMap;

use crate::config::PreprocessorConfig;
use crate::graph::UpdateContext;
use crate::nodes::correction::{CorrectionDirection, CorrectionTracker};
use crate::nodes::imbalance_detector::ImbalanceDetector;
use crate::spectrum::SpectrumAnalyzer;
use crate::traits::{AudioNode, PortId};
use crate::utils::block_ops::{delay_one, swap_channels};

/// Input conditioning block for a quadrature (I/Q) capture pair.
///
/// The capture hardware can come up with one channel lagging the other by a
/// single sample, which mirrors the complex spectrum and corrupts anything
/// downstream that demodulates it. Per cycle this node:
///
/// 1. delays whichever channel the active correction names by one sample,
///    carrying the displaced sample into the next cycle,
/// 2. while auto-detection is searching, scores the corrected pair's
///    spectral image suppression and feeds the verdict into the hysteresis
///    tracker (a direction change takes effect on the next cycle),
/// 3. optionally swaps the two channels to fix miswired inputs,
/// 4. transmits both blocks downstream.
///
/// If either input block is absent the cycle degrades to a no-op: the block
/// that did arrive is released back to the pool and nothing is transmitted.
///
/// All correction state lives in the node instance; construct one per
/// channel pair. The control surface is not synchronized; wrap calls in
/// external locking if the host drives cycles from another thread.
pub struct IqPreprocessor {
    enabled: bool,
    tracker: CorrectionTracker,
    detector: ImbalanceDetector,
    swap_iq: bool,
    /// Sample displaced off the end of the delayed channel last cycle.
    /// `None` right after a direction change: the first shifted block seeds
    /// it with its own sample 0, so no stale sample from another channel
    /// ever leaks in.
    carry: Option<i16>,
}

impl IqPreprocessor {
    pub fn new(config: PreprocessorConfig) -> Self {
        Self {
            enabled: true,
            tracker: CorrectionTracker::new(config.correction),
            detector: ImbalanceDetector::new(config.detector),
            swap_iq: false,
            carry: None,
        }
    }

    /// Builds the node around an externally supplied spectral transform.
    pub fn with_analyzer(config: PreprocessorConfig, analyzer: Box<dyn SpectrumAnalyzer>) -> Self {
        Self {
            enabled: true,
            tracker: CorrectionTracker::new(config.correction),
            detector: ImbalanceDetector::with_analyzer(config.detector, analyzer),
            swap_iq: false,
            carry: None,
        }
    }

    /// Enables automatic detection and correction of the channel lag.
    /// Any active correction is cleared and the search starts over.
    pub fn start_auto_detect(&mut self) {
        self.tracker.start_auto_detect();
        self.carry = None;
    }

    /// Disables the automatic search and reverts to no correction.
    pub fn stop_auto_detect(&mut self) {
        self.tracker.stop_auto_detect();
        self.carry = None;
    }

    /// Whether the automatic search is currently running.
    pub fn auto_detect_status(&self) -> bool {
        self.tracker.is_searching()
    }

    /// Forces a correction direction and cancels auto-detection.
    pub fn set_manual_correction(&mut self, direction: CorrectionDirection) {
        debug!("manual correction set to {:?}", direction);
        self.tracker.set_manual(direction);
        self.carry = None;
    }

    pub fn manual_correction(&self) -> CorrectionDirection {
        self.tracker.direction()
    }

    /// Exchanges the I and Q channels on output, for capture paths wired
    /// with the two inputs reversed. Independent of the delay correction.
    pub fn set_swap(&mut self, swap: bool) {
        self.swap_iq = swap;
    }

    pub fn swap(&self) -> bool {
        self.swap_iq
    }

    pub fn status(&self) -> (bool, CorrectionDirection) {
        (self.tracker.is_searching(), self.tracker.direction())
    }

    fn shift_channel(&mut self, samples: &mut [i16]) {
        if samples.is_empty() {
            return;
        }
        let carry = self.carry.unwrap_or(samples[0]);
        self.carry = Some(delay_one(samples, carry));
    }
}

impl AudioNode for IqPreprocessor {
    fn get_ports(&self) -> FxHashMap<PortId, bool> {
        let mut ports = FxHashMap::default();
        ports.insert(PortId::AudioInput0, false); // I input
        ports.insert(PortId::AudioInput1, false); // Q input

        ports.insert(PortId::AudioOutput0, true); // I output
        ports.insert(PortId::AudioOutput1, true); // Q output

        ports
    }

    fn update(&mut self, ctx: &mut UpdateContext) {
        let block_i = ctx.receive_writable(0);
        let block_q = ctx.receive_writable(1);

        // Both channels or nothing: a lone block goes straight back to the
        // pool and the cycle produces no output.
        let (block_i, block_q) = match (block_i, block_q) {
            (Some(block_i), Some(block_q)) => (block_i, block_q),
            (Some(handle), None) | (None, Some(handle)) => {
                ctx.release(handle);
                return;
            }
            (None, None) => return,
        };

        if self.should_process() {
            // Single-sample lag compensation for the channel named by the
            // current correction direction.
            match self.tracker.direction() {
                CorrectionDirection::DelayI => self.shift_channel(ctx.block_mut(block_i)),
                CorrectionDirection::DelayQ => self.shift_channel(ctx.block_mut(block_q)),
                CorrectionDirection::None => {}
            }

            if self.tracker.is_searching() {
                let verdict = {
                    let (samples_i, samples_q) = ctx.block_pair(block_i, block_q);
                    self.detector.evaluate(samples_i, samples_q)
                };
                if self.tracker.observe(verdict) {
                    // New direction next cycle; the carry belonged to the
                    // old one.
                    self.carry = None;
                }
            }

            if self.swap_iq {
                let (samples_i, samples_q) = ctx.block_pair_mut(block_i, block_q);
                swap_channels(samples_i, samples_q);
            }
        }

        ctx.transmit(block_i, 0);
        ctx.transmit(block_q, 1);
    }

    fn reset(&mut self) {
        self.carry = None;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn set_active(&mut self, active: bool) {
        self.enabled = active;
        if active {
            self.reset();
        }
    }

    fn name(&self) -> &'static str {
        "IqPreprocessor"
    }

    fn node_type(&self) -> &str {
        "iq_preprocessor"
    }
}
