use super::block_pool::BlockPool;
use super::stream::UpdateContext;
use crate::config::PreprocessorConfig;
use crate::nodes::{CorrectionConfig, CorrectionDirection, IqPreprocessor};
use crate::traits::AudioNode;

// Quadrature tone generator with a running phase, optionally emitting the Q
// channel one sample late the way the defective capture path does.
struct ToneSource {
    bin: usize,
    amplitude: f32,
    lag_q: bool,
    phase: usize,
}

impl ToneSource {
    fn new(bin: usize, amplitude: f32, lag_q: bool) -> Self {
        Self {
            bin,
            amplitude,
            lag_q,
            phase: 0,
        }
    }

    fn fill(&mut self, block_i: &mut [i16], block_q: &mut [i16]) {
        let omega = std::f32::consts::TAU * self.bin as f32 / 128.0;
        for n in 0..block_i.len() {
            let t = (self.phase + n) as f32;
            let t_q = if self.lag_q { t - 1.0 } else { t };
            block_i[n] = (self.amplitude * (omega * t).cos()).round() as i16;
            block_q[n] = (self.amplitude * (omega * t_q).sin()).round() as i16;
        }
        self.phase += block_i.len();
    }
}

// Stages the given channel data, runs one update cycle, and returns
// whatever the node transmitted. Transmitted blocks are copied out and
// released, as the downstream host would.
fn run_cycle(
    pool: &mut BlockPool,
    node: &mut IqPreprocessor,
    input_i: Option<&[i16]>,
    input_q: Option<&[i16]>,
) -> (Option<Vec<i16>>, Option<Vec<i16>>) {
    let handle_i = input_i.map(|data| {
        let handle = pool.acquire();
        pool.copy_in(handle, data);
        handle
    });
    let handle_q = input_q.map(|data| {
        let handle = pool.acquire();
        pool.copy_in(handle, data);
        handle
    });

    let mut ctx = UpdateContext::new(pool);
    if let Some(handle) = handle_i {
        ctx.queue_input(0, handle);
    }
    if let Some(handle) = handle_q {
        ctx.queue_input(1, handle);
    }

    node.update(&mut ctx);

    let out_i = ctx.take_output(0);
    let out_q = ctx.take_output(1);
    let result = (
        out_i.map(|handle| ctx.block(handle).to_vec()),
        out_q.map(|handle| ctx.block(handle).to_vec()),
    );
    if let Some(handle) = out_i {
        ctx.release(handle);
    }
    if let Some(handle) = out_q {
        ctx.release(handle);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_pool_management() {
        let mut pool = BlockPool::new(128, 2);
        assert_eq!(pool.block_size(), 128);

        let a = pool.acquire();
        let b = pool.acquire();
        assert!(pool.is_in_use(a));
        assert_eq!(pool.in_use_count(), 2);

        // Exhausting the initial capacity grows the arena.
        let c = pool.acquire();
        assert_eq!(pool.in_use_count(), 3);

        pool.release(b);
        assert!(!pool.is_in_use(b));
        // Releasing twice is a no-op.
        pool.release(b);
        assert_eq!(pool.in_use_count(), 2);

        pool.release_all();
        assert_eq!(pool.in_use_count(), 0);
        assert!(!pool.is_in_use(a));
        assert!(!pool.is_in_use(c));
    }

    #[test]
    fn test_block_pair_mut_is_order_independent() {
        let mut pool = BlockPool::new(4, 2);
        let a = pool.acquire();
        let b = pool.acquire();
        pool.copy_in(a, &[1, 1, 1, 1]);
        pool.copy_in(b, &[2, 2, 2, 2]);

        let (first, second) = pool.block_pair_mut(b, a);
        assert_eq!(first, &[2, 2, 2, 2]);
        assert_eq!(second, &[1, 1, 1, 1]);
    }

    #[test]
    fn test_lone_block_is_released_without_output() {
        let mut pool = BlockPool::new(128, 4);
        let mut node = IqPreprocessor::new(PreprocessorConfig::default());
        node.start_auto_detect();

        let data = [42i16; 128];
        let (out_i, out_q) = run_cycle(&mut pool, &mut node, Some(&data), None);
        assert!(out_i.is_none());
        assert!(out_q.is_none());
        assert_eq!(pool.in_use_count(), 0);

        let (out_i, out_q) = run_cycle(&mut pool, &mut node, None, Some(&data));
        assert!(out_i.is_none());
        assert!(out_q.is_none());
        assert_eq!(pool.in_use_count(), 0);
    }

    #[test]
    fn test_uncorrected_pair_passes_through() {
        let mut pool = BlockPool::new(8, 4);
        let mut node = IqPreprocessor::new(PreprocessorConfig::default());

        let data_i = [1i16, 2, 3, 4, 5, 6, 7, 8];
        let data_q = [-1i16, -2, -3, -4, -5, -6, -7, -8];
        let (out_i, out_q) = run_cycle(&mut pool, &mut node, Some(&data_i), Some(&data_q));
        assert_eq!(out_i.unwrap(), data_i);
        assert_eq!(out_q.unwrap(), data_q);
        assert_eq!(pool.in_use_count(), 0);
    }

    #[test]
    fn test_swap_exchanges_channels() {
        let mut pool = BlockPool::new(8, 4);
        let mut node = IqPreprocessor::new(PreprocessorConfig::default());
        node.set_swap(true);

        let data_i = [10i16, 20, 30, 40, 50, 60, 70, 80];
        let data_q = [-10i16, -20, -30, -40, -50, -60, -70, -80];
        let (out_i, out_q) = run_cycle(&mut pool, &mut node, Some(&data_i), Some(&data_q));
        assert_eq!(out_i.unwrap(), data_q);
        assert_eq!(out_q.unwrap(), data_i);
    }

    #[test]
    fn test_manual_delay_carries_across_cycles() {
        let mut pool = BlockPool::new(8, 4);
        let mut node = IqPreprocessor::new(PreprocessorConfig::default());
        node.set_manual_correction(CorrectionDirection::DelayI);

        let data_q = [0i16; 8];

        // First corrected cycle: no carry exists yet, so sample 0 repeats.
        let first = [1i16, 2, 3, 4, 5, 6, 7, 8];
        let (out_i, _) = run_cycle(&mut pool, &mut node, Some(&first), Some(&data_q));
        assert_eq!(out_i.unwrap(), [1, 1, 2, 3, 4, 5, 6, 7]);

        // Second cycle: the displaced sample 8 leads the block.
        let second = [9i16, 10, 11, 12, 13, 14, 15, 16];
        let (out_i, out_q) = run_cycle(&mut pool, &mut node, Some(&second), Some(&data_q));
        assert_eq!(out_i.unwrap(), [8, 9, 10, 11, 12, 13, 14, 15]);
        assert_eq!(out_q.unwrap(), data_q);
    }

    #[test]
    fn test_delay_directions_are_symmetric() {
        let data_a = [5i16, 6, 7, 8, 9, 10, 11, 12];
        let data_b = [-5i16, -6, -7, -8, -9, -10, -11, -12];

        let mut pool = BlockPool::new(8, 4);
        let mut node_i = IqPreprocessor::new(PreprocessorConfig::default());
        node_i.set_manual_correction(CorrectionDirection::DelayI);
        let (out_i, out_q) = run_cycle(&mut pool, &mut node_i, Some(&data_a), Some(&data_b));

        let mut node_q = IqPreprocessor::new(PreprocessorConfig::default());
        node_q.set_manual_correction(CorrectionDirection::DelayQ);
        let (swapped_i, swapped_q) = run_cycle(&mut pool, &mut node_q, Some(&data_b), Some(&data_a));

        // Relabeling the channels and mirroring the direction must produce
        // the mirrored output.
        assert_eq!(out_i.unwrap(), swapped_q.unwrap());
        assert_eq!(out_q.unwrap(), swapped_i.unwrap());
    }

    #[test]
    fn test_inactive_node_passes_blocks_unmodified() {
        let mut pool = BlockPool::new(8, 4);
        let mut node = IqPreprocessor::new(PreprocessorConfig::default());
        node.set_manual_correction(CorrectionDirection::DelayI);
        node.set_swap(true);
        node.set_active(false);

        let data_i = [1i16, 2, 3, 4, 5, 6, 7, 8];
        let data_q = [8i16, 7, 6, 5, 4, 3, 2, 1];
        let (out_i, out_q) = run_cycle(&mut pool, &mut node, Some(&data_i), Some(&data_q));
        assert_eq!(out_i.unwrap(), data_i);
        assert_eq!(out_q.unwrap(), data_q);
    }

    #[test]
    fn test_auto_detect_locks_onto_lagging_q_channel() {
        let mut config = PreprocessorConfig::default();
        config.correction = CorrectionConfig {
            max_failure_count: 2,
            max_success_count: 3,
        };

        let mut pool = BlockPool::new(128, 4);
        let mut node = IqPreprocessor::new(config);
        node.start_auto_detect();
        assert!(node.auto_detect_status());

        // Hardware defect: Q lags I by one sample. Delaying I realigns them.
        let mut source = ToneSource::new(32, 12000.0, true);
        let mut block_i = [0i16; 128];
        let mut block_q = [0i16; 128];

        let mut cycles = 0;
        while node.auto_detect_status() && cycles < 50 {
            source.fill(&mut block_i, &mut block_q);
            run_cycle(&mut pool, &mut node, Some(&block_i), Some(&block_q));
            cycles += 1;
        }

        assert!(!node.auto_detect_status(), "search never converged");
        assert_eq!(node.manual_correction(), CorrectionDirection::DelayI);
        assert_eq!(pool.in_use_count(), 0);
    }

    #[test]
    fn test_auto_detect_leaves_healthy_signal_alone() {
        let mut config = PreprocessorConfig::default();
        config.correction = CorrectionConfig {
            max_failure_count: 2,
            max_success_count: 3,
        };

        let mut pool = BlockPool::new(128, 4);
        let mut node = IqPreprocessor::new(config);
        node.start_auto_detect();

        let mut source = ToneSource::new(32, 12000.0, false);
        let mut block_i = [0i16; 128];
        let mut block_q = [0i16; 128];

        let mut cycles = 0;
        while node.auto_detect_status() && cycles < 50 {
            source.fill(&mut block_i, &mut block_q);
            run_cycle(&mut pool, &mut node, Some(&block_i), Some(&block_q));
            cycles += 1;
        }

        assert!(!node.auto_detect_status());
        assert_eq!(node.manual_correction(), CorrectionDirection::None);
    }

    #[test]
    fn test_silence_keeps_the_search_open() {
        let mut pool = BlockPool::new(128, 4);
        let mut node = IqPreprocessor::new(PreprocessorConfig::default());
        node.start_auto_detect();

        let silence = [0i16; 128];
        for _ in 0..20 {
            run_cycle(&mut pool, &mut node, Some(&silence), Some(&silence));
        }

        assert!(node.auto_detect_status());
        assert_eq!(node.manual_correction(), CorrectionDirection::None);
    }
}
