use std::f32::consts::TAU;

use anyhow::Result;
use rand::rngs::ThreadRng;
use rand::Rng;

use iq_processor::{
    AudioNode, BlockPool, CorrectionConfig, IqPreprocessor, PreprocessorConfig, UpdateContext,
};

const BLOCK_SIZE: usize = 128;
const TONE_BIN: usize = 24;
const TONE_AMPLITUDE: f32 = 9000.0;
const NOISE_AMPLITUDE: f32 = 300.0;
const MAX_CYCLES: usize = 500;

/// Simulated capture path: a noisy quadrature tone whose Q channel comes
/// out one sample late, the defect the preprocessor exists to repair.
struct DefectiveCapture {
    phase: usize,
    rng: ThreadRng,
}

impl DefectiveCapture {
    fn new() -> Self {
        Self {
            phase: 0,
            rng: rand::rng(),
        }
    }

    fn fill(&mut self, block_i: &mut [i16], block_q: &mut [i16]) {
        let omega = TAU * TONE_BIN as f32 / BLOCK_SIZE as f32;
        for n in 0..block_i.len() {
            let t = (self.phase + n) as f32;
            let noise_i = self.rng.random_range(-NOISE_AMPLITUDE..NOISE_AMPLITUDE);
            let noise_q = self.rng.random_range(-NOISE_AMPLITUDE..NOISE_AMPLITUDE);
            block_i[n] = (TONE_AMPLITUDE * (omega * t).cos() + noise_i) as i16;
            block_q[n] = (TONE_AMPLITUDE * (omega * (t - 1.0)).sin() + noise_q) as i16;
        }
        self.phase += block_i.len();
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = PreprocessorConfig {
        correction: CorrectionConfig {
            max_failure_count: 5,
            max_success_count: 20,
        },
        ..PreprocessorConfig::default()
    };

    let mut pool = BlockPool::new(BLOCK_SIZE, 4);
    let mut node = IqPreprocessor::new(config);
    node.start_auto_detect();

    let mut capture = DefectiveCapture::new();
    let mut block_i = [0i16; BLOCK_SIZE];
    let mut block_q = [0i16; BLOCK_SIZE];

    println!("=== IQ PREPROCESSOR DEMO ===");
    println!(
        "Tone at bin {TONE_BIN} of {BLOCK_SIZE}, Q channel lagging by one sample; searching...\n"
    );

    let mut last_direction = node.manual_correction();
    let mut cycles = 0;
    while node.auto_detect_status() && cycles < MAX_CYCLES {
        capture.fill(&mut block_i, &mut block_q);

        let handle_i = pool.acquire();
        pool.copy_in(handle_i, &block_i);
        let handle_q = pool.acquire();
        pool.copy_in(handle_q, &block_q);

        let mut ctx = UpdateContext::new(&mut pool);
        ctx.queue_input(0, handle_i);
        ctx.queue_input(1, handle_q);
        node.update(&mut ctx);
        for port in 0..2 {
            if let Some(handle) = ctx.take_output(port) {
                ctx.release(handle);
            }
        }
        cycles += 1;

        let direction = node.manual_correction();
        if direction != last_direction {
            println!("cycle {cycles:3}: trying correction {:+}", direction.as_i8());
            last_direction = direction;
        }
    }

    let (searching, direction) = node.status();
    if searching {
        println!("\nNo lock after {MAX_CYCLES} cycles (direction {:+})", direction.as_i8());
    } else {
        println!(
            "\nLocked correction {:+} after {cycles} cycles",
            direction.as_i8()
        );
    }
    Ok(())
}
