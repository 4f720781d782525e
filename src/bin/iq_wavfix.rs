use std::env;
use std::fs;

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader, WavWriter};

use iq_processor::{
    AudioNode, BlockPool, IqPreprocessor, PreprocessorConfig, UpdateContext, FFT_SIZE,
};

/// Offline repair of a recorded I/Q capture: reads a stereo WAV with I on
/// the left channel and Q on the right, runs the auto-detecting
/// preprocessor over it block by block, and writes the realigned result.
fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 || args.len() > 4 {
        bail!("usage: iq_wavfix <input.wav> <output.wav> [config.json]");
    }

    let config = match args.get(3) {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {path}"))?;
            PreprocessorConfig::from_json_str(&json)
                .with_context(|| format!("failed to parse config {path}"))?
        }
        None => PreprocessorConfig::default(),
    };

    let mut reader =
        WavReader::open(&args[1]).with_context(|| format!("failed to open {}", args[1]))?;
    let spec = reader.spec();
    if spec.channels != 2 {
        bail!("expected a stereo (I/Q) WAV, got {} channel(s)", spec.channels);
    }
    if spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
        bail!(
            "unsupported WAV format: bits_per_sample={} sample_format={:?}",
            spec.bits_per_sample,
            spec.sample_format
        );
    }

    let interleaved: Vec<i16> = reader
        .samples::<i16>()
        .collect::<Result<_, _>>()
        .context("failed to read samples")?;
    let mut channel_i = Vec::with_capacity(interleaved.len() / 2);
    let mut channel_q = Vec::with_capacity(interleaved.len() / 2);
    for frame in interleaved.chunks_exact(2) {
        channel_i.push(frame[0]);
        channel_q.push(frame[1]);
    }

    let mut pool = BlockPool::new(FFT_SIZE, 4);
    let mut node = IqPreprocessor::new(config);
    node.start_auto_detect();

    let mut out_i = Vec::with_capacity(channel_i.len());
    let mut out_q = Vec::with_capacity(channel_q.len());
    let full_blocks = channel_i.len() / FFT_SIZE;
    for block in 0..full_blocks {
        let range = block * FFT_SIZE..(block + 1) * FFT_SIZE;

        let handle_i = pool.acquire();
        pool.copy_in(handle_i, &channel_i[range.clone()]);
        let handle_q = pool.acquire();
        pool.copy_in(handle_q, &channel_q[range]);

        let mut ctx = UpdateContext::new(&mut pool);
        ctx.queue_input(0, handle_i);
        ctx.queue_input(1, handle_q);
        node.update(&mut ctx);

        if let Some(handle) = ctx.take_output(0) {
            out_i.extend_from_slice(ctx.block(handle));
            ctx.release(handle);
        }
        if let Some(handle) = ctx.take_output(1) {
            out_q.extend_from_slice(ctx.block(handle));
            ctx.release(handle);
        }
    }
    // The trailing partial block is shorter than the processing quantum and
    // passes through untouched.
    out_i.extend_from_slice(&channel_i[full_blocks * FFT_SIZE..]);
    out_q.extend_from_slice(&channel_q[full_blocks * FFT_SIZE..]);

    let mut writer =
        WavWriter::create(&args[2], spec).with_context(|| format!("failed to create {}", args[2]))?;
    for (&i, &q) in out_i.iter().zip(out_q.iter()) {
        writer.write_sample(i)?;
        writer.write_sample(q)?;
    }
    writer.finalize().context("failed to finalize output")?;

    let (searching, direction) = node.status();
    println!(
        "{} blocks processed, correction {:+}{}",
        full_blocks,
        direction.as_i8(),
        if searching { " (still searching)" } else { " (locked)" }
    );
    Ok(())
}
