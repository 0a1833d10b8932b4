//! Example: Analyze multiple audio files in parallel
//!
//! Usage:
//!   cargo run --release --example analyze_batch -- [--jobs N] [--json] <file1> <file2> ...
//!
//! Notes:
//! - Parallelism is across files (batch-level). Each file analysis is still single-threaded.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.

#[path = "common/decode.rs"]
mod decode;

use std::env;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tessitura_dsp::analysis::confidence::compute_confidence;
use tessitura_dsp::{analyze_buffer, AnalysisConfig, CancellationToken, SampleBuffer, Scheduler};

#[derive(Debug, Serialize)]
struct ItemOut {
    file: String,
    key: Option<String>,
    key_confidence: Option<u8>,
    bpm: Option<u32>,
    low: Option<String>,
    high: Option<String>,
    voice_type: Option<String>,
    overall_confidence: Option<f32>,
    processing_time_ms: Option<f32>,
    error: Option<String>,
}

impl ItemOut {
    fn failed(file: String, error: String) -> Self {
        Self {
            file,
            key: None,
            key_confidence: None,
            bpm: None,
            low: None,
            high: None,
            voice_type: None,
            overall_confidence: None,
            processing_time_ms: None,
            error: Some(error),
        }
    }
}

fn analyze_path(path: &str, config: &AnalysisConfig) -> ItemOut {
    let decoded = match decode::decode_audio_file(path) {
        Ok(d) => d,
        Err(e) => return ItemOut::failed(path.to_string(), format!("decode failed: {e}")),
    };
    let result = SampleBuffer::new(&decoded.samples, decoded.sample_rate, decoded.channels)
        .and_then(|buffer| {
            let mut scheduler = Scheduler::from_config(config, CancellationToken::new());
            analyze_buffer(&buffer, config, &mut scheduler)
        });

    match result {
        Ok(report) => {
            let confidence = compute_confidence(&report);
            ItemOut {
                file: path.to_string(),
                key: report.key.map(|k| k.key.name()),
                key_confidence: report.key.map(|k| k.confidence),
                bpm: report.tempo.map(|t| t.bpm),
                low: report.voice.min_note.map(|n| n.name()),
                high: report.voice.max_note.map(|n| n.name()),
                voice_type: Some(report.voice.voice_type.to_string()),
                overall_confidence: Some(confidence.overall_confidence),
                processing_time_ms: Some(report.metadata.processing_time_ms),
                error: None,
            }
        }
        Err(e) => ItemOut::failed(path.to_string(), format!("analysis failed: {e}")),
    }
}

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

fn percentile(mut xs: Vec<f32>, p: f32) -> Option<f32> {
    if xs.is_empty() {
        return None;
    }
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((xs.len() - 1) as f32 * p.clamp(0.0, 1.0)).round() as usize;
    Some(xs[idx.min(xs.len() - 1)])
}

fn or_dash<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut paths: Vec<String> = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(a) = args.next() {
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args.next().ok_or("--jobs requires a value")?.parse::<usize>()?;
                jobs = Some(std::cmp::max(1, v));
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: analyze_batch [--jobs N] [--json] <file1> <file2> ...\n\
                     \n\
                     --jobs N   Parallel workers (default: CPU-1)\n\
                     --json     Emit one JSON object per line (JSONL)\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one audio file path. Use --help for usage.");
        std::process::exit(2);
    }

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let config = AnalysisConfig::default();
    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let outs: Vec<ItemOut> =
        pool.install(|| paths.par_iter().map(|path| analyze_path(path, &config)).collect());

    for (idx, o) in outs.iter().enumerate() {
        if json {
            println!("{}", serde_json::to_string(o)?);
        } else if let Some(error) = &o.error {
            println!("[{}/{}] {}: ERROR: {}", idx + 1, outs.len(), o.file, error);
        } else {
            println!(
                "[{}/{}] {}: Key={} (conf={}) BPM={} Range={}-{} Voice={} time={:.2}ms",
                idx + 1,
                outs.len(),
                o.file,
                or_dash(&o.key),
                or_dash(&o.key_confidence),
                or_dash(&o.bpm),
                or_dash(&o.low),
                or_dash(&o.high),
                or_dash(&o.voice_type),
                o.processing_time_ms.unwrap_or(0.0)
            );
        }
    }

    let ok_times: Vec<f32> = outs.iter().filter_map(|o| o.processing_time_ms).collect();
    eprintln!(
        "Done: ok={}/{} wall={:.0}ms",
        ok_times.len(),
        outs.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );
    if !ok_times.is_empty() {
        let mean = ok_times.iter().sum::<f32>() / ok_times.len() as f32;
        let p50 = percentile(ok_times.clone(), 0.50).unwrap_or(mean);
        let p90 = percentile(ok_times.clone(), 0.90).unwrap_or(mean);
        eprintln!("processing_time_ms: mean={:.2} p50={:.2} p90={:.2}", mean, p50, p90);
    }

    Ok(())
}
