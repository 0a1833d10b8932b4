//! Example: Analyze a single audio file
//!
//! Usage:
//!   cargo run --release --example analyze_file -- [--json] [--config config.json] <file>
//!
//! Set `RUST_LOG=tessitura_dsp=debug` to see per-stage diagnostics.

#[path = "common/decode.rs"]
mod decode;

use std::env;
use std::fs;

use tessitura_dsp::analysis::confidence::compute_confidence;
use tessitura_dsp::{analyze_buffer, AnalysisConfig, CancellationToken, SampleBuffer, Scheduler};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut json = false;
    let mut config_path: Option<String> = None;
    let mut path: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--config" => config_path = Some(args.next().ok_or("--config requires a path")?),
            "--help" | "-h" => {
                eprintln!("Usage: analyze_file [--json] [--config config.json] <file>");
                return Ok(());
            }
            _ => path = Some(arg),
        }
    }
    let path = path.ok_or("Provide an audio file path. Use --help for usage.")?;

    let config: AnalysisConfig = match config_path {
        Some(p) => serde_json::from_str(&fs::read_to_string(p)?)?,
        None => AnalysisConfig::default(),
    };

    let decoded = decode::decode_audio_file(&path)?;
    let buffer = SampleBuffer::new(&decoded.samples, decoded.sample_rate, decoded.channels)?;

    let mut scheduler = Scheduler::from_config(&config, CancellationToken::new()).with_progress(
        |p| {
            if p.fraction == 0.0 {
                eprintln!("{}...", p.label);
            }
        },
    );
    let report = analyze_buffer(&buffer, &config, &mut scheduler)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let confidence = compute_confidence(&report);
    println!("Analysis Results: {}", path);
    match report.key {
        Some(key) => println!(
            "  Key: {} ({}), confidence {}",
            key.key.name(),
            key.key.short_name(),
            key.confidence
        ),
        None => println!("  Key: unknown"),
    }
    match report.tempo {
        Some(tempo) => println!("  BPM: {} ({:.2}), confidence {:.2}", tempo.bpm, tempo.bpm_precise, tempo.confidence),
        None => println!("  BPM: undetected"),
    }
    match (report.voice.min_note, report.voice.max_note) {
        (Some(low), Some(high)) => println!(
            "  Range: {} - {} ({}), {} voiced frames",
            low.name(),
            high.name(),
            report.voice.voice_type,
            report.voice.voiced_frames
        ),
        _ => println!("  Range: {}", report.voice.voice_type),
    }
    println!(
        "  Overall confidence: {:.2} ({})",
        confidence.overall_confidence,
        confidence.confidence_level()
    );
    for warning in &report.metadata.confidence_warnings {
        println!("  Warning: {}", warning);
    }
    println!(
        "  Analysed {:.1}s of {:.1}s in {:.2} ms",
        report.metadata.analyzed_seconds,
        report.metadata.duration_seconds,
        report.metadata.processing_time_ms
    );

    Ok(())
}
