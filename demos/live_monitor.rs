//! Example: Feed a file through a live session as if it were a microphone
//!
//! Usage:
//!   cargo run --release --example live_monitor -- [--yin] <file>
//!
//! Blocks of 1024 samples are pushed and one frame is processed per block;
//! each emitted snapshot is printed as a line.

#[path = "common/decode.rs"]
mod decode;

use std::env;

use tessitura_dsp::features::pitch::PitchAlgorithm;
use tessitura_dsp::preprocessing::channel_mixer::downmix_interleaved;
use tessitura_dsp::{AnalysisConfig, LiveAnalyzer};

const BLOCK: usize = 1024;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut config = AnalysisConfig::default();
    let mut path: Option<String> = None;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--yin" => config.pitch_algorithm = PitchAlgorithm::Yin,
            _ => path = Some(arg),
        }
    }
    let path = path.ok_or("Usage: live_monitor [--yin] <file>")?;

    let decoded = decode::decode_audio_file(&path)?;
    let mono = downmix_interleaved(&decoded.samples, decoded.channels as usize);
    let mut live = LiveAnalyzer::new(&config, decoded.sample_rate)?;

    for (i, block) in mono.chunks(BLOCK).enumerate() {
        live.push_samples(block);
        let t = (i * BLOCK) as f64 / decoded.sample_rate as f64;
        let Some(snapshot) = live.process_frame(t) else {
            continue;
        };

        let note = snapshot.note.map_or_else(|| "--".to_string(), |n| n.name());
        let cents = snapshot.cents.map_or_else(String::new, |c| format!("{:+}c", c));
        let key = snapshot.key.map_or_else(|| "detecting".to_string(), |k| k.name());
        let vibrato = match snapshot.vibrato.quality {
            Some(q) if snapshot.vibrato.is_vibrato => format!(
                "{:.1} Hz {:.0}c {}",
                snapshot.vibrato.rate_hz,
                snapshot.vibrato.depth_cents,
                q.label()
            ),
            _ => "-".to_string(),
        };
        println!(
            "{:7.2}s  {:>4} {:>5}  vol {:.3}  {:<8}  vibrato {}  key {}",
            t,
            note,
            cents,
            snapshot.volume,
            snapshot.voice_type.label(),
            vibrato,
            key
        );
    }

    Ok(())
}
