//! Performance benchmarks for offline and live analysis

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tessitura_dsp::features::pitch::PitchAlgorithm;
use tessitura_dsp::{analyze_audio, AnalysisConfig, LiveAnalyzer};

fn tone(seconds: usize, sample_rate: usize) -> Vec<f32> {
    (0..sample_rate * seconds)
        .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / sample_rate as f32).sin() * 0.5)
        .collect()
}

fn bench_analyze_audio(c: &mut Criterion) {
    // 30 seconds at 44.1kHz
    let samples = tone(30, 44100);
    let config = AnalysisConfig::default();

    c.bench_function("analyze_audio_30s", |b| {
        b.iter(|| {
            let _ = analyze_audio(black_box(&samples), black_box(44100), black_box(config.clone()));
        });
    });
}

fn bench_live_frame(c: &mut Criterion) {
    let samples = tone(1, 44100);

    for (name, algorithm) in [
        ("live_frame_autocorrelation", PitchAlgorithm::Autocorrelation),
        ("live_frame_yin", PitchAlgorithm::Yin),
    ] {
        let config = AnalysisConfig {
            pitch_algorithm: algorithm,
            ui_update_interval_ms: 0,
            ..AnalysisConfig::default()
        };
        let mut live = LiveAnalyzer::new(&config, 44100).expect("valid config");
        live.push_samples(&samples);
        let mut t = 0.0;

        c.bench_function(name, |b| {
            b.iter(|| {
                t += 0.016;
                black_box(live.process_frame(black_box(t)));
            });
        });
    }
}

criterion_group!(benches, bench_analyze_audio, bench_live_frame);
criterion_main!(benches);
