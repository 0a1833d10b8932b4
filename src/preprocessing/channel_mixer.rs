//! Channel mixing utilities (multi-channel to mono conversion)

/// Average interleaved channels into a mono signal
///
/// # Arguments
///
/// * `interleaved` - Interleaved samples (`frames * channels` long)
/// * `channels` - Number of channels; a trailing partial frame is ignored
///
/// # Returns
///
/// One sample per frame
pub fn downmix_interleaved(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    log::debug!(
        "Downmixing {} frames of {}-channel audio to mono",
        interleaved.len() / channels,
        channels
    );
    let scale = 1.0 / channels as f32;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_quad() {
        let samples = [1.0, 1.0, 0.0, 0.0, 0.4, 0.4, 0.4, 0.4];
        assert_eq!(downmix_interleaved(&samples, 4), vec![0.5, 0.4]);
    }
}
