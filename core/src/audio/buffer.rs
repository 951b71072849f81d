//! Mono float PCM buffer returned by every engine.

use crate::{Result, TtsError};

/// Normalized mono samples in [-1.0, 1.0] plus their sample rate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Average interleaved frames down to one channel.
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(interleaved: &[f32], channels: u16, sample_rate: u32) -> Self {
        let channels = channels.max(1) as usize;
        let samples = if channels == 1 {
            interleaved.to_vec()
        } else {
            interleaved
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };
        Self::new(samples, sample_rate)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Force every sample into [-1.0, 1.0]. Non-finite samples become silence.
    pub fn clamp(&mut self) {
        for s in self.samples.iter_mut() {
            *s = if s.is_finite() { s.clamp(-1.0, 1.0) } else { 0.0 };
        }
    }

    /// Scale so the loudest sample sits at full scale, then clamp.
    /// Silent buffers are left as they are.
    pub fn peak_normalize(&mut self) {
        let peak = self
            .samples
            .iter()
            .filter(|s| s.is_finite())
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        if peak > 0.0 {
            for s in self.samples.iter_mut() {
                *s /= peak;
            }
        }
        self.clamp();
    }

    pub fn validate(&self) -> Result<()> {
        validate_audio(&self.samples, self.sample_rate)
    }
}

/// Shared precondition of every artifact writer.
pub fn validate_audio(samples: &[f32], sample_rate: u32) -> Result<()> {
    if sample_rate == 0 {
        return Err(TtsError::InvalidArgument(format!(
            "'sample_rate' must be a positive integer, got {}",
            sample_rate
        )));
    }
    if let Some(idx) = samples.iter().position(|s| !s.is_finite()) {
        return Err(TtsError::InvalidArgument(format!(
            "'audio' must contain only finite samples, found {} at index {}",
            samples[idx], idx
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_frames() {
        let buf = AudioBuffer::from_interleaved(&[0.5, -0.5, 1.0, 0.0, 0.2], 2, 8000);
        assert_eq!(buf.samples, vec![0.0, 0.5]);
        assert_eq!(buf.sample_rate, 8000);
    }

    #[test]
    fn clamp_bounds_and_scrubs_nan() {
        let mut buf = AudioBuffer::new(vec![1.5, -2.0, f32::NAN, 0.25], 100);
        buf.clamp();
        assert_eq!(buf.samples, vec![1.0, -1.0, 0.0, 0.25]);
    }

    #[test]
    fn peak_normalize_uses_absolute_peak() {
        let mut buf = AudioBuffer::new(vec![0.1, -0.4, 0.2], 100);
        buf.peak_normalize();
        assert!((buf.samples[1] + 1.0).abs() < 1e-6);
        assert!((buf.samples[0] - 0.25).abs() < 1e-6);

        let mut silent = AudioBuffer::new(vec![0.0; 4], 100);
        silent.peak_normalize();
        assert_eq!(silent.samples, vec![0.0; 4]);
    }

    #[test]
    fn validation_rejects_zero_rate_and_non_finite() {
        assert!(matches!(
            validate_audio(&[0.0], 0),
            Err(TtsError::InvalidArgument(_))
        ));
        assert!(matches!(
            validate_audio(&[0.0, f32::INFINITY], 22_050),
            Err(TtsError::InvalidArgument(_))
        ));
        assert!(validate_audio(&[], 22_050).is_ok());
    }

    #[test]
    fn duration_follows_rate() {
        let buf = AudioBuffer::new(vec![0.0; 22_050], 22_050);
        assert_eq!(buf.duration_secs(), 1.0);
    }
}
