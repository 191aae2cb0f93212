//! Mono floating-point audio buffers.

/// An ordered run of mono `f32` samples at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    samples: Vec<f32>,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    /// Concatenates chunks in the order they are yielded.
    pub fn from_chunks<I>(sample_rate: u32, chunks: I) -> Self
    where
        I: IntoIterator<Item = Vec<f32>>,
    {
        let mut samples = Vec::new();
        for chunk in chunks {
            samples.extend(chunk);
        }
        Self::new(sample_rate, samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_are_concatenated_in_emission_order() {
        let a = vec![0.1, 0.2];
        let b = vec![0.3];
        let c = vec![0.4, 0.5, 0.6];

        let buffer = AudioBuffer::from_chunks(24_000, vec![a, b, c]);

        assert_eq!(buffer.samples(), &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        assert_eq!(buffer.sample_rate(), 24_000);
    }

    #[test]
    fn empty_chunks_give_empty_buffer() {
        let buffer = AudioBuffer::from_chunks(16_000, Vec::<Vec<f32>>::new());
        assert!(buffer.is_empty());
        assert_eq!(buffer.duration_secs(), 0.0);
    }

    #[test]
    fn duration_follows_sample_rate() {
        let buffer = AudioBuffer::new(16_000, vec![0.0; 8_000]);
        assert!((buffer.duration_secs() - 0.5).abs() < f64::EPSILON);
    }
}
