//! Spectrum Magnitudes
//!
//! Capture units deliver frequency-domain data as interleaved
//! `(real, imaginary)` pairs of signed 8-bit values. This module turns a raw
//! capture buffer into per-bin magnitudes for visualization.

use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

/// One capture callback worth of magnitudes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeFrame {
    /// Position of this frame in its capture session (starts at 0)
    pub sequence: u64,
    /// Sampling rate reported by the capture unit, in milli-hertz
    pub sampling_rate_mhz: u32,
    /// Non-negative magnitude per frequency bin
    pub bins: Vec<f32>,
}

impl MagnitudeFrame {
    /// Build a frame from a raw capture buffer
    pub fn from_capture(sequence: u64, sampling_rate_mhz: u32, fft: &[u8]) -> Self {
        Self {
            sequence,
            sampling_rate_mhz,
            bins: fft_to_magnitudes(fft),
        }
    }

    /// Number of bins in the frame
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Largest magnitude in the frame, 0.0 for an empty frame
    pub fn peak(&self) -> f32 {
        self.bins.iter().copied().fold(0.0, f32::max)
    }
}

/// Convert interleaved signed 8-bit `(re, im)` pairs into magnitudes
///
/// Output length is `fft.len() / 2`; a trailing odd byte is ignored.
/// Values are widened to `f32` without rescaling, so `(3, 4)` gives `5.0`.
pub fn fft_to_magnitudes(fft: &[u8]) -> Vec<f32> {
    fft.chunks_exact(2)
        .map(|pair| {
            let re = pair[0] as i8 as f32;
            let im = pair[1] as i8 as f32;
            Complex::new(re, im).norm()
        })
        .collect()
}
