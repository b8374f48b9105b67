//! Microphone capture + FFT spectrum for the audio-input demo.
//!
//! Capture runs on the thread cpal owns; the callback downmixes to mono
//! (left channel) and hands chunks to the render thread over a bounded
//! channel. If the render thread falls behind, chunks are dropped rather than
//! stalling the callback. The render thread drains pending chunks once per
//! frame and recomputes a 512-band magnitude spectrum, which the demo uploads
//! as the `iSpectrum` texture.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{anyhow, Context as _};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::loge;

pub const SPECTRUM_BANDS: usize = 512;
pub const FFT_SIZE: usize = 1024;

/// Rolling-window FFT over mono samples. Pure CPU, no audio device needed,
/// so the math is testable in isolation.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    buffer: Vec<Complex<f32>>,
    hann: Vec<f32>,
    window: VecDeque<f32>,
    spectrum: Vec<f32>,
    pending: bool,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];
        let hann = (0..FFT_SIZE)
            .map(|i| {
                let x = i as f32 / (FFT_SIZE - 1) as f32;
                0.5 - 0.5 * (std::f32::consts::TAU * x).cos()
            })
            .collect();
        Self {
            fft,
            scratch,
            buffer: vec![Complex::default(); FFT_SIZE],
            hann,
            window: VecDeque::with_capacity(FFT_SIZE),
            spectrum: vec![0.0; SPECTRUM_BANDS],
            pending: false,
        }
    }

    pub fn push_samples(&mut self, mono: &[f32]) {
        self.window.extend(mono.iter().copied());
        while self.window.len() > FFT_SIZE {
            self.window.pop_front();
        }
        self.pending = true;
    }

    /// Recompute the spectrum if new samples arrived and the window is full.
    pub fn analyze(&mut self) -> &[f32] {
        if self.pending && self.window.len() == FFT_SIZE {
            self.pending = false;
            for (i, (s, w)) in self.window.iter().zip(self.hann.iter()).enumerate() {
                self.buffer[i] = Complex::new(s * w, 0.0);
            }
            self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);
            let scale = 2.0 / FFT_SIZE as f32;
            for (band, c) in self.spectrum.iter_mut().zip(self.buffer.iter()) {
                *band = c.norm() * scale;
            }
        }
        &self.spectrum
    }

    pub fn spectrum(&self) -> &[f32] {
        &self.spectrum
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Default-device microphone capture feeding a [`SpectrumAnalyzer`].
pub struct AudioInput {
    _stream: cpal::Stream,
    rx: Receiver<Vec<f32>>,
    analyzer: SpectrumAnalyzer,
}

impl AudioInput {
    pub fn start() -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("no audio input device available"))?;
        let config = device.default_input_config().context("default_input_config failed")?;
        let channels = config.channels() as usize;
        let sample_format = config.sample_format();
        let stream_config: cpal::StreamConfig = config.into();

        let (tx, rx) = bounded::<Vec<f32>>(16);

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, channels, tx)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, channels, tx)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, channels, tx)?,
            other => return Err(anyhow!("unsupported input sample format: {other:?}")),
        };
        stream.play().context("failed to start input stream")?;

        Ok(Self {
            _stream: stream,
            rx,
            analyzer: SpectrumAnalyzer::new(),
        })
    }

    /// Drain pending capture chunks and return the latest spectrum.
    /// Called once per frame on the render thread.
    pub fn update(&mut self) -> &[f32] {
        while let Ok(chunk) = self.rx.try_recv() {
            self.analyzer.push_samples(&chunk);
        }
        self.analyzer.analyze()
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    tx: Sender<Vec<f32>>,
) -> anyhow::Result<cpal::Stream>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    use cpal::Sample as _;

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            // Left channel only feeds the FFT.
            let mono: Vec<f32> =
                data.chunks(channels).map(|frame| f32::from_sample(frame[0])).collect();
            let _ = tx.try_send(mono);
        },
        |err| loge!("audio", "input stream error: {err}"),
        None,
    )?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_at_bin(bin: usize) -> Vec<f32> {
        (0..FFT_SIZE)
            .map(|k| (std::f32::consts::TAU * bin as f32 * k as f32 / FFT_SIZE as f32).sin())
            .collect()
    }

    #[test]
    fn spectrum_is_silent_until_window_fills() {
        let mut an = SpectrumAnalyzer::new();
        an.push_samples(&[0.5; 100]);
        assert!(an.analyze().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn pure_sine_peaks_at_its_bin() {
        let mut an = SpectrumAnalyzer::new();
        an.push_samples(&sine_at_bin(32));
        let spectrum = an.analyze().to_vec();
        assert_eq!(spectrum.len(), SPECTRUM_BANDS);

        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 32);
        // Far-away bands carry almost no energy.
        assert!(spectrum[300] < spectrum[32] * 0.01);
    }

    #[test]
    fn window_keeps_only_the_newest_samples() {
        let mut an = SpectrumAnalyzer::new();
        an.push_samples(&vec![1.0; FFT_SIZE * 3]);
        assert_eq!(an.window.len(), FFT_SIZE);
    }

    #[test]
    fn analyze_is_stable_without_new_samples() {
        let mut an = SpectrumAnalyzer::new();
        an.push_samples(&sine_at_bin(8));
        let first = an.analyze().to_vec();
        let second = an.analyze().to_vec();
        assert_eq!(first, second);
    }
}
