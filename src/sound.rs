//! Alert tone playback
//!
//! Synthesizes short tones in memory as WAV data and plays them through
//! rodio. Pitch and length scale with urgency; the live alarm uses a
//! harsher square wave. Audio is a best-effort side channel: if no output
//! device is available every play call is silently skipped.

use rodio::Source;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::SoundConfig;
use crate::notifier::Urgency;

const SAMPLE_RATE: u32 = 44100;

/// A tone to synthesize and play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency: f32,
    /// Length in seconds
    pub duration: f32,
    pub waveform: Waveform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
}

/// Tone for a threshold alert of the given urgency.
pub fn urgency_tone(urgency: Urgency) -> Tone {
    match urgency {
        Urgency::Critical => Tone {
            frequency: 1000.0,
            duration: 0.5,
            waveform: Waveform::Sine,
        },
        Urgency::High | Urgency::Medium => Tone {
            frequency: 850.0,
            duration: 0.4,
            waveform: Waveform::Sine,
        },
        Urgency::Low => Tone {
            frequency: 700.0,
            duration: 0.2,
            waveform: Waveform::Sine,
        },
    }
}

/// Tone for a live alarm.
pub fn alarm_tone() -> Tone {
    Tone {
        frequency: 1200.0,
        duration: 0.8,
        waveform: Waveform::Square,
    }
}

/// Owns the audio output stream and hands out playback handles.
pub struct TonePlayer {
    /// Output stream, kept alive for the lifetime of the player
    _stream: Option<rodio::OutputStream>,
    handle: ToneHandle,
}

impl TonePlayer {
    pub fn new(config: &SoundConfig) -> Self {
        if !config.enabled {
            return Self {
                _stream: None,
                handle: ToneHandle {
                    inner: None,
                    volume: config.volume,
                },
            };
        }

        match rodio::OutputStream::try_default() {
            Ok((stream, stream_handle)) => {
                tracing::info!("Audio output initialized");
                Self {
                    _stream: Some(stream),
                    handle: ToneHandle {
                        inner: Some(Arc::new(Mutex::new(stream_handle))),
                        volume: config.volume,
                    },
                }
            }
            Err(e) => {
                tracing::warn!("Failed to initialize audio output: {e}");
                Self {
                    _stream: None,
                    handle: ToneHandle {
                        inner: None,
                        volume: config.volume,
                    },
                }
            }
        }
    }

    /// A cloneable, sendable playback handle. Outlives no longer than the
    /// player's output stream.
    pub fn handle(&self) -> ToneHandle {
        self.handle.clone()
    }

    pub fn is_available(&self) -> bool {
        self.handle.is_available()
    }
}

/// Lightweight playback handle, safe to move into timer tasks.
#[derive(Clone)]
pub struct ToneHandle {
    inner: Option<Arc<Mutex<rodio::OutputStreamHandle>>>,
    volume: f32,
}

impl ToneHandle {
    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }

    /// Play a tone without blocking the caller.
    pub fn play(&self, tone: Tone) {
        self.play_times(tone, &[Duration::ZERO]);
    }

    /// Play a tone at each offset from now, e.g. the critical triple beep
    /// at 0ms/600ms/1200ms. Playback runs on its own thread.
    pub fn play_times(&self, tone: Tone, offsets: &[Duration]) {
        let Some(handle) = &self.inner else {
            return;
        };
        let wav = synthesize_wav(tone, self.volume);
        let handle = Arc::clone(handle);
        let offsets = offsets.to_vec();

        std::thread::spawn(move || {
            let mut elapsed = Duration::ZERO;
            for offset in offsets {
                if offset > elapsed {
                    std::thread::sleep(offset - elapsed);
                    elapsed = offset;
                }
                let Ok(handle) = handle.lock() else {
                    return;
                };
                if let Ok(source) = rodio::Decoder::new(Cursor::new(wav.clone())) {
                    if let Err(e) = handle.play_raw(source.convert_samples()) {
                        tracing::warn!("Failed to play alert tone: {e}");
                    }
                }
            }
        });
    }
}

/// Synthesize a tone as WAV data, with a short fade at both ends to
/// avoid clicks.
fn synthesize_wav(tone: Tone, volume: f32) -> Vec<u8> {
    let num_samples = (SAMPLE_RATE as f32 * tone.duration) as usize;
    let fade_samples = (SAMPLE_RATE / 100) as usize; // 10ms

    let mut samples: Vec<i16> = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let t = i as f32 / SAMPLE_RATE as f32;
        let phase = (2.0 * std::f32::consts::PI * tone.frequency * t).sin();
        let sample = match tone.waveform {
            Waveform::Sine => phase,
            Waveform::Square => phase.signum(),
        };

        let fade = if i < fade_samples {
            i as f32 / fade_samples as f32
        } else if i + fade_samples > num_samples {
            (num_samples - i) as f32 / fade_samples as f32
        } else {
            1.0
        };

        samples.push((sample * fade * volume * 32767.0) as i16);
    }

    encode_wav(&samples, SAMPLE_RATE)
}

/// Encode mono 16-bit PCM samples as an in-memory WAV file.
fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let num_channels = 1u16;
    let bits_per_sample = 16u16;
    let byte_rate = sample_rate * num_channels as u32 * bits_per_sample as u32 / 8;
    let block_align = num_channels * bits_per_sample / 8;
    let data_size = (samples.len() * 2) as u32;
    let file_size = 36 + data_size;

    let mut wav = Vec::with_capacity((file_size + 8) as usize);

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&file_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&num_channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }

    wav
}
