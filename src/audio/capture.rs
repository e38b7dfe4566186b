//! Microphone capture adapter.
//!
//! A recording session owns its input stream, sample channel, and start
//! instant. Stopping produces a WAV file handle; cancelling discards
//! everything. The captured audio is not transcribed anywhere in this
//! crate; the orchestrator substitutes placeholder text for voice
//! messages.

use crate::conversation::{AvatarEmotion, ConversationStore};
use crate::{AuraError, Result};
use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "audio-io")]
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
#[cfg(feature = "audio-io")]
use crossbeam_channel::{unbounded, Receiver};
#[cfg(feature = "audio-io")]
use std::time::Instant;
#[cfg(feature = "audio-io")]
use tracing::{debug, info, warn};
#[cfg(feature = "audio-io")]
use uuid::Uuid;

/// A completed voice capture: the WAV file on disk plus its vitals.
#[derive(Debug, Clone)]
pub struct RecordingHandle {
    pub path: PathBuf,
    pub duration: Duration,
    pub sample_rate: u32,
}

#[cfg(feature = "audio-io")]
struct RecordingSession {
    stream: cpal::Stream,
    samples_rx: Receiver<Vec<f32>>,
    started: Instant,
    sample_rate: u32,
}

/// Start/stop/cancel microphone recording, driving the conversation
/// listening flag and avatar emotion.
pub struct VoiceCapture {
    store: ConversationStore,
    #[cfg(feature = "audio-io")]
    session: Option<RecordingSession>,
}

impl VoiceCapture {
    pub fn new(store: ConversationStore) -> Self {
        Self {
            store,
            #[cfg(feature = "audio-io")]
            session: None,
        }
    }

    #[cfg(feature = "audio-io")]
    pub fn start_recording(&mut self) -> Result<()> {
        if self.session.is_some() {
            warn!("Already recording");
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| AuraError::Capture("No input device available".into()))?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config: cpal::StreamConfig = device
            .default_input_config()
            .map_err(|e| AuraError::Capture(format!("Failed to get input config: {e}")))?
            .into();

        let sample_rate = config.sample_rate.0;
        let channels = config.channels as usize;
        let (samples_tx, samples_rx) = unbounded();

        let err_fn = |err| {
            tracing::error!("Audio input stream error: {}", err);
        };

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Average all channels to create mono
                    let samples = if channels == 1 {
                        data.to_vec()
                    } else {
                        data.chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                            .collect()
                    };

                    if let Err(e) = samples_tx.try_send(samples) {
                        debug!("Failed to send audio data: {}", e);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| AuraError::Capture(format!("Failed to build input stream: {e}")))?;

        stream
            .play()
            .map_err(|e| AuraError::Capture(format!("Failed to start input stream: {e}")))?;

        self.session = Some(RecordingSession {
            stream,
            samples_rx,
            started: Instant::now(),
            sample_rate,
        });
        self.store.set_listening(true);
        self.store.set_emotion(AvatarEmotion::Listening);

        info!("Recording started");
        Ok(())
    }

    #[cfg(not(feature = "audio-io"))]
    pub fn start_recording(&mut self) -> Result<()> {
        Err(AuraError::Capture(
            "Audio capture was disabled at build time".into(),
        ))
    }

    /// Stop recording and return a handle to the captured audio, or `None`
    /// when nothing was recording or the capture could not be saved.
    #[cfg(feature = "audio-io")]
    pub fn stop_recording(&mut self) -> Option<RecordingHandle> {
        self.reset_flags();

        let session = self.session.take()?;
        let RecordingSession {
            stream,
            samples_rx,
            started,
            sample_rate,
        } = session;

        let duration = started.elapsed();
        drop(stream);

        let mut samples = Vec::new();
        while let Ok(chunk) = samples_rx.try_recv() {
            samples.extend_from_slice(&chunk);
        }
        debug!("Recording stopped, accumulated {} samples", samples.len());

        if samples.is_empty() {
            warn!("Recording produced no audio");
            return None;
        }

        let path = std::env::temp_dir().join(format!("aura-recording-{}.wav", Uuid::new_v4()));
        if let Err(e) = super::wav::write_wav(&path, &samples, sample_rate, 1) {
            warn!("Failed to write recording: {}", e);
            return None;
        }

        Some(RecordingHandle {
            path,
            duration,
            sample_rate,
        })
    }

    #[cfg(not(feature = "audio-io"))]
    pub fn stop_recording(&mut self) -> Option<RecordingHandle> {
        self.reset_flags();
        None
    }

    /// Discard any captured audio and return to idle.
    pub fn cancel_recording(&mut self) {
        #[cfg(feature = "audio-io")]
        if let Some(session) = self.session.take() {
            let RecordingSession {
                stream, samples_rx, ..
            } = session;
            drop(stream);
            let discarded: usize = samples_rx.try_iter().map(|chunk| chunk.len()).sum();
            debug!("Recording cancelled, {} samples discarded", discarded);
        }
        self.reset_flags();
    }

    pub fn is_recording(&self) -> bool {
        #[cfg(feature = "audio-io")]
        {
            self.session.is_some()
        }
        #[cfg(not(feature = "audio-io"))]
        {
            false
        }
    }

    /// Duration of the recording in progress, for display.
    pub fn elapsed(&self) -> Option<Duration> {
        #[cfg(feature = "audio-io")]
        {
            self.session.as_ref().map(|s| s.started.elapsed())
        }
        #[cfg(not(feature = "audio-io"))]
        {
            None
        }
    }

    fn reset_flags(&self) {
        self.store.set_listening(false);
        self.store.set_emotion(AvatarEmotion::Neutral);
    }
}
