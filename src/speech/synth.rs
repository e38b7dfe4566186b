//! Speech synthesis backends.
//!
//! Synthesis is delegated to a local TTS program where one exists (`say`,
//! `espeak`). Platforms without one get a warn-and-noop backend, so callers
//! never branch on availability beyond `is_supported`.

use crate::{AuraError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Words-per-minute spoken at rate 1.0.
const BASE_WPM: f32 = 180.0;

/// Options applied to every spoken utterance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoiceOptions {
    pub language: String,
    pub pitch: f32,
    pub rate: f32,
    pub voice: Option<String>,
}

impl Default for VoiceOptions {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            pitch: 1.0,
            rate: 0.8,
            voice: None,
        }
    }
}

impl VoiceOptions {
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }
}

/// A voice made available by the synthesis backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceDescriptor {
    pub id: String,
    pub name: String,
    pub language: String,
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Whether this platform can synthesize speech at all.
    fn is_supported(&self) -> bool;

    /// Speak the text, returning once playback completes.
    async fn speak(&self, text: &str, options: &VoiceOptions) -> Result<()>;

    /// Stop any in-flight utterance.
    async fn stop(&self);

    /// Voices available to `speak`.
    fn list_voices(&self) -> Vec<VoiceDescriptor>;
}

/// Backend for platforms without speech synthesis. Every call is a no-op
/// that logs a warning.
pub struct UnsupportedSynthesizer;

#[async_trait]
impl SpeechSynthesizer for UnsupportedSynthesizer {
    fn is_supported(&self) -> bool {
        false
    }

    async fn speak(&self, _text: &str, _options: &VoiceOptions) -> Result<()> {
        warn!("Speech synthesis not supported on this platform");
        Ok(())
    }

    async fn stop(&self) {}

    fn list_voices(&self) -> Vec<VoiceDescriptor> {
        Vec::new()
    }
}

/// Synthesizes speech by running a local TTS program with the text as the
/// final argument.
pub struct CommandSynthesizer {
    program: String,
    child: Arc<Mutex<Option<Child>>>,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            child: Arc::new(Mutex::new(None)),
        }
    }

    /// Program-specific flags derived from the voice options. Unknown
    /// programs get the bare text only.
    fn args_for(&self, options: &VoiceOptions) -> Vec<String> {
        let wpm = (options.rate * BASE_WPM).round() as i32;
        let program = self
            .program
            .rsplit('/')
            .next()
            .unwrap_or(self.program.as_str());

        match program {
            "say" => {
                let mut args = vec!["-r".to_string(), wpm.to_string()];
                if let Some(voice) = &options.voice {
                    args.push("-v".to_string());
                    args.push(voice.clone());
                }
                args
            }
            "espeak" | "espeak-ng" => {
                // espeak pitch range is 0-99 with 50 as the default
                let pitch = (options.pitch * 50.0).clamp(0.0, 99.0).round() as i32;
                let voice = options
                    .voice
                    .clone()
                    .unwrap_or_else(|| options.language.to_ascii_lowercase());
                vec![
                    "-s".to_string(),
                    wpm.to_string(),
                    "-p".to_string(),
                    pitch.to_string(),
                    "-v".to_string(),
                    voice,
                ]
            }
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn speak(&self, text: &str, options: &VoiceOptions) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let child = Command::new(&self.program)
            .args(self.args_for(options))
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                AuraError::Synthesis(format!("Failed to launch {}: {}", self.program, e))
            })?;

        {
            let mut slot = self.child.lock().await;
            if let Some(mut previous) = slot.replace(child) {
                warn!("Replacing in-flight utterance");
                previous.start_kill().ok();
            }
        }

        loop {
            {
                let mut slot = self.child.lock().await;
                match slot.as_mut() {
                    // stop() took the child out from under us
                    None => return Ok(()),
                    Some(child) => match child.try_wait() {
                        Ok(Some(status)) => {
                            slot.take();
                            if status.success() {
                                return Ok(());
                            }
                            return Err(AuraError::Synthesis(format!(
                                "{} exited with {}",
                                self.program, status
                            )));
                        }
                        Ok(None) => {}
                        Err(e) => {
                            slot.take();
                            return Err(AuraError::Synthesis(format!(
                                "Failed to wait for {}: {}",
                                self.program, e
                            )));
                        }
                    },
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    async fn stop(&self) {
        let mut slot = self.child.lock().await;
        if let Some(mut child) = slot.take() {
            debug!("Stopping in-flight utterance");
            if let Err(e) = child.start_kill() {
                warn!("Failed to stop utterance: {}", e);
            }
        }
    }

    fn list_voices(&self) -> Vec<VoiceDescriptor> {
        vec![VoiceDescriptor {
            id: "default".to_string(),
            name: self.program.clone(),
            language: VoiceOptions::default().language,
        }]
    }
}

/// Pick a synthesis backend for this platform.
pub fn default_synthesizer() -> Arc<dyn SpeechSynthesizer> {
    for program in ["say", "espeak-ng", "espeak"] {
        if program_on_path(program) {
            debug!("Using '{}' for speech synthesis", program);
            return Arc::new(CommandSynthesizer::new(program));
        }
    }
    warn!("No speech synthesis program found; spoken replies disabled");
    Arc::new(UnsupportedSynthesizer)
}

fn program_on_path(program: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(program).is_file())
}
