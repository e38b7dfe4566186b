//! Microphone capture and WAV plumbing.

pub mod capture;
pub mod wav;

pub use capture::{RecordingHandle, VoiceCapture};
pub use wav::{read_wav, write_wav};
