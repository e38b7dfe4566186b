//! Speech synthesis seam and backends.

pub mod synth;

pub use synth::{
    default_synthesizer, CommandSynthesizer, SpeechSynthesizer, UnsupportedSynthesizer,
    VoiceDescriptor, VoiceOptions,
};
