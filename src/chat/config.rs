//! Central configuration for the assistant.

use crate::llm::LlmConfig;
use crate::speech::VoiceOptions;

/// Configuration for the complete assistant
#[derive(Clone, Debug)]
pub struct AssistantConfig {
    /// LLM configuration
    pub llm: LlmConfig,

    /// Voice options applied to spoken replies
    pub voice: VoiceOptions,

    /// Speak assistant replies to text submissions
    pub speak_replies: bool,

    /// Merge streaming fragments into the transcript instead of waiting
    /// for the complete reply
    pub streaming_replies: bool,

    /// Build prompts from prior transcript turns instead of the raw input
    pub context_replies: bool,

    /// Whether to enable microphone capture
    pub enable_voice_capture: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            voice: VoiceOptions::default(),
            speak_replies: false,
            streaming_replies: false,
            context_replies: false,
            enable_voice_capture: true,
        }
    }
}

impl AssistantConfig {
    /// Configuration from the environment: the API key plus the
    /// `AURA_SPEAK` / `AURA_STREAM` / `AURA_CONTEXT` toggles.
    pub fn from_env() -> Self {
        let flag = |name: &str| {
            std::env::var(name)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };

        Self {
            llm: LlmConfig::from_env(),
            speak_replies: flag("AURA_SPEAK"),
            streaming_replies: flag("AURA_STREAM"),
            context_replies: flag("AURA_CONTEXT"),
            ..Default::default()
        }
    }

    pub fn with_llm(mut self, llm: LlmConfig) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_voice(mut self, voice: VoiceOptions) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_speech_output(mut self) -> Self {
        self.speak_replies = true;
        self
    }

    pub fn with_streaming(mut self) -> Self {
        self.streaming_replies = true;
        self
    }

    pub fn with_context(mut self) -> Self {
        self.context_replies = true;
        self
    }

    pub fn without_voice_capture(mut self) -> Self {
        self.enable_voice_capture = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.llm.validate()
    }
}
