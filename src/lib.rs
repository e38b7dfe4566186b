pub mod audio;
pub mod chat;
pub mod conversation;
pub mod llm;
pub mod speech;
pub mod theme;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AuraError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AuraError {
    fn from(e: std::io::Error) -> Self {
        AuraError::Io(e.to_string())
    }
}

impl AuraError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Typically transient: the next round-trip may succeed
            AuraError::Generation(_) => true,
            AuraError::Synthesis(_) => true,
            AuraError::Persistence(_) => true,
            // Missing devices or settings require user intervention
            AuraError::Capture(_) => false,
            AuraError::Config(_) => false,
            AuraError::Io(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            AuraError::Generation(_) => {
                "AI response generation failed. Please try again.".to_string()
            }
            AuraError::Synthesis(_) => {
                "Speech output failed. The reply is shown as text.".to_string()
            }
            AuraError::Capture(_) => {
                "Voice recording is not available. Please check your microphone and permissions."
                    .to_string()
            }
            AuraError::Persistence(_) => {
                "Settings could not be saved. They will apply for this session only.".to_string()
            }
            AuraError::Config(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            AuraError::Io(_) => {
                "File system error occurred.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AuraError>;
