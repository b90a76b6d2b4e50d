//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Microphone capture (getUserMedia + MediaRecorder on web)
//! - Platform errors shown to the player

#[cfg(target_arch = "wasm32")]
pub mod mic;

#[cfg(target_arch = "wasm32")]
pub use mic::Microphone;

/// Errors from browser collaborators. None of these touch the round state;
/// the game just stays idle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("no browser window available")]
    NoWindow,

    #[error("microphone is not available in this browser")]
    MicrophoneUnavailable,

    #[error("microphone permission was denied")]
    MicrophoneDenied,

    #[error("media recorder failed: {0}")]
    Recorder(String),
}

impl PlatformError {
    /// Text for the blocking notification shown to the player
    pub fn user_message(&self) -> &'static str {
        match self {
            PlatformError::MicrophoneDenied => {
                "Microphone access is required. Please allow microphone access in your browser settings."
            }
            PlatformError::MicrophoneUnavailable | PlatformError::NoWindow => {
                "Microphone initialization failed."
            }
            PlatformError::Recorder(_) => "Recording failed. Please try again.",
        }
    }

    /// Whether the player can fix this by granting permission and retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlatformError::MicrophoneDenied | PlatformError::Recorder(_))
    }
}
