//! # cast-tts
//!
//! Speak a text message on a playback device: synthesize it with a
//! text-to-speech service, stage the audio where the device can read it,
//! hand it off, and clean the staged file up again.
//!
//! ## Features
//!
//! - **Google Cloud Text-to-Speech**: service-account authenticated MP3 synthesis
//! - **Leak-free staging**: staged artifacts are removed on every exit path
//! - **Pluggable devices**: anything implementing [`device::DeviceSession`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cast_tts::{
//!     config::DeliveryConfig, device::PlayerCommandSession, engines::google::GoogleEngine,
//!     pipeline::DeliveryPipeline,
//! };
//!
//! let pipeline = DeliveryPipeline::new(GoogleEngine::new(), DeliveryConfig::default());
//! let mut session = PlayerCommandSession::new("mpg123");
//! pipeline.deliver_from_path("Hello, World!", "service-account.json", &mut session)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod credential;
pub mod device;
pub mod engines;
pub mod error;
pub mod pipeline;
pub mod staging;

pub use credential::Credential;
pub use error::{SessionError, SynthesisError, TtsError};

use std::path::Path;

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains the encoded audio exactly as the service returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisResult {
    /// Encoded audio bytes
    pub audio: Vec<u8>,
    /// Media type of `audio` (`audio/mp3` for the Google engine)
    pub media_type: String,
}

impl SynthesisResult {
    /// Write the encoded audio to a file.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.audio)
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// One call performs one request against the engine's service; engines
/// never retry and keep no state between calls.
#[cfg_attr(test, mockall::automock)]
pub trait SynthesisEngine {
    /// Synthesize speech for `text`, authorized by `credential`.
    fn synthesize(
        &self,
        text: &str,
        credential: &Credential,
    ) -> Result<SynthesisResult, SynthesisError>;

    /// Synthesize speech and write the encoded audio to a file.
    ///
    /// Default implementation calls `synthesize()` then `SynthesisResult::write_to()`.
    fn synthesize_to_file(
        &self,
        text: &str,
        credential: &Credential,
        path: &Path,
    ) -> Result<(), SynthesisError> {
        self.synthesize(text, credential)?.write_to(path)?;
        Ok(())
    }
}
