use std::path::PathBuf;

/// Boxed error reported by a [`SynthesisEngine`](crate::SynthesisEngine).
pub type SynthesisError = Box<dyn std::error::Error + Send + Sync>;

/// Boxed error reported by a [`DeviceSession`](crate::device::DeviceSession).
pub type SessionError = Box<dyn std::error::Error + Send + Sync>;

/// Failures of a single delivery run, one variant per pipeline phase.
///
/// Callers match on the variant to render a phase-specific message; none of
/// them is retried by the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum TtsError {
    #[error("no credential path supplied")]
    MissingCredential,
    #[error("unable to open credential file {}: {source}", path.display())]
    CredentialRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("expected a non-empty message to convert to speech")]
    EmptyText,
    #[error("speech synthesis failed: {0}")]
    Synthesis(#[source] SynthesisError),
    #[error("unable to create staged artifact: {0}")]
    StagingCreate(#[source] std::io::Error),
    #[error("unable to write staged artifact: {0}")]
    StagingWrite(#[source] std::io::Error),
    #[error("unable to finalize staged artifact: {0}")]
    StagingFinalize(#[source] std::io::Error),
    #[error("unable to load media to device: {0}")]
    Delivery(#[source] SessionError),
}
