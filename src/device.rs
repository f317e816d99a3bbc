//! Device sessions that play staged artifacts.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::SessionError;

/// Instruction to fetch and play one staged artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadInstruction {
    /// Path under which the device can read the artifact.
    pub location: String,
    pub media_type: String,
    /// When set, the device should only load the media without starting it.
    pub suppress_autoplay: bool,
}

/// An already connected playback target.
///
/// Implementations must not return before they are done reading the
/// artifact: it is removed as soon as `load` returns.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceSession {
    fn load(&mut self, instruction: &LoadInstruction) -> Result<(), SessionError>;
}

#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    #[error("unsupported media type '{0}'")]
    UnsupportedMediaType(String),
    #[error("artifact {0} does not exist")]
    MissingArtifact(PathBuf),
    #[error("player '{0}' not found")]
    PlayerNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("player exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
}

/// Hands artifacts to a local player program.
///
/// The artifact location is appended as the last argument, and `load`
/// blocks until the player exits.
///
/// ```rust,no_run
/// use cast_tts::device::{DeviceSession, LoadInstruction, PlayerCommandSession};
///
/// let mut session = PlayerCommandSession::new("ffplay").args(["-nodisp", "-autoexit"]);
/// session.load(&LoadInstruction {
///     location: "/tmp/cast-tts1234.mp3".to_string(),
///     media_type: "audio/mp3".to_string(),
///     suppress_autoplay: false,
/// })?;
/// # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
/// ```
#[derive(Debug, Clone)]
pub struct PlayerCommandSession {
    program: String,
    args: Vec<String>,
}

impl PlayerCommandSession {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the artifact location.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn play(&self, location: &Path) -> Result<(), PlayerError> {
        log::info!("Playing {} with {}", location.display(), self.program);
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(location)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PlayerError::PlayerNotFound(self.program.clone())
                } else {
                    PlayerError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(PlayerError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

impl DeviceSession for PlayerCommandSession {
    fn load(&mut self, instruction: &LoadInstruction) -> Result<(), SessionError> {
        if !instruction.media_type.starts_with("audio/") {
            return Err(PlayerError::UnsupportedMediaType(instruction.media_type.clone()).into());
        }
        let location = Path::new(&instruction.location);
        if !location.is_file() {
            return Err(PlayerError::MissingArtifact(location.to_path_buf()).into());
        }
        if instruction.suppress_autoplay {
            log::info!("Loaded {} without autoplay", location.display());
            return Ok(());
        }
        Ok(self.play(location)?)
    }
}
