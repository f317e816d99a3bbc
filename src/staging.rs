//! Transient storage for synthesized audio.
//!
//! An [`ArtifactStore`] hands out fresh, uniquely named locations that a
//! device session can read by path, each paired with the handle used to fill
//! it. [`StagedArtifact`] owns one location and its handle, and removes the
//! location on every exit path: explicitly through
//! [`StagedArtifact::release`], or from `Drop` when a phase bails out early.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::DeliveryConfig;
use crate::device::{DeviceSession, LoadInstruction};
use crate::error::{SessionError, TtsError};

/// Location of a staged artifact, as a device session would address it.
///
/// Always valid UTF-8, so the address handed to a device names exactly the
/// file that was staged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StagedLocation(String);

impl StagedLocation {
    /// Fails with [`io::ErrorKind::InvalidData`] if `path` is not UTF-8.
    pub fn new(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        match path.into_os_string().into_string() {
            Ok(location) => Ok(Self(location)),
            Err(raw) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("staging path {} is not valid UTF-8", Path::new(&raw).display()),
            )),
        }
    }

    pub fn path(&self) -> &Path {
        Path::new(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StagedLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage backend for staged artifacts.
///
/// `create` must atomically reserve a location no other caller can obtain and
/// return the handle that writes to it; the handle belongs to the caller alone.
/// `remove` must succeed for a location that was created but never written.
pub trait ArtifactStore {
    type Handle;

    fn create(&self) -> io::Result<(StagedLocation, Self::Handle)>;

    fn write(&self, handle: &mut Self::Handle, bytes: &[u8]) -> io::Result<()>;

    /// Flush and close the handle so readers observe all written bytes.
    fn finalize(&self, handle: Self::Handle) -> io::Result<()>;

    fn remove(&self, location: &StagedLocation) -> io::Result<()>;
}

/// Stages artifacts as files in a local directory.
///
/// Files are created exclusively with a random name, so concurrent
/// deliveries sharing one store never collide. The store itself is
/// immutable; each open file lives with the artifact that created it.
#[derive(Debug, Clone)]
pub struct TempDirStore {
    dir: PathBuf,
    prefix: String,
    suffix: String,
}

impl TempDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let config = DeliveryConfig::default();
        Self {
            dir: dir.into(),
            prefix: config.file_prefix,
            suffix: config.file_suffix,
        }
    }

    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self {
            dir: config.staging_dir.clone(),
            prefix: config.file_prefix.clone(),
            suffix: config.file_suffix.clone(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactStore for TempDirStore {
    type Handle = File;

    fn create(&self) -> io::Result<(StagedLocation, File)> {
        let named = tempfile::Builder::new()
            .prefix(&self.prefix)
            .suffix(&self.suffix)
            .tempfile_in(&self.dir)?;
        // Dropping `named` on a rejected path deletes the file again.
        let location = StagedLocation::new(named.path())?;
        let (file, _) = named.keep().map_err(|e| e.error)?;
        Ok((location, file))
    }

    fn write(&self, file: &mut File, bytes: &[u8]) -> io::Result<()> {
        file.write_all(bytes)
    }

    fn finalize(&self, mut file: File) -> io::Result<()> {
        file.flush()?;
        file.sync_all()
    }

    fn remove(&self, location: &StagedLocation) -> io::Result<()> {
        match std::fs::remove_file(location.path()) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Lifecycle of a staged artifact. Every path ends in `Released`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Created,
    Written,
    Finalized,
    HandedOff,
    Released,
}

/// Guard owning one staged location, and its handle until finalized, from
/// creation until removal.
pub struct StagedArtifact<'a, A: ArtifactStore + ?Sized> {
    store: &'a A,
    location: StagedLocation,
    handle: Option<A::Handle>,
    state: StageState,
}

impl<'a, A: ArtifactStore + ?Sized> StagedArtifact<'a, A> {
    /// Reserve a fresh location. Nothing exists to release if this fails.
    pub fn acquire(store: &'a A) -> Result<Self, TtsError> {
        let (location, handle) = store.create().map_err(TtsError::StagingCreate)?;
        log::debug!("Staged artifact created at {location}");
        Ok(Self {
            store,
            location,
            handle: Some(handle),
            state: StageState::Created,
        })
    }

    pub fn location(&self) -> &StagedLocation {
        &self.location
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<(), TtsError> {
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| closed(&self.location))
            .map_err(TtsError::StagingWrite)?;
        self.store
            .write(handle, bytes)
            .map_err(TtsError::StagingWrite)?;
        self.advance(StageState::Written);
        Ok(())
    }

    pub fn finalize(&mut self) -> Result<(), TtsError> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| closed(&self.location))
            .map_err(TtsError::StagingFinalize)?;
        self.store
            .finalize(handle)
            .map_err(TtsError::StagingFinalize)?;
        self.advance(StageState::Finalized);
        Ok(())
    }

    /// Issue exactly one load instruction for this artifact.
    ///
    /// The artifact counts as handed off once the instruction was issued,
    /// whatever the session reports back.
    pub fn hand_off<D>(
        &mut self,
        session: &mut D,
        media_type: &str,
        suppress_autoplay: bool,
    ) -> Result<(), TtsError>
    where
        D: DeviceSession + ?Sized,
    {
        let instruction = LoadInstruction {
            location: self.location.as_str().to_string(),
            media_type: media_type.to_string(),
            suppress_autoplay,
        };
        let outcome: Result<(), SessionError> = session.load(&instruction);
        self.advance(StageState::HandedOff);
        outcome.map_err(TtsError::Delivery)
    }

    /// Remove the artifact now. Removal failures are logged, not returned,
    /// so they never mask the outcome of an earlier phase.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if self.state == StageState::Released {
            return;
        }
        // Close a handle left open by a failed write before unlinking.
        drop(self.handle.take());
        if let Err(e) = self.store.remove(&self.location) {
            log::warn!("Failed to remove staged artifact {}: {e}", self.location);
        }
        self.advance(StageState::Released);
    }

    fn advance(&mut self, next: StageState) {
        log::debug!("{}: {:?} -> {:?}", self.location, self.state, next);
        self.state = next;
    }
}

impl<A: ArtifactStore + ?Sized> Drop for StagedArtifact<'_, A> {
    fn drop(&mut self) {
        self.release_inner();
    }
}

fn closed(location: &StagedLocation) -> io::Error {
    io::Error::other(format!("{location} is no longer open for writing"))
}
