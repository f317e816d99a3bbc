//! Synthesize, stage and hand off one message.
//!
//! A run walks strictly through credential acquisition, synthesis, staging
//! and hand-off. Any failure ends the run with the matching [`TtsError`]
//! variant; once an artifact is staged it is removed before `deliver`
//! returns, whichever way it returns.

use crate::config::DeliveryConfig;
use crate::device::DeviceSession;
use crate::error::TtsError;
use crate::staging::{ArtifactStore, StagedArtifact, TempDirStore};
use crate::{Credential, SynthesisEngine};

/// One message to speak, with the credential authorizing its synthesis.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    text: String,
    credential: Credential,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, credential: Credential) -> Result<Self, TtsError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(TtsError::EmptyText);
        }
        Ok(Self { text, credential })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

/// Stateless driver of the delivery pipeline.
///
/// A pipeline can serve any number of runs, sequentially or from several
/// threads. The engine and store are only read; every run stages its own
/// uniquely named artifact through a handle no other run can reach.
pub struct DeliveryPipeline<E, A = TempDirStore> {
    engine: E,
    store: A,
    media_type: String,
}

impl<E: SynthesisEngine> DeliveryPipeline<E, TempDirStore> {
    /// Pipeline staging files as described by `config`.
    pub fn new(engine: E, config: DeliveryConfig) -> Self {
        Self {
            engine,
            store: TempDirStore::from_config(&config),
            media_type: config.media_type,
        }
    }
}

impl<E: SynthesisEngine, A: ArtifactStore> DeliveryPipeline<E, A> {
    /// Pipeline staging through a custom store.
    pub fn with_store(engine: E, store: A, config: &DeliveryConfig) -> Self {
        Self {
            engine,
            store,
            media_type: config.media_type.clone(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn store(&self) -> &A {
        &self.store
    }

    /// Read the credential at `credential_path`, then [`deliver`](Self::deliver).
    ///
    /// An empty path fails with [`TtsError::MissingCredential`] without
    /// touching the filesystem, the engine or the store.
    pub fn deliver_from_path<D>(
        &self,
        text: &str,
        credential_path: &str,
        session: &mut D,
    ) -> Result<(), TtsError>
    where
        D: DeviceSession + ?Sized,
    {
        let credential = Credential::load(credential_path)?;
        let request = SynthesisRequest::new(text, credential)?;
        self.deliver(&request, session)
    }

    /// Synthesize the request's text and have `session` play it.
    pub fn deliver<D>(&self, request: &SynthesisRequest, session: &mut D) -> Result<(), TtsError>
    where
        D: DeviceSession + ?Sized,
    {
        let result = self
            .engine
            .synthesize(request.text(), request.credential())
            .map_err(TtsError::Synthesis)?;
        if result.is_empty() {
            return Err(TtsError::Synthesis("synthesis returned no audio".into()));
        }
        log::info!(
            "Synthesized {} bytes for a {}-byte message",
            result.audio.len(),
            request.text().len()
        );

        let mut artifact = StagedArtifact::acquire(&self.store)?;
        let outcome = stage_and_hand_off(&mut artifact, &result.audio, session, &self.media_type);
        artifact.release();

        match &outcome {
            Ok(()) => log::info!("Delivered message to device"),
            Err(e) => log::warn!("Delivery aborted: {e}"),
        }
        outcome
    }
}

fn stage_and_hand_off<A, D>(
    artifact: &mut StagedArtifact<'_, A>,
    audio: &[u8],
    session: &mut D,
    media_type: &str,
) -> Result<(), TtsError>
where
    A: ArtifactStore + ?Sized,
    D: DeviceSession + ?Sized,
{
    artifact.write(audio)?;
    artifact.finalize()?;
    artifact.hand_off(session, media_type, false)
}
