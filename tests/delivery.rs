use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cast_tts::config::DeliveryConfigBuilder;
use cast_tts::device::{DeviceSession, LoadInstruction, PlayerCommandSession};
use cast_tts::pipeline::{DeliveryPipeline, SynthesisRequest};
use cast_tts::{Credential, SessionError, SynthesisEngine, SynthesisError, SynthesisResult, TtsError};

/// Engine returning a fixed MP3 payload and counting its calls.
struct CannedEngine {
    audio: Vec<u8>,
    calls: AtomicUsize,
}

impl CannedEngine {
    fn new(len: usize) -> Self {
        Self {
            audio: vec![0xFB; len],
            calls: AtomicUsize::new(0),
        }
    }
}

impl SynthesisEngine for CannedEngine {
    fn synthesize(&self, _text: &str, _credential: &Credential) -> Result<SynthesisResult, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SynthesisResult {
            audio: self.audio.clone(),
            media_type: "audio/mp3".to_string(),
        })
    }
}

/// Session remembering every location it was asked to load.
#[derive(Default, Clone)]
struct RecordingSession {
    loads: Arc<Mutex<Vec<LoadInstruction>>>,
    fail_with: Option<&'static str>,
}

impl DeviceSession for RecordingSession {
    fn load(&mut self, instruction: &LoadInstruction) -> Result<(), SessionError> {
        assert!(Path::new(&instruction.location).is_file());
        self.loads.lock().unwrap().push(instruction.clone());
        match self.fail_with {
            Some(reason) => Err(reason.into()),
            None => Ok(()),
        }
    }
}

fn pipeline_in(dir: &Path, engine: CannedEngine) -> DeliveryPipeline<CannedEngine> {
    let config = DeliveryConfigBuilder::default()
        .staging_dir(dir)
        .build()
        .unwrap();
    DeliveryPipeline::new(engine, config)
}

fn request() -> SynthesisRequest {
    SynthesisRequest::new("Hello, World!", Credential::from(b"{}".to_vec())).unwrap()
}

fn staged_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

#[test]
fn successful_run_leaves_nothing_staged() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(dir.path(), CannedEngine::new(4096));
    let mut session = RecordingSession::default();

    pipeline.deliver(&request(), &mut session).unwrap();

    let loads = session.loads.lock().unwrap();
    assert_eq!(loads.len(), 1);
    assert!(loads[0].location.starts_with(dir.path().to_str().unwrap()));
    assert_eq!(loads[0].media_type, "audio/mp3");
    assert!(!loads[0].suppress_autoplay);
    assert_eq!(pipeline.engine().calls.load(Ordering::SeqCst), 1);
    assert!(staged_files(dir.path()).is_empty());
}

#[test]
fn failed_hand_off_leaves_nothing_staged() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(dir.path(), CannedEngine::new(4096));
    let mut session = RecordingSession {
        fail_with: Some("device offline"),
        ..Default::default()
    };

    let err = pipeline.deliver(&request(), &mut session).unwrap_err();

    assert!(matches!(err, TtsError::Delivery(_)));
    assert!(err.to_string().contains("device offline"));
    assert_eq!(session.loads.lock().unwrap().len(), 1);
    assert_eq!(pipeline.engine().calls.load(Ordering::SeqCst), 1);
    assert!(staged_files(dir.path()).is_empty());
}

#[test]
fn unusable_staging_dir_is_create_error() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(&dir.path().join("missing"), CannedEngine::new(16));
    let mut session = RecordingSession::default();

    let err = pipeline.deliver(&request(), &mut session).unwrap_err();

    assert!(matches!(err, TtsError::StagingCreate(_)));
    assert!(session.loads.lock().unwrap().is_empty());
}

#[cfg(unix)]
#[test]
fn non_utf8_staging_dir_is_create_error() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join(OsStr::from_bytes(b"stag\xffing"));
    std::fs::create_dir(&dir).unwrap();
    let pipeline = pipeline_in(&dir, CannedEngine::new(4096));
    let mut session = RecordingSession::default();

    let err = pipeline.deliver(&request(), &mut session).unwrap_err();

    assert!(matches!(err, TtsError::StagingCreate(_)));
    assert!(session.loads.lock().unwrap().is_empty());
    assert!(staged_files(&dir).is_empty());
}

#[test]
fn missing_credential_path_runs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(dir.path(), CannedEngine::new(16));
    let mut session = RecordingSession::default();

    let err = pipeline
        .deliver_from_path("Hello, World!", "", &mut session)
        .unwrap_err();

    assert!(matches!(err, TtsError::MissingCredential));
    assert_eq!(pipeline.engine().calls.load(Ordering::SeqCst), 0);
    assert!(session.loads.lock().unwrap().is_empty());
    assert!(staged_files(dir.path()).is_empty());
}

#[test]
fn concurrent_runs_stage_distinct_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Arc::new(pipeline_in(dir.path(), CannedEngine::new(1024)));
    let session = RecordingSession::default();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            let mut session = session.clone();
            std::thread::spawn(move || pipeline.deliver(&request(), &mut session))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let mut locations: Vec<String> = session
        .loads
        .lock()
        .unwrap()
        .iter()
        .map(|load| load.location.clone())
        .collect();
    locations.sort();
    locations.dedup();
    assert_eq!(locations.len(), 8);
    assert_eq!(pipeline.engine().calls.load(Ordering::SeqCst), 8);
    assert!(staged_files(dir.path()).is_empty());
}

#[cfg(unix)]
#[test]
fn player_session_reads_complete_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_in(dir.path(), CannedEngine::new(4096));
    // Succeeds only when the staged file holds all 4096 bytes.
    let mut session = PlayerCommandSession::new("sh")
        .args(["-c", "test \"$(wc -c < \"$1\")\" -eq 4096", "sh"]);

    pipeline.deliver(&request(), &mut session).unwrap();

    assert!(staged_files(dir.path()).is_empty());
}
