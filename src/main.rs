use std::path::PathBuf;

use cast_tts::config::DeliveryConfig;
use cast_tts::device::PlayerCommandSession;
use cast_tts::engines::google::{GoogleEngine, GoogleVoiceParams};
use cast_tts::pipeline::{DeliveryPipeline, SynthesisRequest};
use cast_tts::{Credential, SynthesisEngine, TtsError};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cast-tts")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Speak text on a playback device")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// text-to-speech
    Tts(TtsArgs),
}

#[derive(Args, Debug)]
struct TtsArgs {
    /// Message to convert to speech
    #[arg(value_name = "MESSAGE")]
    message: Vec<String>,

    /// Google service account JSON file
    #[arg(long, value_name = "FILE", default_value = "")]
    google_service_account: String,

    /// Voice language (BCP-47)
    #[arg(long, default_value = "en-US")]
    language_code: String,

    /// Specific Google voice, e.g. en-US-Wavenet-D
    #[arg(long)]
    voice_name: Option<String>,

    /// NEUTRAL, FEMALE or MALE
    #[arg(long, default_value = "NEUTRAL")]
    ssml_gender: String,

    #[arg(long, default_value_t = 1.0)]
    speaking_rate: f32,

    /// Pitch in semitones
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pitch: f32,

    /// Treat MESSAGE as SSML
    #[arg(long)]
    ssml: bool,

    /// Program that plays the staged audio file
    #[arg(long, default_value = "mpg123")]
    player: String,

    /// Argument passed to the player before the file (repeatable)
    #[arg(long = "player-arg", value_name = "ARG", allow_hyphen_values = true)]
    player_args: Vec<String>,

    /// Directory for staged audio (defaults to $CAST_TTS_STAGING_DIR or the temp dir)
    #[arg(long, value_name = "DIR")]
    staging_dir: Option<PathBuf>,

    /// Write the synthesized MP3 here instead of playing it
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl TtsArgs {
    fn voice_params(&self) -> GoogleVoiceParams {
        GoogleVoiceParams {
            language_code: self.language_code.clone(),
            voice_name: self.voice_name.clone(),
            ssml_gender: self.ssml_gender.clone(),
            speaking_rate: self.speaking_rate,
            pitch: self.pitch,
            ssml: self.ssml,
        }
    }

    fn delivery_config(&self) -> DeliveryConfig {
        let mut config = DeliveryConfig::from_env();
        if let Some(dir) = &self.staging_dir {
            config.staging_dir = dir.clone();
        }
        config
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Tts(args) => tts(args),
    }
}

/// Usage problems and pipeline failures are reported on stdout and the
/// process still exits successfully.
fn tts(args: TtsArgs) {
    let [message] = args.message.as_slice() else {
        println!("expected exactly one argument to convert to speech");
        return;
    };

    let engine = GoogleEngine::with_params(args.voice_params());
    let outcome = match &args.output {
        Some(path) => save(&engine, message, &args.google_service_account, path),
        None => {
            let pipeline = DeliveryPipeline::new(engine, args.delivery_config());
            let mut session =
                PlayerCommandSession::new(args.player.as_str()).args(args.player_args.iter().cloned());
            pipeline.deliver_from_path(message, &args.google_service_account, &mut session)
        }
    };

    if let Err(e) = outcome {
        println!("{}", describe(&e));
    }
}

fn save(
    engine: &GoogleEngine,
    message: &str,
    credential_path: &str,
    path: &std::path::Path,
) -> Result<(), TtsError> {
    let credential = Credential::load(credential_path)?;
    let request = SynthesisRequest::new(message, credential)?;
    engine
        .synthesize_to_file(request.text(), request.credential(), path)
        .map_err(TtsError::Synthesis)?;
    log::info!("Saved speech to {}", path.display());
    Ok(())
}

fn describe(err: &TtsError) -> String {
    match err {
        TtsError::MissingCredential => "--google-service-account is required".to_string(),
        TtsError::CredentialRead { source, .. } => {
            format!("unable to open google service account file: {source}")
        }
        TtsError::EmptyText => "expected exactly one argument to convert to speech".to_string(),
        TtsError::Synthesis(e) => format!("unable to synthesize speech: {e}"),
        TtsError::StagingCreate(e) => format!("unable to create temp file: {e}"),
        TtsError::StagingWrite(e) => format!("unable to write to temp file: {e}"),
        TtsError::StagingFinalize(e) => format!("unable to close temp file: {e}"),
        TtsError::Delivery(e) => format!("unable to load media to device: {e}"),
    }
}
