use std::path::PathBuf;
use std::time::Instant;

use cast_tts::{
    config::DeliveryConfig,
    device::PlayerCommandSession,
    engines::google::{GoogleEngine, GoogleVoiceParamsBuilder},
    pipeline::DeliveryPipeline,
    Credential, SynthesisEngine,
};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let credential_path = std::env::var("GOOGLE_SERVICE_ACCOUNT")
        .unwrap_or_else(|_| "service-account.json".to_string());

    let params = GoogleVoiceParamsBuilder::default()
        .language_code("en-GB")
        .voice_name("en-GB-Wavenet-B")
        .speaking_rate(0.95f32)
        .build()?;
    let engine = GoogleEngine::with_params(params);

    let text = "Hello! The washing machine has finished. \
                Please empty it before the next load.";

    let credential = Credential::load(&credential_path)?;
    let synth_start = Instant::now();
    engine.synthesize_to_file(text, &credential, &PathBuf::from("output.mp3"))?;
    println!("Synthesized to output.mp3 in {:.2?}", synth_start.elapsed());

    let pipeline = DeliveryPipeline::new(engine, DeliveryConfig::from_env());
    let mut session = PlayerCommandSession::new("mpg123").args(["-q"]);

    let deliver_start = Instant::now();
    pipeline.deliver_from_path(text, &credential_path, &mut session)?;
    println!("Delivered in {:.2?}", deliver_start.elapsed());

    Ok(())
}
