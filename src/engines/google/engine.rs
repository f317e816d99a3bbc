use base64::Engine as _;
use derive_builder::Builder;

use crate::{Credential, SynthesisEngine, SynthesisError, SynthesisResult};

use super::account::ServiceAccount;
use super::api::{
    AudioConfig, GoogleError, SynthesisInput, SynthesizeRequest, SynthesizeResponse,
    VoiceSelection, DEFAULT_ENDPOINT, MP3_MEDIA_TYPE,
};

/// Voice and audio settings for a Google synthesis request.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default, setter(into))]
pub struct GoogleVoiceParams {
    /// BCP-47 language code (e.g. `"en-US"`, `"en-GB"`).
    pub language_code: String,
    /// Specific voice (e.g. `"en-US-Wavenet-D"`). `None` lets Google pick one
    /// matching the language and gender.
    #[builder(setter(into, strip_option))]
    pub voice_name: Option<String>,
    /// `"NEUTRAL"`, `"FEMALE"`, `"MALE"` or `"SSML_VOICE_GENDER_UNSPECIFIED"`.
    pub ssml_gender: String,
    /// Speaking rate. Range: 0.25–4.0, default 1.0.
    pub speaking_rate: f32,
    /// Pitch in semitones. Range: -20.0–20.0, default 0.0.
    pub pitch: f32,
    /// Treat the input text as SSML markup.
    pub ssml: bool,
}

impl Default for GoogleVoiceParams {
    fn default() -> Self {
        Self {
            language_code: "en-US".to_string(),
            voice_name: None,
            ssml_gender: "NEUTRAL".to_string(),
            speaking_rate: 1.0,
            pitch: 0.0,
            ssml: false,
        }
    }
}

/// Google Cloud Text-to-Speech engine.
///
/// Authenticates with the service account carried by the credential on every
/// call and returns MP3 audio.
///
/// ```rust,no_run
/// use cast_tts::{Credential, SynthesisEngine, engines::google::{GoogleEngine, GoogleVoiceParamsBuilder}};
///
/// let params = GoogleVoiceParamsBuilder::default()
///     .language_code("en-GB")
///     .speaking_rate(0.9f32)
///     .build()?;
/// let engine = GoogleEngine::with_params(params);
/// let credential = Credential::load("service-account.json")?;
/// let result = engine.synthesize("Dinner is ready", &credential)?;
/// println!("{} bytes of {}", result.audio.len(), result.media_type);
/// # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
/// ```
pub struct GoogleEngine {
    client: reqwest::blocking::Client,
    endpoint: String,
    params: GoogleVoiceParams,
}

impl Default for GoogleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleEngine {
    /// Create an engine using the default voice.
    pub fn new() -> Self {
        Self::with_params(GoogleVoiceParams::default())
    }

    pub fn with_params(params: GoogleVoiceParams) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            params,
        }
    }

    /// Send synthesis requests to another base URL (e.g. a regional endpoint).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn params(&self) -> &GoogleVoiceParams {
        &self.params
    }

    fn request_body<'a>(&'a self, text: &'a str) -> SynthesizeRequest<'a> {
        let p = &self.params;
        SynthesizeRequest {
            input: if p.ssml {
                SynthesisInput::Ssml(text)
            } else {
                SynthesisInput::Text(text)
            },
            voice: VoiceSelection {
                language_code: &p.language_code,
                name: p.voice_name.as_deref(),
                ssml_gender: &p.ssml_gender,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: p.speaking_rate,
                pitch: p.pitch,
            },
        }
    }

    fn synthesize_mp3(&self, text: &str, credential: &Credential) -> Result<Vec<u8>, GoogleError> {
        let account = ServiceAccount::from_credential(credential)?;
        let token = account.fetch_access_token(&self.client)?;

        let url = format!("{}/v1/text:synthesize", self.endpoint);
        log::debug!("POST {url} ({} bytes, voice {:?})", text.len(), self.params.voice_name);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&self.request_body(text))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GoogleError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: SynthesizeResponse = response.json()?;
        decode_audio(&body.audio_content)
    }
}

fn decode_audio(audio_content: &str) -> Result<Vec<u8>, GoogleError> {
    let audio = base64::engine::general_purpose::STANDARD.decode(audio_content)?;
    if audio.is_empty() {
        return Err(GoogleError::NoAudio);
    }
    Ok(audio)
}

impl SynthesisEngine for GoogleEngine {
    fn synthesize(
        &self,
        text: &str,
        credential: &Credential,
    ) -> Result<SynthesisResult, SynthesisError> {
        let audio = self.synthesize_mp3(text, credential)?;
        log::info!("Synthesized {} bytes of MP3 audio", audio.len());
        Ok(SynthesisResult {
            audio,
            media_type: MP3_MEDIA_TYPE.to_string(),
        })
    }
}
