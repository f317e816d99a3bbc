use serde::{Deserialize, Serialize};

/// Public Text-to-Speech REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://texttospeech.googleapis.com";

/// OAuth2 token endpoint used when the service account does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Scope requested for the access token.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Media type of `MP3` encoded responses.
pub const MP3_MEDIA_TYPE: &str = "audio/mp3";

#[derive(thiserror::Error, Debug)]
pub enum GoogleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to sign token assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid service account: {0}")]
    ServiceAccount(String),
    #[error("Google API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Invalid audio content: {0}")]
    AudioDecode(#[from] base64::DecodeError),
    #[error("Google returned no audio content")]
    NoAudio,
}

/// Body of `POST /v1/text:synthesize`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeRequest<'a> {
    pub input: SynthesisInput<'a>,
    pub voice: VoiceSelection<'a>,
    pub audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisInput<'a> {
    Text(&'a str),
    Ssml(&'a str),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSelection<'a> {
    pub language_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub ssml_gender: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    pub audio_encoding: &'static str,
    pub speaking_rate: f32,
    pub pitch: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeResponse {
    #[serde(default)]
    pub audio_content: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}
