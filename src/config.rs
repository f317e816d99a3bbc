use std::path::PathBuf;

use derive_builder::Builder;

/// Media type declared to the device for every staged artifact.
pub const MEDIA_TYPE_MP3: &str = "audio/mp3";

/// Environment variable overriding [`DeliveryConfig::staging_dir`].
pub const STAGING_DIR_ENV: &str = "CAST_TTS_STAGING_DIR";

/// Settings for staging and handing off synthesized audio.
///
/// ```rust
/// use cast_tts::config::DeliveryConfigBuilder;
///
/// let config = DeliveryConfigBuilder::default()
///     .staging_dir("/var/tmp")
///     .file_prefix("doorbell")
///     .build()?;
/// assert_eq!(config.media_type, "audio/mp3");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default, setter(into))]
pub struct DeliveryConfig {
    /// Directory holding staged artifacts. Must be readable by the device
    /// session that fetches them.
    pub staging_dir: PathBuf,
    /// Prefix of each staged file name; a random part is appended.
    pub file_prefix: String,
    pub file_suffix: String,
    /// Declared media type of the staged audio.
    pub media_type: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            staging_dir: std::env::temp_dir(),
            file_prefix: "cast-tts".to_string(),
            file_suffix: ".mp3".to_string(),
            media_type: MEDIA_TYPE_MP3.to_string(),
        }
    }
}

impl DeliveryConfig {
    /// Defaults, with the staging directory taken from
    /// `CAST_TTS_STAGING_DIR` when it is set and non-empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = std::env::var_os(STAGING_DIR_ENV).filter(|d| !d.is_empty()) {
            config.staging_dir = PathBuf::from(dir);
        }
        config
    }
}
