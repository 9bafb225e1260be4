use serde::Deserialize;

/// External transcoder that normalizes uploaded reference recordings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranscoderConfig {
    /// Executable name or path
    #[serde(default = "default_command")]
    pub command: String,
    /// Target sample rate of the canonical container
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Target channel count of the canonical container
    #[serde(default = "default_channels")]
    pub channels: u16,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
        }
    }
}

fn default_command() -> String {
    "ffmpeg".to_string()
}

const fn default_sample_rate() -> u32 {
    22_050
}

const fn default_channels() -> u16 {
    1
}
