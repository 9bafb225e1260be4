use serde::Deserialize;

/// Model catalog and startup selection
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelsConfig {
    /// Model loaded when the process starts
    #[serde(default = "default_model")]
    pub default_model: Option<String>,
    /// Identifiers always advertised, in order
    #[serde(default)]
    pub available: Vec<String>,
    /// Engine arguments that print further identifiers. Empty disables discovery.
    #[serde(default = "default_list_args")]
    pub list_args: Vec<String>,
    /// Only discovered identifiers with this prefix are advertised
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            available: Vec::new(),
            list_args: default_list_args(),
            prefix: default_prefix(),
        }
    }
}

#[allow(clippy::unnecessary_wraps)]
fn default_model() -> Option<String> {
    Some("tts_models/en/ljspeech/tacotron2-DDC".to_string())
}

fn default_list_args() -> Vec<String> {
    vec!["--list_models".to_string()]
}

fn default_prefix() -> String {
    "tts_models/".to_string()
}
