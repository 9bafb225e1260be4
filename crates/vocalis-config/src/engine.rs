use serde::Deserialize;

/// External synthesis engine driven as a command-line program
///
/// Every argument list is a template. The placeholders `{model}`, `{text}`,
/// `{output}`, `{speaker}`, `{language}`, `{reference}` and `{speed}` are
/// substituted per invocation. Defaults target the Coqui `tts` CLI.
///
/// The program is started once per request, so it reloads the model
/// checkpoint every time. For production latency point `command` at a thin
/// client of a long-running engine process, or implement `EngineLoader`
/// against one directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Executable name or path
    #[serde(default = "default_command")]
    pub command: String,
    /// Base arguments for one synthesis run
    #[serde(default = "default_synthesize_args")]
    pub synthesize_args: Vec<String>,
    /// Appended when a speaker is passed through
    #[serde(default = "default_speaker_args")]
    pub speaker_args: Vec<String>,
    /// Appended when a language is passed through
    #[serde(default = "default_language_args")]
    pub language_args: Vec<String>,
    /// Appended when a reference recording is supplied
    #[serde(default = "default_reference_args")]
    pub reference_args: Vec<String>,
    /// Appended when speed differs from 1.0. Empty means the engine has no speed control.
    #[serde(default)]
    pub speed_args: Vec<String>,
    /// Lists the speakers a model declares. Empty disables speaker introspection.
    #[serde(default = "default_list_speakers_args")]
    pub list_speakers_args: Vec<String>,
    /// Lists the languages a model declares. Empty disables language introspection.
    #[serde(default = "default_list_languages_args")]
    pub list_languages_args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            synthesize_args: default_synthesize_args(),
            speaker_args: default_speaker_args(),
            language_args: default_language_args(),
            reference_args: default_reference_args(),
            speed_args: Vec::new(),
            list_speakers_args: default_list_speakers_args(),
            list_languages_args: default_list_languages_args(),
        }
    }
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn default_command() -> String {
    "tts".to_string()
}

fn default_synthesize_args() -> Vec<String> {
    args(&["--model_name", "{model}", "--text", "{text}", "--out_path", "{output}"])
}

fn default_speaker_args() -> Vec<String> {
    args(&["--speaker_idx", "{speaker}"])
}

fn default_language_args() -> Vec<String> {
    args(&["--language_idx", "{language}"])
}

fn default_reference_args() -> Vec<String> {
    args(&["--speaker_wav", "{reference}"])
}

fn default_list_speakers_args() -> Vec<String> {
    args(&["--model_name", "{model}", "--list_speaker_idxs"])
}

fn default_list_languages_args() -> Vec<String> {
    args(&["--model_name", "{model}", "--list_language_idxs"])
}
