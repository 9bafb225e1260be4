use std::{
    process::{ExitStatus, Stdio},
    sync::OnceLock,
};

use async_trait::async_trait;
use indexmap::IndexSet;
use regex::{Captures, Regex};
use tokio::process::Command;
use vocalis_config::EngineConfig;

use super::{EngineInvocation, EngineLoader, SpeechEngine};
use crate::error::TtsError;

/// Loads models served by an external engine program
///
/// Loading checks the model against the discovered identifiers, when
/// discovery is configured, and runs the speaker and language listing
/// commands. A listing that exits nonzero means the model declares nothing
/// for that capability. A missing executable fails the load.
pub struct CommandEngineLoader {
    config: EngineConfig,
    discovery_args: Vec<String>,
}

impl CommandEngineLoader {
    pub fn new(config: EngineConfig, discovery_args: Vec<String>) -> Self {
        Self { config, discovery_args }
    }

    async fn listing(&self, template: &[String], model: &str) -> anyhow::Result<Option<Vec<String>>> {
        if template.is_empty() {
            return Ok(None);
        }

        let vars = Vars {
            model: Some(model),
            ..Vars::default()
        };

        match run(&self.config.command, &render(template, &vars)).await {
            Ok(stdout) => Ok(Some(parse_identifiers(&stdout))),
            Err(RunError::Exited { status, detail }) => {
                tracing::warn!(model, %status, %detail, "engine listing failed, treating capability as undeclared");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reject identifiers the engine does not offer
    ///
    /// Only applies when discovery is configured and returns a non-empty list.
    async fn ensure_offered(&self, model: &str) -> anyhow::Result<()> {
        if self.discovery_args.is_empty() {
            return Ok(());
        }

        match self.discover_models().await {
            Ok(offered) if !offered.is_empty() && !offered.iter().any(|id| id == model) => {
                anyhow::bail!("model '{model}' is not offered by the engine")
            }
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(model, "model discovery failed, skipping existence check: {e}");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl EngineLoader for CommandEngineLoader {
    async fn load(&self, model: &str) -> anyhow::Result<Box<dyn SpeechEngine>> {
        self.ensure_offered(model).await?;

        let speakers = self.listing(&self.config.list_speakers_args, model).await?;
        let languages = self.listing(&self.config.list_languages_args, model).await?;

        tracing::debug!(
            model,
            speakers = speakers.as_ref().map_or(0, Vec::len),
            languages = languages.as_ref().map_or(0, Vec::len),
            "engine model probed"
        );

        Ok(Box::new(CommandEngine {
            config: self.config.clone(),
            model: model.to_string(),
            speakers,
            languages,
        }))
    }

    async fn discover_models(&self) -> anyhow::Result<Vec<String>> {
        if self.discovery_args.is_empty() {
            return Ok(Vec::new());
        }

        let stdout = run(&self.config.command, &render(&self.discovery_args, &Vars::default())).await?;

        Ok(parse_identifiers(&stdout))
    }
}

pub(crate) struct CommandEngine {
    config: EngineConfig,
    model: String,
    speakers: Option<Vec<String>>,
    languages: Option<Vec<String>>,
}

impl CommandEngine {
    fn arguments(&self, invocation: &EngineInvocation<'_>) -> Vec<String> {
        let output = invocation.output.to_string_lossy();
        let reference = invocation.reference_audio.map(|p| p.to_string_lossy());
        let speed = invocation.speed.map(|s| s.to_string());

        let vars = Vars {
            model: Some(self.model.as_str()),
            text: Some(invocation.text),
            output: Some(output.as_ref()),
            speaker: invocation.speaker,
            language: invocation.language,
            reference: reference.as_deref(),
            speed: speed.as_deref(),
        };

        let mut args = render(&self.config.synthesize_args, &vars);

        if vars.speaker.is_some() {
            args.extend(render(&self.config.speaker_args, &vars));
        }
        if vars.language.is_some() {
            args.extend(render(&self.config.language_args, &vars));
        }
        if vars.reference.is_some() {
            args.extend(render(&self.config.reference_args, &vars));
        }
        if vars.speed.is_some() {
            args.extend(render(&self.config.speed_args, &vars));
        }

        args
    }
}

#[async_trait]
impl SpeechEngine for CommandEngine {
    async fn synthesize(&self, invocation: &EngineInvocation<'_>) -> crate::Result<()> {
        let args = self.arguments(invocation);

        tracing::debug!(model = %self.model, args = args.len(), "running engine");

        run(&self.config.command, &args)
            .await
            .map_err(|e| TtsError::Engine(e.to_string()))?;

        Ok(())
    }

    fn speakers(&self) -> Option<Vec<String>> {
        self.speakers.clone()
    }

    fn languages(&self) -> Option<Vec<String>> {
        self.languages.clone()
    }
}

#[derive(Default)]
struct Vars<'a> {
    model: Option<&'a str>,
    text: Option<&'a str>,
    output: Option<&'a str>,
    speaker: Option<&'a str>,
    language: Option<&'a str>,
    reference: Option<&'a str>,
    speed: Option<&'a str>,
}

impl Vars<'_> {
    fn get(&self, name: &str) -> &str {
        let value = match name {
            "model" => self.model,
            "text" => self.text,
            "output" => self.output,
            "speaker" => self.speaker,
            "language" => self.language,
            "reference" => self.reference,
            "speed" => self.speed,
            _ => None,
        };
        value.unwrap_or_default()
    }
}

/// Substitute placeholders in one pass, so text containing `{output}` stays literal
fn render(template: &[String], vars: &Vars<'_>) -> Vec<String> {
    fn re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| {
            Regex::new(r"\{(model|text|output|speaker|language|reference|speed)\}").expect("must be valid regex")
        })
    }

    template
        .iter()
        .map(|arg| {
            re().replace_all(arg, |caps: &Captures<'_>| vars.get(&caps[1]).to_string())
                .into_owned()
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("engine command '{0}' not found")]
    NotFound(String),

    #[error("failed to run engine command '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("engine exited with {status}: {detail}")]
    Exited { status: ExitStatus, detail: String },
}

async fn run(command: &str, args: &[String]) -> Result<String, RunError> {
    let output = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RunError::NotFound(command.to_string())
            } else {
                RunError::Spawn {
                    command: command.to_string(),
                    source: e,
                }
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };

        return Err(RunError::Exited {
            status: output.status,
            detail: detail.to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Extract identifiers from listing output
///
/// Understands a Python or JSON mapping (`{'p225': 0, ...}`, keys are the
/// identifiers), a JSON or Python list (including `dict_keys([...])`) and
/// plain one-per-line output, optionally numbered (`12: name [annotation]`).
/// Lines starting with `>` are engine chatter and skipped.
pub(crate) fn parse_identifiers(output: &str) -> Vec<String> {
    fn quoted() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r#""([^"]*)"|'([^']*)'"#).expect("must be valid regex"))
    }

    fn quoted_key() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r#"(?:"([^"]*)"|'([^']*)')\s*:"#).expect("must be valid regex"))
    }

    let mut ids = IndexSet::new();

    let mut insert_matches = |pattern: &Regex, body: &str| {
        for caps in pattern.captures_iter(body) {
            if let Some(id) = caps.get(1).or_else(|| caps.get(2)) {
                ids.insert(id.as_str().to_string());
            }
        }
    };

    if let (Some(start), Some(end)) = (output.find('{'), output.rfind('}'))
        && start < end
    {
        insert_matches(quoted_key(), &output[start + 1..end]);
    } else if let (Some(start), Some(end)) = (output.rfind('['), output.rfind(']'))
        && start < end
    {
        insert_matches(quoted(), &output[start + 1..end]);
    }

    if ids.is_empty() {
        for line in output.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('>') || line.starts_with('{') {
                continue;
            }

            let mut tokens = line.split_whitespace();
            let id = match tokens.next() {
                Some(first) if first.ends_with(':') => tokens.next(),
                first => first,
            };

            if let Some(id) = id {
                ids.insert(id.to_string());
            }
        }
    }

    ids.into_iter().collect()
}
