use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Expands `{{ env.VAR }}` placeholders, deserializes, then validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a placeholder cannot be
    /// resolved, the TOML is malformed, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`] when the file exists
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            return Self::load(path);
        }

        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency found
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_engine()?;
        self.validate_transcoder()?;
        Ok(())
    }

    fn validate_engine(&self) -> anyhow::Result<()> {
        if self.engine.command.trim().is_empty() {
            anyhow::bail!("engine.command must not be empty");
        }

        for placeholder in ["{text}", "{output}"] {
            if !self.engine.synthesize_args.iter().any(|arg| arg.contains(placeholder)) {
                anyhow::bail!("engine.synthesize_args must reference {placeholder}");
            }
        }

        Ok(())
    }

    fn validate_transcoder(&self) -> anyhow::Result<()> {
        if self.transcoder.command.trim().is_empty() {
            anyhow::bail!("transcoder.command must not be empty");
        }

        if self.transcoder.sample_rate == 0 {
            anyhow::bail!("transcoder.sample_rate must be greater than 0");
        }

        if self.transcoder.channels == 0 {
            anyhow::bail!("transcoder.channels must be greater than 0");
        }

        Ok(())
    }
}
