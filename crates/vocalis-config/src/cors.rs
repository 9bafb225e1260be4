use std::time::Duration;

use serde::Deserialize;

/// Cross-origin policy applied to every route
///
/// Browser front-ends talk to the service directly, so the usual setup is
/// `origins = "*"`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    #[serde(default)]
    pub origins: AnyOrList,
    #[serde(default)]
    pub methods: AnyOrList,
    #[serde(default)]
    pub headers: AnyOrList,
    /// Preflight cache lifetime in seconds
    #[serde(default)]
    pub max_age: Option<u64>,
}

impl CorsConfig {
    pub fn max_age_duration(&self) -> Option<Duration> {
        self.max_age.map(Duration::from_secs)
    }
}

/// Either the wildcard `"*"` or an explicit list of values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AnyOrList {
    #[default]
    Any,
    List(Vec<String>),
}

impl<'de> Deserialize<'de> for AnyOrList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Single(String),
            List(Vec<String>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Single(value) if value == "*" => Ok(Self::Any),
            Raw::Single(value) => Err(serde::de::Error::custom(format!(
                "expected \"*\" or a list of strings, got \"{value}\""
            ))),
            Raw::List(values) if values.iter().any(|v| v == "*") => Ok(Self::Any),
            Raw::List(values) => Ok(Self::List(values)),
        }
    }
}
