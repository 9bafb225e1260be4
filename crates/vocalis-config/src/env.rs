use std::sync::OnceLock;

use regex::{Captures, Regex};

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // `{{ env.NAME }}` or `{{ env.NAME | default("value") }}`
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*([A-Za-z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
            .expect("placeholder pattern is valid")
    })
}

/// Substitute environment placeholders in raw config text
///
/// Comment lines are copied through untouched so that a commented-out
/// secret never has to be present in the environment.
pub fn expand_env(input: &str) -> Result<String, String> {
    let mut lines = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
        } else {
            lines.push(expand_line(line)?);
        }
    }

    let mut output = lines.join("\n");
    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

fn expand_line(line: &str) -> Result<String, String> {
    let mut failure = None;

    let expanded = placeholder().replace_all(line, |caps: &Captures<'_>| {
        match resolve(&caps[1], caps.get(2).map(|m| m.as_str())) {
            Ok(value) => value,
            Err(e) => {
                failure.get_or_insert(e);
                String::new()
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(expanded.into_owned()),
    }
}

fn resolve(key: &str, default: Option<&str>) -> Result<String, String> {
    let Some(name) = key.strip_prefix("env.").filter(|name| !name.contains('.')) else {
        return Err(format!("only variables scoped with 'env.' are supported: `{key}`"));
    };

    std::env::var(name).or_else(|_| {
        default
            .map(str::to_string)
            .ok_or_else(|| format!("environment variable not found: `{name}`"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let input = "[engine]\ncommand = \"tts\"\n";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn substitutes_set_variables() {
        temp_env::with_vars([("VOCALIS_BIN", Some("/opt/tts")), ("VOCALIS_FF", Some("ff"))], || {
            let result = expand_env("a = \"{{ env.VOCALIS_BIN }}\"\nb = \"{{env.VOCALIS_FF}}\"").unwrap();
            assert_eq!(result, "a = \"/opt/tts\"\nb = \"ff\"");
        });
    }

    #[test]
    fn missing_variable_is_an_error() {
        temp_env::with_var_unset("VOCALIS_MISSING", || {
            let err = expand_env("command = \"{{ env.VOCALIS_MISSING }}\"").unwrap_err();
            assert!(err.contains("VOCALIS_MISSING"));
        });
    }

    #[test]
    fn default_applies_only_when_unset() {
        temp_env::with_var_unset("VOCALIS_DIR", || {
            let result = expand_env("temp_dir = \"{{ env.VOCALIS_DIR | default(\"/tmp/v\") }}\"").unwrap();
            assert_eq!(result, "temp_dir = \"/tmp/v\"");
        });

        temp_env::with_var("VOCALIS_DIR", Some("/data"), || {
            let result = expand_env("temp_dir = \"{{ env.VOCALIS_DIR | default(\"/tmp/v\") }}\"").unwrap();
            assert_eq!(result, "temp_dir = \"/data\"");
        });
    }

    #[test]
    fn rejects_other_scopes() {
        let err = expand_env("key = \"{{ secrets.TOKEN }}\"").unwrap_err();
        assert!(err.contains("only variables scoped with 'env.'"));
    }

    #[test]
    fn comments_are_not_expanded() {
        temp_env::with_var_unset("VOCALIS_MISSING", || {
            let input = "  # command = \"{{ env.VOCALIS_MISSING }}\"\n";
            assert_eq!(expand_env(input).unwrap(), input);
        });
    }
}
