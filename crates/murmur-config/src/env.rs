use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `{{ env.NAME }}` with an optional `| default("value")` suffix
#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*([A-Za-z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\)\s*)?\}\}"#).expect("placeholder regex compiles")
});

/// Substitute environment placeholders in raw config text
///
/// Comment lines are copied verbatim so commented-out secrets never
/// have to be present in the environment.
pub fn expand_env(input: &str) -> Result<String, String> {
    let mut expanded: Vec<String> = Vec::new();

    for line in input.split('\n') {
        if line.trim_start().starts_with('#') {
            expanded.push(line.to_owned());
        } else {
            expanded.push(expand_line(line)?);
        }
    }

    Ok(expanded.join("\n"))
}

fn expand_line(line: &str) -> Result<String, String> {
    let mut failure = None;

    let replaced = PLACEHOLDER.replace_all(line, |captures: &Captures<'_>| {
        match resolve(&captures[1], captures.get(2).map(|m| m.as_str())) {
            Ok(value) => value,
            Err(message) => {
                failure.get_or_insert(message);
                String::new()
            }
        }
    });

    match failure {
        Some(message) => Err(message),
        None => Ok(replaced.into_owned()),
    }
}

fn resolve(key: &str, default: Option<&str>) -> Result<String, String> {
    let Some(name) = key.strip_prefix("env.").filter(|rest| !rest.is_empty() && !rest.contains('.')) else {
        return Err(format!("only variables scoped with 'env.' are supported: `{key}`"));
    };

    match (std::env::var(name), default) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(fallback)) => Ok(fallback.to_owned()),
        (Err(_), None) => Err(format!("environment variable not found: `{name}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let input = "[chat]\nmodel = \"gpt-4o-mini\"\n";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn substitutes_variable() {
        temp_env::with_var("MURMUR_TEST_KEY", Some("sk-test"), || {
            let result = expand_env("api_key = \"{{ env.MURMUR_TEST_KEY }}\"").unwrap();
            assert_eq!(result, "api_key = \"sk-test\"");
        });
    }

    #[test]
    fn substitutes_several_on_one_line() {
        temp_env::with_vars([("MURMUR_A", Some("a")), ("MURMUR_B", Some("b"))], || {
            let result = expand_env("x = \"{{ env.MURMUR_A }}-{{env.MURMUR_B}}\"").unwrap();
            assert_eq!(result, "x = \"a-b\"");
        });
    }

    #[test]
    fn missing_variable_is_an_error() {
        temp_env::with_var_unset("MURMUR_MISSING", || {
            let err = expand_env("api_key = \"{{ env.MURMUR_MISSING }}\"").unwrap_err();
            assert!(err.contains("MURMUR_MISSING"));
        });
    }

    #[test]
    fn default_applies_only_when_unset() {
        temp_env::with_var_unset("MURMUR_OPTIONAL", || {
            let result = expand_env("x = \"{{ env.MURMUR_OPTIONAL | default(\"fallback\") }}\"").unwrap();
            assert_eq!(result, "x = \"fallback\"");
        });

        temp_env::with_var("MURMUR_OPTIONAL", Some("set"), || {
            let result = expand_env("x = \"{{ env.MURMUR_OPTIONAL | default(\"fallback\") }}\"").unwrap();
            assert_eq!(result, "x = \"set\"");
        });
    }

    #[test]
    fn rejects_other_scopes() {
        let err = expand_env("x = \"{{ vault.KEY }}\"").unwrap_err();
        assert!(err.contains("only variables scoped with 'env.'"));
    }

    #[test]
    fn comment_lines_are_not_expanded() {
        temp_env::with_var_unset("MURMUR_MISSING", || {
            let input = "  # api_key = \"{{ env.MURMUR_MISSING }}\"\nport = 1";
            assert_eq!(expand_env(input).unwrap(), input);
        });
    }
}
