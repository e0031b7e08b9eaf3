/// `{{variable}}` extraction and substitution
///
/// A placeholder is `{{` + one or more ASCII word characters
/// (`[A-Za-z0-9_]`) + `}}`. Anything else (`{{}}`, `{{na me}}`, `{single}`)
/// is plain text and passes through unchanged.
///
/// Values are looked up across three scopes, highest precedence first:
///
/// 1. explicit values supplied with the render request
/// 2. project variables
/// 3. user variables
///
/// Substitution is a single pass. A value that itself contains `{{x}}` is
/// emitted verbatim and never expanded again.
///
/// ```
/// use std::collections::HashMap;
/// use tshare_shared::variables::{substitute, VariableScopes};
///
/// let user = HashMap::from([("name".to_string(), "Sato".to_string())]);
/// let scopes = VariableScopes { user: &user, ..Default::default() };
///
/// let rendered = substitute("Hello {{name}}, due {{date}}", &scopes);
/// assert_eq!(rendered.text, "Hello Sato, due {{date}}");
/// assert_eq!(rendered.missing, vec!["date"]);
/// ```

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

/// Maximum length of a variable name
pub const MAX_NAME_LENGTH: usize = 100;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("placeholder regex is valid")
});

/// Distinct placeholder names in order of first occurrence
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    PLACEHOLDER_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Variable sources for one render, borrowed from the caller
#[derive(Debug, Clone, Copy)]
pub struct VariableScopes<'a> {
    pub user: &'a HashMap<String, String>,
    pub project: &'a HashMap<String, String>,
    pub explicit: &'a HashMap<String, String>,
}

static EMPTY: LazyLock<HashMap<String, String>> = LazyLock::new(HashMap::new);

impl Default for VariableScopes<'_> {
    fn default() -> Self {
        Self {
            user: &EMPTY,
            project: &EMPTY,
            explicit: &EMPTY,
        }
    }
}

impl<'a> VariableScopes<'a> {
    /// Value for `name`: explicit, then project, then user
    pub fn resolve(&self, name: &str) -> Option<&'a str> {
        self.explicit
            .get(name)
            .or_else(|| self.project.get(name))
            .or_else(|| self.user.get(name))
            .map(String::as_str)
    }
}

/// Result of a substitution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    /// Text with every resolved placeholder replaced
    pub text: String,

    /// Names that were substituted, in first-occurrence order
    pub resolved: Vec<String>,

    /// Names left in place because no scope had a value
    pub missing: Vec<String>,
}

/// Replaces every resolvable placeholder in one pass
pub fn substitute(text: &str, scopes: &VariableScopes<'_>) -> Rendered {
    let mut resolved = Vec::new();
    let mut missing = Vec::new();

    for name in extract_variables(text) {
        if scopes.resolve(&name).is_some() {
            resolved.push(name);
        } else {
            missing.push(name);
        }
    }

    let text = PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures<'_>| match scopes.resolve(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned();

    Rendered {
        text,
        resolved,
        missing,
    }
}

/// Checks that `name` can be used as a placeholder
pub fn validate_variable_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Variable name must not be empty".to_string());
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(format!(
            "Variable name must be at most {} characters",
            MAX_NAME_LENGTH
        ));
    }
    if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err("Variable name may only contain letters, digits and underscores".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_extract_variables_dedupes_in_order() {
        let names = extract_variables("{{b}} and {{a}} then {{b}} and {{c_1}}");
        assert_eq!(names, vec!["b", "a", "c_1"]);
    }

    #[test]
    fn test_extract_ignores_malformed_tokens() {
        let names = extract_variables("{{}} {{na me}} {single} {{ok}} {{-x}} {{日本}}");
        assert_eq!(names, vec!["ok"]);
    }

    #[test]
    fn test_precedence() {
        let user = map(&[("name", "user"), ("team", "user-team"), ("only_user", "u")]);
        let project = map(&[("name", "project"), ("team", "project-team")]);
        let explicit = map(&[("name", "typed")]);
        let scopes = VariableScopes {
            user: &user,
            project: &project,
            explicit: &explicit,
        };

        assert_eq!(scopes.resolve("name"), Some("typed"));
        assert_eq!(scopes.resolve("team"), Some("project-team"));
        assert_eq!(scopes.resolve("only_user"), Some("u"));
        assert_eq!(scopes.resolve("absent"), None);
    }

    #[test]
    fn test_substitute_replaces_every_occurrence() {
        let user = map(&[("x", "1")]);
        let scopes = VariableScopes {
            user: &user,
            ..Default::default()
        };

        let rendered = substitute("{{x}}+{{x}}={{y}}", &scopes);
        assert_eq!(rendered.text, "1+1={{y}}");
        assert_eq!(rendered.resolved, vec!["x"]);
        assert_eq!(rendered.missing, vec!["y"]);
    }

    #[test]
    fn test_substitute_leaves_malformed_tokens() {
        let explicit = map(&[("name", "A")]);
        let scopes = VariableScopes {
            explicit: &explicit,
            ..Default::default()
        };

        let text = "{{}} {{na me}} {name} {{name}}";
        assert_eq!(substitute(text, &scopes).text, "{{}} {{na me}} {name} A");
    }

    #[test]
    fn test_substitute_is_not_recursive() {
        let user = map(&[("a", "{{b}}"), ("b", "deep")]);
        let scopes = VariableScopes {
            user: &user,
            ..Default::default()
        };

        let rendered = substitute("{{a}}", &scopes);
        assert_eq!(rendered.text, "{{b}}");
        assert_eq!(rendered.resolved, vec!["a"]);
        assert!(rendered.missing.is_empty());
    }

    #[test]
    fn test_substitute_values_are_literal() {
        let user = map(&[("price", "$1 and ${2}")]);
        let scopes = VariableScopes {
            user: &user,
            ..Default::default()
        };

        assert_eq!(substitute("cost: {{price}}", &scopes).text, "cost: $1 and ${2}");
    }

    #[test]
    fn test_substitute_empty_value_counts_as_resolved() {
        let user = map(&[("note", "")]);
        let scopes = VariableScopes {
            user: &user,
            ..Default::default()
        };

        let rendered = substitute("[{{note}}]", &scopes);
        assert_eq!(rendered.text, "[]");
        assert_eq!(rendered.resolved, vec!["note"]);
    }

    #[test]
    fn test_validate_variable_name() {
        assert!(validate_variable_name("project_name").is_ok());
        assert!(validate_variable_name("A1").is_ok());
        assert!(validate_variable_name("").is_err());
        assert!(validate_variable_name("has space").is_err());
        assert!(validate_variable_name("dash-ed").is_err());
        assert!(validate_variable_name("名前").is_err());
        assert!(validate_variable_name(&"x".repeat(101)).is_err());
        assert!(validate_variable_name(&"x".repeat(100)).is_ok());
    }
}
