use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static PLACEHOLDER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}/]+)\}").expect("placeholder pattern compiles"));

/// Resolves an endpoint template by replacing `{name}` placeholders.
///
/// Every occurrence of each placeholder is replaced. Values are inserted
/// verbatim: no percent-encoding and no slash normalization, so callers are
/// expected to supply well-formed templates and path-safe values. Placeholders
/// without a matching substitution remain in the output unchanged.
///
/// # Examples
/// ```ignore
/// let path = resolve_path("/vms/{vm_id}/start", [("vm_id", "vm-123".to_string())]);
/// assert_eq!(path, "/vms/vm-123/start");
/// ```
pub fn resolve_path<'a, I>(template: &str, substitutions: I) -> String
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let mut path = template.to_string();
    for (name, value) in substitutions {
        let needle = format!("{{{}}}", name);
        path = path.replace(&needle, &value);
    }
    path
}

/// Renders an argument value the way it appears inside a URL path.
///
/// Strings are used without quotes; every other JSON value uses its compact
/// JSON rendering (`42`, `true`, `null`).
pub fn path_value_from_argument(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Lists placeholder names still present in a path, in order of appearance.
pub fn unresolved_placeholders(path: &str) -> Vec<String> {
    PLACEHOLDER_PATTERN
        .captures_iter(path)
        .filter_map(|captures| captures.get(1).map(|name| name.as_str().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_path_replaces_every_occurrence() {
        let path = resolve_path("/vms/{vm_id}/snapshots/{vm_id}", [("vm_id", "vm-1".to_string())]);
        assert_eq!(path, "/vms/vm-1/snapshots/vm-1");
    }

    #[test]
    fn resolve_path_inserts_values_verbatim() {
        let path = resolve_path("/projects/{project}", [("project", "team/app name".to_string())]);
        assert_eq!(path, "/projects/team/app name");
    }

    #[test]
    fn resolve_path_leaves_unknown_placeholders() {
        let path = resolve_path("/vms/{vm_id}/disks/{disk}", [("vm_id", "vm-9".to_string())]);
        assert_eq!(path, "/vms/vm-9/disks/{disk}");
        assert_eq!(unresolved_placeholders(&path), vec!["disk".to_string()]);
    }

    #[test]
    fn path_values_render_without_json_quotes() {
        assert_eq!(path_value_from_argument(&json!("vm-123")), "vm-123");
        assert_eq!(path_value_from_argument(&json!(42)), "42");
        assert_eq!(path_value_from_argument(&json!(true)), "true");
        assert_eq!(path_value_from_argument(&Value::Null), "null");
    }
}
