//! Configuration templates for `concord init`.
//!
//! Templates are stored as valid TOML files and returned as commented-out
//! example configurations.

/// Default local configuration template (valid TOML).
const LOCAL_TEMPLATE: &str = include_str!("../templates/config.toml");

/// Global configuration template (valid TOML).
const GLOBAL_TEMPLATE: &str = include_str!("../templates/config-global.toml");

/// Returns the local configuration template as a commented-out example.
pub fn local_template() -> String {
    comment_template(LOCAL_TEMPLATE)
}

/// Returns the global configuration template as a commented-out example.
pub fn global_template() -> String {
    comment_template(GLOBAL_TEMPLATE)
}

/// Prefixes every non-empty, non-comment line with "# ".
fn comment_template(template: &str) -> String {
    let mut result = String::with_capacity(template.len() + template.lines().count() * 2);
    for line in template.lines() {
        if !line.is_empty() && !line.starts_with('#') {
            result.push_str("# ");
        }
        result.push_str(line);
        result.push('\n');
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_config;

    #[test]
    fn templates_parse_as_valid_toml() {
        let local = parse_config(LOCAL_TEMPLATE);
        assert!(local.is_ok(), "local template failed to parse: {local:?}");
        let global = parse_config(GLOBAL_TEMPLATE);
        assert!(global.is_ok(), "global template failed to parse: {global:?}");
    }

    #[test]
    fn commented_templates_parse_as_empty() {
        let config = parse_config(&local_template()).unwrap();
        assert!(config.window.is_none());
        assert!(config.root.is_none());
    }

    #[test]
    fn comment_template_keeps_comments_and_blank_lines() {
        let input = "# note\nkey = \"value\"\n\n[section]\n";
        assert_eq!(
            comment_template(input),
            "# note\n# key = \"value\"\n\n# [section]\n"
        );
    }
}
