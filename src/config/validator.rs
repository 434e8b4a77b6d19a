//! Configuration validation rules.
//!
//! This module validates configuration for correctness:
//! - Package names must be non-empty and contain no whitespace
//! - Installer and plugin manager URLs must be http(s)
//! - A shell theme and parser languages must be plain identifiers
//! - Git identity must give both name and email, or neither
//! - A configured command timeout must be positive

use crate::config::schema::TermstrapConfig;
use crate::error::ConfigError;

/// Validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: &'static str,
    /// Human-readable error message
    pub message: String,
}

/// Validate a configuration and return all errors.
///
/// Collects every problem rather than stopping at the first one.
pub fn validate_config(config: &TermstrapConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let lists = [
        ("common", &config.packages.common),
        ("termux", &config.packages.termux),
        ("ubuntu", &config.packages.ubuntu),
    ];
    for (list, packages) in lists {
        for pkg in packages {
            if pkg.trim().is_empty() || pkg.chars().any(char::is_whitespace) {
                errors.push(ValidationError {
                    rule: "package-name",
                    message: format!("packages.{} contains invalid name '{}'", list, pkg),
                });
            }
        }
    }

    for (field, url) in [
        ("shell.framework_installer", &config.shell.framework_installer),
        ("editor.plugin_manager_url", &config.editor.plugin_manager_url),
    ] {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            errors.push(ValidationError {
                rule: "url",
                message: format!("{} must be an http(s) URL, got '{}'", field, url),
            });
        }
    }

    if config.shell.rc_lines.iter().any(|l| l.contains('\n')) {
        errors.push(ValidationError {
            rule: "rc-line",
            message: "shell.rc_lines entries must be single lines".to_string(),
        });
    }

    if let Some(theme) = &config.shell.theme {
        let plain = !theme.is_empty()
            && theme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c));
        if !plain {
            errors.push(ValidationError {
                rule: "shell-theme",
                message: format!("shell.theme '{}' must be a plain theme name", theme),
            });
        }
    }

    if config.editor.compile_parsers {
        if config.editor.parsers.is_empty() {
            errors.push(ValidationError {
                rule: "parsers",
                message: "editor.parsers must not be empty when compile_parsers is set".to_string(),
            });
        }
        for lang in &config.editor.parsers {
            if lang.is_empty() || !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                errors.push(ValidationError {
                    rule: "parsers",
                    message: format!("editor.parsers contains invalid language '{}'", lang),
                });
            }
        }
    }

    match (&config.git.name, &config.git.email) {
        (Some(_), None) | (None, Some(_)) => errors.push(ValidationError {
            rule: "git-identity",
            message: "git.name and git.email must be set together".to_string(),
        }),
        _ => {}
    }

    if config.ssh.key_type.trim().is_empty() {
        errors.push(ValidationError {
            rule: "ssh-key-type",
            message: "ssh.key_type must not be empty".to_string(),
        });
    }

    if config.settings.command_timeout_secs == Some(0) {
        errors.push(ValidationError {
            rule: "timeout",
            message: "settings.command_timeout_secs must be greater than zero".to_string(),
        });
    }

    errors
}

/// Validate and fold all errors into one [`ConfigError::Invalid`].
pub fn validate(config: &TermstrapConfig) -> Result<(), ConfigError> {
    let errors = validate_config(config);
    if errors.is_empty() {
        return Ok(());
    }

    Err(ConfigError::Invalid {
        message: errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; "),
    })
}
