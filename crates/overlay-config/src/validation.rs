//! Configuration validation.
//!
//! Checks that required strings are present and link targets carry a
//! scheme, collecting all errors into one message.

use crate::schema::OverlayConfig;
use overlay_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &OverlayConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_non_empty(&mut errors, "panel.title", &config.panel.title);
    validate_non_empty(&mut errors, "content.url", &config.content.url);
    validate_non_empty(
        &mut errors,
        "content.bootstrap_script",
        &config.content.bootstrap_script,
    );
    validate_url(&mut errors, "content.url", &config.content.url);
    validate_url(
        &mut errors,
        "content.bootstrap_script",
        &config.content.bootstrap_script,
    );
    validate_non_empty(&mut errors, "links.homepage", &config.links.homepage);
    validate_url(&mut errors, "links.homepage", &config.links.homepage);
    validate_non_empty(&mut errors, "logging.filter", &config.logging.filter);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_non_empty(errors: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{field} must not be empty"));
    }
}

fn validate_url(errors: &mut Vec<String>, field: &str, value: &str) {
    if !value.trim().is_empty() && !value.contains("://") {
        errors.push(format!("{field} must carry a scheme: {value}"));
    }
}
