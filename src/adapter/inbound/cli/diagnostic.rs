//! Miette-based diagnostics for configuration errors.
//!
//! A TOML syntax or type error is rendered with the offending part of the
//! file underlined; validation errors point at the section they name.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::error::ConfigError as SettingsError;

/// Configuration error with source location context.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(legbook::config))]
pub struct ConfigDiagnostic {
    /// Human-readable error message.
    pub message: String,

    /// The configuration file being reported on.
    #[source_code]
    pub src: NamedSource<String>,

    /// Byte range of the problematic region.
    #[label("here")]
    pub span: Option<SourceSpan>,

    /// Suggestion for fixing the error.
    #[help]
    pub help: Option<String>,
}

impl ConfigDiagnostic {
    /// Diagnostic for `error`, raised while loading `content` from `name`.
    #[must_use]
    pub fn from_error(name: &str, content: &str, error: &SettingsError) -> Self {
        let (message, span, help) = match error {
            SettingsError::Parse(parse) => (
                parse.message().to_string(),
                parse.span().map(|range| SourceSpan::from(range.start..range.end)),
                Some("check the TOML syntax and value types".to_string()),
            ),
            SettingsError::InvalidValue { field, reason } => (
                format!("invalid value for {field}: {reason}"),
                locate_section(content, field),
                None,
            ),
            SettingsError::MissingField { field } => (
                format!("missing required field: {field}"),
                locate_section(content, field),
                None,
            ),
            other => (other.to_string(), None, None),
        };

        Self {
            message,
            src: NamedSource::new(name, content.to_string()),
            span,
            help,
        }
    }

    /// Render the diagnostic as a report string for stderr.
    #[must_use]
    pub fn render(self) -> String {
        format!("{:?}", miette::Report::new(self))
    }
}

/// Span of the `[section]` header of a dotted field name, if present.
fn locate_section(content: &str, field: &str) -> Option<SourceSpan> {
    let section = field.split('.').next()?;
    let header = format!("[{section}");
    content
        .find(&header)
        .map(|offset| SourceSpan::from(offset..offset + header.len() + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::settings::Config;
    use crate::error::Error;

    #[test]
    fn parse_errors_carry_a_span() {
        let content = "[database]\npool_size = \"many\"\n";
        let Err(Error::Config(err)) = Config::parse_toml(content) else {
            panic!("expected a config error");
        };

        let diagnostic = ConfigDiagnostic::from_error("config.toml", content, &err);
        assert!(diagnostic.span.is_some());
        assert!(diagnostic.help.is_some());
    }

    #[test]
    fn validation_errors_point_at_section() {
        let content = "[logging]\nformat = \"xml\"\n";
        let Err(Error::Config(err)) = Config::parse_toml(content) else {
            panic!("expected a config error");
        };

        let diagnostic = ConfigDiagnostic::from_error("config.toml", content, &err);
        assert!(diagnostic.message.contains("logging.format"));
        assert_eq!(diagnostic.span, Some(SourceSpan::from(0..9)));
    }
}
