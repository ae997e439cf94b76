//! HTML template contract
//!
//! The HTML generation step receives one parameter, `injectCustomScript`,
//! holding the script tag that loads the external config (or nothing).

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex_lite::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::filename::OutputFilename;
use crate::patterns;

/// Placeholder name used in the HTML template
pub const PLACEHOLDER: &str = "injectCustomScript";

/// How the runtime config reaches the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "filename", rename_all = "lowercase")]
pub enum ConfigDelivery {
    /// Bundled with the application
    Inline,
    /// Emitted as a standalone script next to the bundle
    External(OutputFilename),
}

impl ConfigDelivery {
    pub fn filename(&self) -> Option<&OutputFilename> {
        match self {
            Self::Inline => None,
            Self::External(name) => Some(name),
        }
    }

    pub fn template_parameters(&self) -> TemplateParameters {
        TemplateParameters::for_delivery(self)
    }
}

/// Parameters handed to the HTML generation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateParameters {
    #[serde(rename = "injectCustomScript")]
    pub inject_custom_script: String,
}

impl TemplateParameters {
    pub fn for_delivery(delivery: &ConfigDelivery) -> Self {
        let inject_custom_script = match delivery {
            ConfigDelivery::Inline => String::new(),
            ConfigDelivery::External(name) => script_tag(name),
        };
        Self {
            inject_custom_script,
        }
    }
}

/// `<script src="./NNN.xxxxxxxx.js"></script>`
pub fn script_tag(name: &OutputFilename) -> String {
    format!("<script src=\"./{}\"></script>", name)
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    patterns::literal(&PLACEHOLDER_RE, patterns::PLACEHOLDER)
}

/// Replace every placeholder in `html` with the tag markup.
pub fn inject_into_html(html: &str, params: &TemplateParameters) -> Result<String, TemplateError> {
    let re = placeholder();
    if !re.is_match(html) {
        return Err(TemplateError::MissingPlaceholder);
    }
    Ok(re
        .replace_all(html, NoExpand(&params.inject_custom_script))
        .into_owned())
}

/// Inject into an emitted HTML file in place.
pub fn inject_file(html_path: &Path, params: &TemplateParameters) -> Result<(), TemplateError> {
    let html = fs::read_to_string(html_path)
        .map_err(|e| TemplateError::Io(format!("{}: {}", html_path.display(), e)))?;
    let injected = inject_into_html(&html, params)?;
    fs::write(html_path, injected)
        .map_err(|e| TemplateError::Io(format!("{}: {}", html_path.display(), e)))?;
    Ok(())
}

/// Template errors
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("HTML has no <%= {} %> placeholder", PLACEHOLDER)]
    MissingPlaceholder,

    #[error("IO error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name() -> OutputFilename {
        OutputFilename::parse("042.k3j9x0ab.js").unwrap()
    }

    #[test]
    fn test_external_delivery_tag() {
        let params = ConfigDelivery::External(name()).template_parameters();
        assert_eq!(
            params.inject_custom_script,
            "<script src=\"./042.k3j9x0ab.js\"></script>"
        );
    }

    #[test]
    fn test_inline_delivery_is_empty() {
        let params = ConfigDelivery::Inline.template_parameters();
        assert_eq!(params.inject_custom_script, "");
        assert!(ConfigDelivery::Inline.filename().is_none());
    }

    #[test]
    fn test_parameters_serialize_camel_case() {
        let params = ConfigDelivery::Inline.template_parameters();
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            serde_json::json!({"injectCustomScript": ""})
        );
    }

    #[test]
    fn test_delivery_serialization() {
        let value = serde_json::to_value(ConfigDelivery::External(name())).unwrap();
        assert_eq!(value, serde_json::json!({"mode": "external", "filename": "042.k3j9x0ab.js"}));
    }

    #[test]
    fn test_inject_whitespace_tolerant() {
        let html = "<head>\n  <%=injectCustomScript%>\n  <%=   injectCustomScript %>\n</head>";
        let params = ConfigDelivery::External(name()).template_parameters();
        let out = inject_into_html(html, &params).unwrap();
        assert_eq!(out.matches("042.k3j9x0ab.js").count(), 2);
        assert!(!out.contains("<%="));
    }

    #[test]
    fn test_inject_inline_removes_placeholder() {
        let params = ConfigDelivery::Inline.template_parameters();
        let out = inject_into_html("<head><%= injectCustomScript %></head>", &params).unwrap();
        assert_eq!(out, "<head></head>");
    }

    #[test]
    fn test_missing_placeholder() {
        let params = ConfigDelivery::Inline.template_parameters();
        let err = inject_into_html("<head></head>", &params).unwrap_err();
        assert!(matches!(err, TemplateError::MissingPlaceholder));
    }

    #[test]
    fn test_inject_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "<body><%= injectCustomScript %></body>").unwrap();

        inject_file(&path, &ConfigDelivery::External(name()).template_parameters()).unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert_eq!(html, "<body><script src=\"./042.k3j9x0ab.js\"></script></body>");
    }
}
