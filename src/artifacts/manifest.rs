// src/artifacts/manifest.rs

//! Web app manifest.

use serde::{Deserialize, Serialize};

use crate::errors::Result;

pub const DEFAULT_MANIFEST_OUTPUT: &str = "manifest.webmanifest";

/// `[settings.manifest]`, serialized as the manifest document itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, alias = "shortName", skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, alias = "themeColor", skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,

    #[serde(default, alias = "backgroundColor", skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[serde(default = "default_display")]
    pub display: String,

    #[serde(default = "default_root")]
    pub scope: String,

    #[serde(default = "default_root", alias = "startUrl")]
    pub start_url: String,

    #[serde(default)]
    pub icons: Vec<ManifestIcon>,

    /// Output file name; not part of the document.
    #[serde(default = "default_output", skip_serializing)]
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestIcon {
    pub src: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

fn default_display() -> String {
    "standalone".to_string()
}

fn default_root() -> String {
    "/".to_string()
}

fn default_output() -> String {
    DEFAULT_MANIFEST_OUTPUT.to_string()
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            name: None,
            short_name: None,
            description: None,
            theme_color: None,
            background_color: None,
            display: default_display(),
            scope: default_root(),
            start_url: default_root(),
            icons: Vec::new(),
            output: default_output(),
        }
    }
}

/// Pretty JSON manifest document.
pub fn render_manifest(cfg: &ManifestConfig) -> Result<String> {
    let mut text = serde_json::to_string_pretty(cfg)?;
    text.push('\n');
    Ok(text)
}

/// `<link rel="manifest">` inserted before `</head>`; html without a head
/// is returned unchanged.
pub fn inject_manifest_link(html: &str, output: &str) -> String {
    let href = format!("/{}", output.trim_start_matches('/'));
    let link = format!("<link rel=\"manifest\" href=\"{href}\">");
    if html.contains(&link) {
        return html.to_string();
    }
    match html.find("</head>") {
        Some(pos) => format!("{}  {}\n{}", &html[..pos], link, &html[pos..]),
        None => html.to_string(),
    }
}
