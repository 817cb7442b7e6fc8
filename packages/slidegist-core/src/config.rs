/// Shared configuration types used by the gateway and the backend config file.
use serde::{Deserialize, Serialize};

fn default_markdown_file() -> String {
    "presentation.md".to_string()
}

fn default_metadata_file() -> String {
    "metadata.json".to_string()
}

fn default_title() -> String {
    "Untitled Presentation".to_string()
}

/// How documents are laid out in a gist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// File holding the raw markdown.
    #[serde(default = "default_markdown_file")]
    pub markdown_file: String,

    /// File holding `{title, createdAt, updatedAt}` JSON.
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,

    /// Title used when metadata is missing or unreadable.
    #[serde(default = "default_title")]
    pub default_title: String,

    /// Create gists as public.
    #[serde(default)]
    pub public: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            markdown_file: default_markdown_file(),
            metadata_file: default_metadata_file(),
            default_title: default_title(),
            public: false,
        }
    }
}
