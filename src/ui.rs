//! Widget resource served to the host renderer.
//!
//! The markup lives on disk under the assets directory; this module finds it
//! and describes it as an MCP resource.

use crate::error::McpError;
use crate::mcp::helpers::resource_meta;
use crate::mcp::models::{WIDGET_MIME_TYPE, WIDGET_NAME, WIDGET_TEMPLATE_URI};
use serde_json::{json, Value};
use std::{
    io,
    path::{Path, PathBuf},
};
use tracing::debug;

/// File name of the primary widget markup.
const WIDGET_FILE: &str = "shopping-cart.html";

/// Location of the widget markup.
#[derive(Debug, Clone)]
pub struct WidgetAssets {
    /// Path to the directory containing HTML assets.
    dir: PathBuf,
}

impl WidgetAssets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Locates the assets directory relative to the working directory.
    pub fn discover() -> Self {
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(Self::locate_assets_directory(&current_dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Attempts to locate the assets directory using a multi-step strategy
    fn locate_assets_directory(current_dir: &Path) -> PathBuf {
        // 1. ./assets  2. ../assets  3. "assets" relative path
        if current_dir.join("assets").exists() {
            return current_dir.join("assets");
        }

        if let Some(parent) = current_dir.parent() {
            if parent.join("assets").exists() {
                return parent.join("assets");
            }
        }

        PathBuf::from("assets")
    }

    /// Reads the widget markup, or the latest `shopping-cart-*.html` build.
    pub async fn load_html(&self) -> Result<String, McpError> {
        let primary = self.dir.join(WIDGET_FILE);
        if tokio::fs::try_exists(&primary).await.unwrap_or(false) {
            return Ok(tokio::fs::read_to_string(primary).await?);
        }

        let fallback = self.find_fallback_html_file().await?;
        debug!(path = %fallback.display(), "using fallback widget markup");
        Ok(tokio::fs::read_to_string(fallback).await?)
    }

    /// Finds a hashed build of the widget when the primary one is not available
    async fn find_fallback_html_file(&self) -> io::Result<PathBuf> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        let mut fallbacks = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with("shopping-cart-") && name.ends_with(".html") {
                    fallbacks.push(path);
                }
            }
        }

        // Lexicographically last is the latest build.
        fallbacks.sort();
        fallbacks.pop().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no {WIDGET_FILE} in {}", self.dir.display()),
            )
        })
    }
}

/// `resources/list` payload.
pub fn resources_list() -> Value {
    json!({
        "resources": [{
            "name": WIDGET_NAME,
            "uri": WIDGET_TEMPLATE_URI,
            "mimeType": WIDGET_MIME_TYPE,
            "description": "Shopping cart widget markup",
            "_meta": resource_meta(),
        }],
    })
}

/// `resources/templates/list` payload.
pub fn resource_templates_list() -> Value {
    json!({
        "resourceTemplates": [{
            "name": WIDGET_NAME,
            "uriTemplate": WIDGET_TEMPLATE_URI,
            "mimeType": WIDGET_MIME_TYPE,
            "description": "Shopping cart widget markup",
            "_meta": resource_meta(),
        }],
    })
}

/// `resources/read` payload for `uri`.
pub async fn read_resource(assets: &WidgetAssets, uri: &str) -> Result<Value, McpError> {
    if uri != WIDGET_TEMPLATE_URI {
        return Err(McpError::ResourceNotFound(uri.to_string()));
    }

    let html = assets.load_html().await?;
    Ok(json!({
        "contents": [{
            "uri": WIDGET_TEMPLATE_URI,
            "mimeType": WIDGET_MIME_TYPE,
            "text": html,
            "_meta": resource_meta(),
        }],
    }))
}
