// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    /// Base64 (standard alphabet, padded) file content.
    pub data: String,
}

impl Attachment {
    pub fn from_bytes(file_name: &str, bytes: &[u8]) -> Self {
        Self {
            file_name: file_name.to_owned(),
            mime_type: mime_type_for(file_name).to_owned(),
            data: STANDARD.encode(bytes),
        }
    }

    pub fn decoded_len(&self) -> Result<usize> {
        STANDARD
            .decode(&self.data)
            .map(|bytes| bytes.len())
            .context("decode attachment data")
    }
}

/// Reads the whole file. Call it off the UI thread; it blocks on disk I/O.
pub fn encode_attachment(path: &Path) -> Result<Attachment> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("attachment path {} has no file name", path.display()))?;
    let bytes = fs::read(path).with_context(|| format!("read attachment {}", path.display()))?;
    log::debug!("encoding attachment {file_name} ({} bytes)", bytes.len());
    Ok(Attachment::from_bytes(&file_name, &bytes))
}

pub fn mime_type_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "zip" => "application/zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => FALLBACK_MIME_TYPE,
    }
}
