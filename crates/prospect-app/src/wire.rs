// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::{Attachment, FieldMap, Record};

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_NOT_FOUND: &str = "not_found";

/// Insert body: the collected fields flattened next to the optional file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertRequest {
    #[serde(flatten)]
    pub fields: FieldMap,
    #[serde(rename = "fileData", skip_serializing_if = "Option::is_none")]
    pub file_data: Option<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRequest {
    pub action: &'static str,
    pub id: String,
    pub updates: UpdateFields,
}

impl UpdateRequest {
    pub fn new(id: impl Into<String>, fields: FieldMap, file_data: Option<Attachment>) -> Self {
        Self {
            action: "update",
            id: id.into(),
            updates: UpdateFields { fields, file_data },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateFields {
    #[serde(flatten)]
    pub fields: FieldMap,
    #[serde(rename = "fileData", skip_serializing_if = "Option::is_none")]
    pub file_data: Option<Attachment>,
}

/// Every service response: `status` plus an optional message and record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServiceReply {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub record: Option<Record>,
}

impl ServiceReply {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_SUCCESS.to_owned(),
            message: Some(message.into()),
            record: None,
        }
    }

    pub fn found(record: Record) -> Self {
        Self {
            status: STATUS_SUCCESS.to_owned(),
            message: None,
            record: Some(record),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: STATUS_NOT_FOUND.to_owned(),
            message: None,
            record: None,
        }
    }

    pub fn failure(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: Some(message.into()),
            record: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    pub fn is_not_found(&self) -> bool {
        self.status == STATUS_NOT_FOUND
    }

    /// Server message, ignoring blanks.
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|message| !message.is_empty())
    }
}
