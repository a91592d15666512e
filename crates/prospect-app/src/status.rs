// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

pub const STATUS_HIDE_AFTER: Duration = Duration::from_secs(4);
pub const CLEARED_HIDE_AFTER: Duration = Duration::from_millis(1200);
pub const RELOAD_AFTER: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
    /// `None` keeps the message until something supersedes it.
    pub hide_after: Option<Duration>,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Error, text)
    }

    /// Progress messages stay up until the action finishes.
    pub fn pending(text: impl Into<String>) -> Self {
        Self {
            hide_after: None,
            ..Self::info(text)
        }
    }

    pub fn hide_after(mut self, delay: Duration) -> Self {
        self.hide_after = Some(delay);
        self
    }

    fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            hide_after: Some(STATUS_HIDE_AFTER),
        }
    }
}
