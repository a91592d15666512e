// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::{Attachment, FieldMap, InsertRequest, Mode, ServiceReply, UpdateRequest, encode_attachment};

/// The remote record service. Implementations block; run them off the UI thread.
pub trait RecordService {
    fn lookup(&self, id: &str) -> Result<ServiceReply>;
    fn insert(&self, request: &InsertRequest) -> Result<ServiceReply>;
    fn update(&self, request: &UpdateRequest) -> Result<ServiceReply>;
}

impl<T: RecordService + ?Sized> RecordService for &T {
    fn lookup(&self, id: &str) -> Result<ServiceReply> {
        (**self).lookup(id)
    }

    fn insert(&self, request: &InsertRequest) -> Result<ServiceReply> {
        (**self).insert(request)
    }

    fn update(&self, request: &UpdateRequest) -> Result<ServiceReply> {
        (**self).update(request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Search,
    Submit,
    Update,
}

impl ActionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Submit => "submit",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{0}")]
    MissingInput(String),
    #[error("a {0} is already in progress")]
    Busy(ActionKind),
    #[error("{action} is not available in {mode} mode")]
    WrongMode { action: ActionKind, mode: Mode },
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Attachment(String),
}

/// What the front end should do once an action has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    Stay,
    Reload(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchJob {
    pub id: String,
}

impl SearchJob {
    pub fn run(&self, service: &impl RecordService) -> Result<ServiceReply, ActionError> {
        service.lookup(&self.id).map_err(transport)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitJob {
    pub fields: FieldMap,
    pub file: Option<PathBuf>,
}

impl SubmitJob {
    pub fn run(&self, service: &impl RecordService) -> Result<ServiceReply, ActionError> {
        let file_data = read_attachment(self.file.as_deref())?;
        let request = InsertRequest {
            fields: self.fields.clone(),
            file_data,
        };
        service.insert(&request).map_err(transport)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateJob {
    pub id: String,
    pub updates: FieldMap,
    pub file: Option<PathBuf>,
}

impl UpdateJob {
    /// A file that cannot be read aborts before the service is contacted.
    pub fn run(&self, service: &impl RecordService) -> Result<ServiceReply, ActionError> {
        let file_data = read_attachment(self.file.as_deref())?;
        let request = UpdateRequest::new(self.id.clone(), self.updates.clone(), file_data);
        service.update(&request).map_err(transport)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Search(SearchJob),
    Submit(SubmitJob),
    Update(UpdateJob),
}

impl Job {
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Search(_) => ActionKind::Search,
            Self::Submit(_) => ActionKind::Submit,
            Self::Update(_) => ActionKind::Update,
        }
    }

    pub fn run(&self, service: &impl RecordService) -> JobOutcome {
        let result = match self {
            Self::Search(job) => job.run(service),
            Self::Submit(job) => job.run(service),
            Self::Update(job) => job.run(service),
        };
        JobOutcome {
            kind: self.kind(),
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub kind: ActionKind,
    pub result: Result<ServiceReply, ActionError>,
}

fn read_attachment(path: Option<&Path>) -> Result<Option<Attachment>, ActionError> {
    let Some(path) = path else {
        return Ok(None);
    };
    encode_attachment(path)
        .map(Some)
        .map_err(|error| ActionError::Attachment(format!("{error:#}")))
}

fn transport(error: anyhow::Error) -> ActionError {
    log::warn!("record service call failed: {error:#}");
    ActionError::Transport(format!("{error:#}"))
}
