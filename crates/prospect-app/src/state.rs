// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::{
    ActionError, ActionKind, CLEARED_HIDE_AFTER, FieldMap, FieldPolicy, Followup, Form, Job,
    JobOutcome, MODE_KEY, Mode, PopulateReport, RELOAD_AFTER, RecordService, SearchJob,
    ServiceReply, SessionStore, StatusMessage, SubmitJob, UpdateJob,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionControls {
    pub submit_visible: bool,
    pub search_visible: bool,
    pub update_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerCommand {
    SwitchMode(Mode),
    ClearSearch,
    Cancel,
    Reload,
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    ModeChanged(Mode),
    ControlsChanged(ActionControls),
    FormReset,
    StatusUpdated(StatusMessage),
    StatusCleared,
}

/// Owns the form, the active mode and everything the action handlers touch.
/// Lives on one thread; jobs returned by `begin_*` carry only owned data.
#[derive(Debug)]
pub struct FormController<S> {
    mode: Mode,
    policy: FieldPolicy,
    template: Form,
    form: Form,
    controls: ActionControls,
    search_input: String,
    in_flight: Option<ActionKind>,
    status: Option<StatusMessage>,
    status_revision: u64,
    session: S,
}

impl<S: SessionStore> FormController<S> {
    /// The stored session mode wins over `default_mode` when it parses.
    pub fn new(form: Form, policy: FieldPolicy, default_mode: Mode, session: S) -> Self {
        let mode = match session.get(MODE_KEY) {
            Ok(Some(raw)) => Mode::parse(&raw).unwrap_or(default_mode),
            Ok(None) => default_mode,
            Err(error) => {
                log::warn!("session storage unavailable: {error:#}");
                default_mode
            }
        };

        let mut controller = Self {
            mode,
            policy,
            template: form.clone(),
            form,
            controls: ActionControls {
                submit_visible: true,
                search_visible: false,
                update_visible: false,
            },
            search_input: String::new(),
            in_flight: None,
            status: None,
            status_revision: 0,
            session,
        };
        controller.set_mode(mode);
        controller.enter_baseline();
        controller
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn policy(&self) -> &FieldPolicy {
        &self.policy
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn controls(&self) -> ActionControls {
        self.controls
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn set_search_input(&mut self, value: impl Into<String>) {
        self.search_input = value.into();
    }

    pub fn in_flight(&self) -> Option<ActionKind> {
        self.in_flight
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn status_revision(&self) -> u64 {
        self.status_revision
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// User edit of one control; refused for disabled or missing controls.
    pub fn input(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.form.get_mut(index) {
            Some(field) if field.enabled => {
                field.value = value.into();
                true
            }
            _ => false,
        }
    }

    pub fn cycle_option(&mut self, index: usize, delta: isize) -> bool {
        match self.form.get_mut(index) {
            Some(field) if field.enabled && !field.options.is_empty() => {
                field.cycle_option(delta);
                true
            }
            _ => false,
        }
    }

    /// Shows the controls that belong to `mode`; leaves enablement alone.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.controls = match mode {
            Mode::Query => ActionControls {
                submit_visible: false,
                search_visible: true,
                update_visible: false,
            },
            Mode::Insert => {
                self.search_input.clear();
                ActionControls {
                    submit_visible: true,
                    search_visible: false,
                    update_visible: false,
                }
            }
        };
    }

    pub fn apply_enablement_policy(&mut self, mode: Mode) {
        let policy = &self.policy;
        self.form
            .set_enabled_where(|name| policy.is_enabled(mode, name));
    }

    pub fn restrict_all_except(&mut self, names: &[&str]) {
        self.form.set_enabled_where(|name| names.contains(&name));
    }

    /// Fills the form from a record; in query mode only the editable subset
    /// stays enabled afterwards.
    pub fn populate(&mut self, record: &crate::Record) -> PopulateReport {
        let report = self.form.populate(record);
        if self.mode == Mode::Query {
            self.apply_enablement_policy(Mode::Query);
        }
        report
    }

    /// Insert mode reapplies its policy and carries disabled values through
    /// hidden mirrors; query mode serializes enabled controls only.
    pub fn collect_all(&mut self) -> FieldMap {
        match self.mode {
            Mode::Insert => {
                self.apply_enablement_policy(Mode::Insert);
                self.form.with_carriers(Form::to_field_map)
            }
            Mode::Query => self.form.to_field_map(),
        }
    }

    pub fn collect_editable_subset(&self, allow_list: &BTreeSet<String>) -> FieldMap {
        self.form
            .collect_editable_subset(allow_list, self.policy.id_field())
    }

    pub fn dispatch(&mut self, command: ControllerCommand) -> Vec<ControllerEvent> {
        match command {
            ControllerCommand::SwitchMode(mode) => self.switch_mode(mode),
            ControllerCommand::ClearSearch => {
                self.search_input.clear();
                self.form.reset();
                self.set_mode(self.mode);
                self.enter_baseline();
                vec![
                    ControllerEvent::FormReset,
                    ControllerEvent::ControlsChanged(self.controls),
                    self.set_status(StatusMessage::info("Cleared.").hide_after(CLEARED_HIDE_AFTER)),
                ]
            }
            ControllerCommand::Cancel => {
                self.form.reset();
                vec![ControllerEvent::FormReset, self.clear_status()]
            }
            ControllerCommand::Reload => {
                self.form = self.template.clone();
                self.search_input.clear();
                self.set_mode(self.mode);
                self.enter_baseline();
                vec![
                    ControllerEvent::FormReset,
                    ControllerEvent::ControlsChanged(self.controls),
                ]
            }
            ControllerCommand::ClearStatus => vec![self.clear_status()],
        }
    }

    /// Clears the status only if nothing newer replaced it since `revision`.
    pub fn expire_status(&mut self, revision: u64) -> bool {
        if revision != self.status_revision || self.status.is_none() {
            return false;
        }
        self.status = None;
        true
    }

    pub fn begin_search(&mut self) -> Result<SearchJob, ActionError> {
        self.ensure_ready(ActionKind::Search, Mode::Query)?;
        let id = self.search_input.trim().to_owned();
        if id.is_empty() {
            return Err(self.fail_input("Enter a valid identifier."));
        }
        self.start(ActionKind::Search, "Searching...");
        Ok(SearchJob { id })
    }

    pub fn begin_submit(&mut self) -> Result<SubmitJob, ActionError> {
        self.ensure_ready(ActionKind::Submit, Mode::Insert)?;
        self.start(ActionKind::Submit, "Submitting...");
        let fields = self.collect_all();
        Ok(SubmitJob {
            fields,
            file: self.form.selected_file(),
        })
    }

    pub fn begin_update(&mut self) -> Result<UpdateJob, ActionError> {
        self.ensure_ready(ActionKind::Update, Mode::Query)?;
        if !self.controls.update_visible {
            return Err(self.fail_input("Search for a record before updating."));
        }
        let id = self
            .form
            .value(self.policy.id_field())
            .map(str::trim)
            .unwrap_or_default()
            .to_owned();
        if id.is_empty() {
            return Err(self.fail_input("The form does not contain a valid identifier."));
        }
        let updates = self.collect_editable_subset(self.policy.allow_list(Mode::Query));
        self.start(ActionKind::Update, "Sending update...");
        Ok(UpdateJob {
            id,
            updates,
            file: self.form.selected_file(),
        })
    }

    pub fn begin(&mut self, kind: ActionKind) -> Result<Job, ActionError> {
        match kind {
            ActionKind::Search => self.begin_search().map(Job::Search),
            ActionKind::Submit => self.begin_submit().map(Job::Submit),
            ActionKind::Update => self.begin_update().map(Job::Update),
        }
    }

    /// Applies a finished job. Failures are already on the status line when
    /// this returns `Err`.
    pub fn finish(&mut self, outcome: JobOutcome) -> Result<Followup, ActionError> {
        if self.in_flight == Some(outcome.kind) {
            self.in_flight = None;
        } else {
            log::warn!("finished {} without a matching in-flight action", outcome.kind);
        }
        match outcome.kind {
            ActionKind::Search => self.finish_search(outcome.result),
            ActionKind::Submit => self.finish_submit(outcome.result),
            ActionKind::Update => self.finish_update(outcome.result),
        }
    }

    pub fn run(&mut self, kind: ActionKind, service: &impl RecordService) -> Result<Followup, ActionError> {
        let job = self.begin(kind)?;
        let outcome = job.run(service);
        self.finish(outcome)
    }

    pub fn search_with(&mut self, service: &impl RecordService) -> Result<Followup, ActionError> {
        self.run(ActionKind::Search, service)
    }

    pub fn submit_with(&mut self, service: &impl RecordService) -> Result<Followup, ActionError> {
        self.run(ActionKind::Submit, service)
    }

    pub fn update_with(&mut self, service: &impl RecordService) -> Result<Followup, ActionError> {
        self.run(ActionKind::Update, service)
    }

    fn finish_search(&mut self, result: Result<ServiceReply, ActionError>) -> Result<Followup, ActionError> {
        let reply = match result {
            Ok(reply) => reply,
            Err(error) => return Err(self.fail(error, "Connection error while searching.")),
        };
        if reply.is_success()
            && let Some(record) = &reply.record
        {
            let report = self.populate(record);
            if !report.is_clean() {
                log::warn!("{} record fields could not be filled", report.failed.len());
            }
            self.controls.update_visible = true;
            self.controls.submit_visible = false;
            self.set_status(StatusMessage::success("Record found."));
            return Ok(Followup::Stay);
        }
        let message = if reply.is_not_found() {
            "Identifier not found.".to_owned()
        } else {
            reply
                .message()
                .unwrap_or("Unexpected response from server.")
                .to_owned()
        };
        Err(self.fail(ActionError::Rejected(message.clone()), &message))
    }

    fn finish_submit(&mut self, result: Result<ServiceReply, ActionError>) -> Result<Followup, ActionError> {
        let error = match result {
            Ok(reply) if reply.is_success() => {
                let message = reply.message().unwrap_or("Data submitted successfully!").to_owned();
                self.form.reset();
                self.set_status(StatusMessage::success(message));
                return Ok(Followup::Reload(RELOAD_AFTER));
            }
            Ok(reply) => ActionError::Rejected(reply.message().unwrap_or("Submission failed").to_owned()),
            Err(error) => error,
        };
        let message = format!("Error: {error}");
        Err(self.fail(error, &message))
    }

    fn finish_update(&mut self, result: Result<ServiceReply, ActionError>) -> Result<Followup, ActionError> {
        match result {
            Ok(reply) if reply.is_success() => {
                let message = reply.message().unwrap_or("Record updated.").to_owned();
                self.set_status(StatusMessage::success(message));
                Ok(Followup::Reload(RELOAD_AFTER))
            }
            Ok(reply) => {
                let message = reply.message().unwrap_or("Update failed.").to_owned();
                Err(self.fail(ActionError::Rejected(message.clone()), &message))
            }
            Err(error @ ActionError::Attachment(_)) => {
                Err(self.fail(error, "Error reading selected file."))
            }
            Err(error) => Err(self.fail(error, "Error sending update.")),
        }
    }

    fn switch_mode(&mut self, mode: Mode) -> Vec<ControllerEvent> {
        if let Err(error) = self.session.set(MODE_KEY, mode.as_str()) {
            log::warn!("session storage unavailable: {error:#}");
        }
        self.form.reset();
        self.search_input.clear();
        self.set_mode(mode);
        self.enter_baseline();
        vec![
            ControllerEvent::ModeChanged(mode),
            ControllerEvent::ControlsChanged(self.controls),
            ControllerEvent::FormReset,
        ]
    }

    /// Insert exposes its allow-list; query exposes only the identifier
    /// until a search succeeds.
    fn enter_baseline(&mut self) {
        match self.mode {
            Mode::Insert => self.apply_enablement_policy(Mode::Insert),
            Mode::Query => {
                let id_field = self.policy.id_field().to_owned();
                self.restrict_all_except(&[id_field.as_str()]);
            }
        }
    }

    fn ensure_ready(&self, action: ActionKind, mode: Mode) -> Result<(), ActionError> {
        if let Some(current) = self.in_flight {
            return Err(ActionError::Busy(current));
        }
        if self.mode != mode {
            return Err(ActionError::WrongMode {
                action,
                mode: self.mode,
            });
        }
        Ok(())
    }

    fn start(&mut self, kind: ActionKind, progress: &str) {
        self.in_flight = Some(kind);
        self.set_status(StatusMessage::pending(progress));
    }

    fn fail_input(&mut self, message: &str) -> ActionError {
        self.fail(ActionError::MissingInput(message.to_owned()), message)
    }

    fn fail(&mut self, error: ActionError, message: &str) -> ActionError {
        self.set_status(StatusMessage::error(message));
        error
    }

    fn set_status(&mut self, message: StatusMessage) -> ControllerEvent {
        self.status = Some(message.clone());
        self.status_revision = self.status_revision.saturating_add(1);
        ControllerEvent::StatusUpdated(message)
    }

    fn clear_status(&mut self) -> ControllerEvent {
        self.status = None;
        self.status_revision = self.status_revision.saturating_add(1);
        ControllerEvent::StatusCleared
    }
}
