// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use prospect_app::{
    ActionError, ActionKind, ControllerCommand, FieldKind, Followup, FormController, FormField,
    Job, JobOutcome, Mode, RecordService, SessionStore, StatusKind,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const LABEL_WIDTH: usize = 18;

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    ActionFinished(JobOutcome),
    Reload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Search,
    Field(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewData {
    focus: Focus,
    status_token: u64,
}

impl Default for ViewData {
    fn default() -> Self {
        Self {
            focus: Focus::Search,
            status_token: 0,
        }
    }
}

pub fn run_app<R, S>(controller: &mut FormController<S>, service: R) -> Result<()>
where
    R: RecordService + Clone + Send + 'static,
    S: SessionStore,
{
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    reset_focus(controller, &mut view_data);
    view_data.status_token = controller.status_revision();

    let mut result = Ok(());
    loop {
        process_internal_events(controller, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, controller, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(controller, &service, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events<S: SessionStore>(
    controller: &mut FormController<S>,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } => {
                controller.expire_status(token);
                view_data.status_token = controller.status_revision();
            }
            InternalEvent::ActionFinished(outcome) => {
                let kind = outcome.kind;
                match controller.finish(outcome) {
                    Ok(Followup::Reload(delay)) => schedule_reload(tx, delay),
                    Ok(Followup::Stay) if kind == ActionKind::Search => {
                        focus_first_field(controller, view_data);
                    }
                    Ok(Followup::Stay) => {}
                    Err(error) => log::debug!("{kind} finished with error: {error}"),
                }
                sync_status(controller, view_data, tx);
            }
            InternalEvent::Reload => {
                controller.dispatch(ControllerCommand::Reload);
                reset_focus(controller, view_data);
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64, delay: Duration) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn schedule_reload(internal_tx: &Sender<InternalEvent>, delay: Duration) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(InternalEvent::Reload);
    });
}

/// Arms the auto-hide timer for a status message the controller just posted.
fn sync_status<S: SessionStore>(
    controller: &FormController<S>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let revision = controller.status_revision();
    if revision == view_data.status_token {
        return;
    }
    view_data.status_token = revision;
    if let Some(delay) = controller.status().and_then(|status| status.hide_after) {
        schedule_status_clear(internal_tx, revision, delay);
    }
}

fn spawn_job<R>(service: &R, internal_tx: &Sender<InternalEvent>, job: Job)
where
    R: RecordService + Clone + Send + 'static,
{
    let service = service.clone();
    let sender = internal_tx.clone();
    thread::spawn(move || {
        let outcome = job.run(&service);
        let _ = sender.send(InternalEvent::ActionFinished(outcome));
    });
}

fn start_action<R, S>(
    controller: &mut FormController<S>,
    service: &R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: ActionKind,
) where
    R: RecordService + Clone + Send + 'static,
    S: SessionStore,
{
    match controller.begin(kind) {
        Ok(job) => spawn_job(service, internal_tx, job),
        Err(ActionError::Busy(current)) => log::debug!("{kind} ignored while {current} runs"),
        Err(error) => log::debug!("{kind} not started: {error}"),
    }
    sync_status(controller, view_data, internal_tx);
}

fn handle_key_event<R, S>(
    controller: &mut FormController<S>,
    service: &R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool
where
    R: RecordService + Clone + Send + 'static,
    S: SessionStore,
{
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q') if ctrl => return true,
        KeyCode::Char('s') if ctrl => {
            start_action(controller, service, view_data, internal_tx, ActionKind::Submit);
        }
        KeyCode::Char('f') if ctrl => {
            start_action(controller, service, view_data, internal_tx, ActionKind::Search);
        }
        KeyCode::Char('u') if ctrl => {
            if controller.controls().update_visible {
                start_action(controller, service, view_data, internal_tx, ActionKind::Update);
            }
        }
        KeyCode::Char('l') if ctrl => {
            if controller.mode() == Mode::Query && controller.in_flight().is_none() {
                controller.dispatch(ControllerCommand::ClearSearch);
                reset_focus(controller, view_data);
            }
        }
        KeyCode::F(2) => {
            if controller.in_flight().is_none() {
                let next = controller.mode().toggled();
                controller.dispatch(ControllerCommand::SwitchMode(next));
                reset_focus(controller, view_data);
            }
        }
        KeyCode::Esc => {
            if controller.in_flight().is_none() {
                controller.dispatch(ControllerCommand::Cancel);
            }
        }
        KeyCode::Tab | KeyCode::Down => move_focus(controller, view_data, 1),
        KeyCode::BackTab | KeyCode::Up => move_focus(controller, view_data, -1),
        KeyCode::Left => cycle_focused_option(controller, view_data, -1),
        KeyCode::Right => cycle_focused_option(controller, view_data, 1),
        KeyCode::Enter => {
            if let Some(kind) = enter_action(controller, view_data) {
                start_action(controller, service, view_data, internal_tx, kind);
            }
        }
        KeyCode::Backspace => edit_focused(controller, view_data, |value| {
            value.pop();
        }),
        KeyCode::Char(ch) if !ctrl => edit_focused(controller, view_data, |value| value.push(ch)),
        _ => {}
    }
    sync_status(controller, view_data, internal_tx);
    false
}

fn enter_action<S: SessionStore>(
    controller: &FormController<S>,
    view_data: &ViewData,
) -> Option<ActionKind> {
    match (controller.mode(), view_data.focus) {
        (Mode::Query, Focus::Search) => Some(ActionKind::Search),
        (Mode::Query, Focus::Field(_)) if controller.controls().update_visible => {
            Some(ActionKind::Update)
        }
        (Mode::Query, Focus::Field(_)) => None,
        (Mode::Insert, _) => Some(ActionKind::Submit),
    }
}

fn edit_focused<S: SessionStore>(
    controller: &mut FormController<S>,
    view_data: &ViewData,
    edit: impl FnOnce(&mut String),
) {
    if controller.in_flight().is_some() {
        return;
    }
    match view_data.focus {
        Focus::Search => {
            let mut value = controller.search_input().to_owned();
            edit(&mut value);
            controller.set_search_input(value);
        }
        Focus::Field(index) => {
            let Some(field) = controller.form().get(index) else {
                return;
            };
            if field.kind == FieldKind::Select {
                return;
            }
            let mut value = field.value.clone();
            edit(&mut value);
            controller.input(index, value);
        }
    }
}

fn cycle_focused_option<S: SessionStore>(
    controller: &mut FormController<S>,
    view_data: &ViewData,
    delta: isize,
) {
    if let Focus::Field(index) = view_data.focus {
        controller.cycle_option(index, delta);
    }
}

fn focus_targets<S: SessionStore>(controller: &FormController<S>) -> Vec<Focus> {
    let mut targets = Vec::new();
    if controller.mode() == Mode::Query {
        targets.push(Focus::Search);
    }
    targets.extend(
        controller
            .form()
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| field.enabled && field.kind != FieldKind::Hidden)
            .map(|(index, _)| Focus::Field(index)),
    );
    targets
}

fn reset_focus<S: SessionStore>(controller: &FormController<S>, view_data: &mut ViewData) {
    view_data.focus = focus_targets(controller)
        .first()
        .copied()
        .unwrap_or(Focus::Search);
}

fn focus_first_field<S: SessionStore>(controller: &FormController<S>, view_data: &mut ViewData) {
    if let Some(first) = focus_targets(controller)
        .into_iter()
        .find(|target| matches!(target, Focus::Field(_)))
    {
        view_data.focus = first;
    }
}

fn move_focus<S: SessionStore>(controller: &FormController<S>, view_data: &mut ViewData, delta: isize) {
    let targets = focus_targets(controller);
    if targets.is_empty() {
        return;
    }
    let len = targets.len() as isize;
    let next = match targets.iter().position(|target| *target == view_data.focus) {
        Some(current) => (current as isize + delta).rem_euclid(len),
        None => 0,
    };
    view_data.focus = targets[next as usize];
}

fn render<S: SessionStore>(
    frame: &mut ratatui::Frame<'_>,
    controller: &FormController<S>,
    view_data: &ViewData,
) {
    let search_height = if controller.controls().search_visible { 3 } else { 0 };
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(search_height),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = Mode::ALL
        .iter()
        .position(|mode| *mode == controller.mode())
        .unwrap_or(0);
    let tabs = Tabs::new(Mode::ALL.iter().map(|mode| mode.label()).collect::<Vec<_>>())
        .block(Block::default().title("prospect").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    if controller.controls().search_visible {
        let style = if view_data.focus == Focus::Search {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let search = Paragraph::new(controller.search_input().to_owned())
            .style(style)
            .block(Block::default().title("identifier").borders(Borders::ALL));
        frame.render_widget(search, layout[1]);
    }

    let lines = controller
        .form()
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| field.kind != FieldKind::Hidden)
        .map(|(index, field)| field_line(field, view_data.focus == Focus::Field(index)))
        .collect::<Vec<_>>();
    let fields = Paragraph::new(lines).block(Block::default().title("record").borders(Borders::ALL));
    frame.render_widget(fields, layout[2]);

    let status = Paragraph::new(status_text(controller))
        .style(status_style(controller))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);
}

fn field_line(field: &FormField, focused: bool) -> Line<'static> {
    let marker = if focused { "> " } else { "  " };
    let value = match field.kind {
        FieldKind::Select => format!("< {} >", field.display_value()),
        _ => field.display_value().to_owned(),
    };
    let style = match (field.enabled, focused) {
        (_, true) => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        (true, false) => Style::default(),
        (false, false) => Style::default().fg(Color::DarkGray),
    };
    Line::from(vec![
        Span::styled(
            format!("{marker}{:<width$}", field.label, width = LABEL_WIDTH),
            style,
        ),
        Span::styled(value, style),
    ])
}

fn key_hints<S: SessionStore>(controller: &FormController<S>) -> String {
    let controls = controller.controls();
    let mut hints = vec!["tab/shift+tab field", "left/right choose"];
    if controls.search_visible {
        hints.push("ctrl+f search");
        hints.push("ctrl+l clear");
    }
    if controls.submit_visible {
        hints.push("ctrl+s submit");
    }
    if controls.update_visible {
        hints.push("ctrl+u update");
    }
    hints.extend(["esc cancel", "F2 mode", "ctrl+q quit"]);
    hints.join(" | ")
}

fn status_text<S: SessionStore>(controller: &FormController<S>) -> String {
    let hints = key_hints(controller);
    match controller.status() {
        Some(status) => format!("{} | {hints}", status.text),
        None => hints,
    }
}

fn status_style<S: SessionStore>(controller: &FormController<S>) -> Style {
    let color = match controller.status().map(|status| status.kind) {
        Some(StatusKind::Info) | None => Color::Yellow,
        Some(StatusKind::Success) => Color::Green,
        Some(StatusKind::Error) => Color::Red,
    };
    Style::default().fg(color)
}
