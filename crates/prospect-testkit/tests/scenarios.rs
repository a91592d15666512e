// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use prospect_app::{
    ActionError, FieldKind, FieldPolicy, Followup, Form, FormController, FormField,
    MemorySessionStore, Mode, RELOAD_AFTER, ServiceReply, StatusKind, default_form,
    default_policy,
};
use prospect_testkit::{
    FailingSessionStore, FakeService, ProspectFaker, ServiceCall, fixture_date, record,
    small_form, small_policy, temp_attachment,
};
use serde_json::{Value, json};
use std::collections::BTreeSet;

fn query_controller(form: Form, policy: FieldPolicy) -> FormController<MemorySessionStore> {
    FormController::new(form, policy, Mode::Query, MemorySessionStore::new())
}

fn status_text<S: prospect_app::SessionStore>(controller: &FormController<S>) -> Option<String> {
    controller.status().map(|status| status.text.clone())
}

#[test]
fn insert_collect_all_carries_disabled_prefilled_field() {
    let form = Form::new(vec![
        FormField::text("NAME"),
        FormField::new("AMOUNT", FieldKind::Number),
        FormField::text("STATUS").with_default("pending").disabled(),
    ]);
    let policy = FieldPolicy::new("ID", ["NAME", "AMOUNT"], ["NOTES"]);
    let mut controller =
        FormController::new(form, policy, Mode::Insert, MemorySessionStore::new());

    assert!(controller.input(0, "Acme"));
    assert!(controller.input(1, "125"));
    let payload = controller.collect_all();

    let expected = [("AMOUNT", "125"), ("NAME", "Acme"), ("STATUS", "pending")]
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .collect();
    assert_eq!(payload, expected);
    assert_eq!(controller.form().len(), 3);
}

#[test]
fn search_not_found_keeps_update_hidden_and_reports_error() {
    let service = FakeService::new().reply(ServiceReply::not_found());
    let mut controller = query_controller(small_form(), small_policy());
    controller.set_search_input("X1");

    let error = controller
        .search_with(&service)
        .expect_err("not found is an error");
    assert_eq!(error, ActionError::Rejected("Identifier not found.".to_owned()));
    assert!(!controller.controls().update_visible);
    assert_eq!(controller.status().map(|status| status.kind), Some(StatusKind::Error));
    assert_eq!(status_text(&controller).as_deref(), Some("Identifier not found."));
    assert_eq!(service.calls(), vec![ServiceCall::Lookup("X1".to_owned())]);
}

#[test]
fn search_then_update_sends_only_changed_editable_fields() -> Result<()> {
    let form = Form::new(vec![
        FormField::text("ID"),
        FormField::text("NOTES"),
        FormField::text("OTHER"),
    ]);
    let policy = FieldPolicy::new("ID", ["ID"], ["NOTES", "OTHER"]);
    let service = FakeService::new()
        .reply(ServiceReply::found(record(&[
            ("ID", json!("X1")),
            ("NOTES", json!("old")),
        ])))
        .reply(ServiceReply::success(""));
    let mut controller = query_controller(form, policy);
    controller.set_search_input("X1");

    assert_eq!(controller.search_with(&service), Ok(Followup::Stay));
    assert!(controller.controls().update_visible);
    assert_eq!(controller.form().value("ID"), Some("X1"));
    assert_eq!(controller.form().enabled_names(), vec!["NOTES", "OTHER"]);

    assert!(controller.input(1, "new"));
    let allow = ["NOTES", "OTHER"]
        .into_iter()
        .map(str::to_owned)
        .collect::<BTreeSet<_>>();
    let subset = controller.collect_editable_subset(&allow);
    assert_eq!(subset.len(), 1);
    assert_eq!(subset.get("NOTES").map(String::as_str), Some("new"));

    assert_eq!(controller.update_with(&service), Ok(Followup::Reload(RELOAD_AFTER)));
    assert_eq!(status_text(&controller).as_deref(), Some("Record updated."));
    let calls = service.calls();
    let Some(ServiceCall::Update(request)) = calls.last() else {
        panic!("expected an update call, got {calls:?}");
    };
    assert_eq!(request.id, "X1");
    assert_eq!(request.updates.fields, subset);
    assert_eq!(request.updates.file_data, None);
    Ok(())
}

#[test]
fn unreadable_attachment_aborts_update_before_network() -> Result<()> {
    let service = FakeService::new().reply(ServiceReply::found(record(&[
        ("ID", json!("X1")),
        ("NOTES", json!("old")),
    ])));
    let mut controller = query_controller(small_form(), small_policy());
    controller.set_search_input("X1");
    controller.search_with(&service)?;

    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("gone.pdf");
    let file_index = controller
        .form()
        .position("theFile")
        .expect("attachment control");
    assert!(controller.input(file_index, missing.display().to_string()));

    let error = controller
        .update_with(&service)
        .expect_err("unreadable file fails the update");
    assert!(matches!(error, ActionError::Attachment(_)));
    assert_eq!(status_text(&controller).as_deref(), Some("Error reading selected file."));
    assert_eq!(service.calls().len(), 1);
    assert_eq!(controller.in_flight(), None);
    Ok(())
}

#[test]
fn submit_attaches_selected_file_and_resets_form() -> Result<()> {
    let (_dir, path) = temp_attachment("quote.pdf", b"%PDF-1.4")?;
    let policy = FieldPolicy::new("ID", ["NAME", "theFile"], ["NOTES"]);
    let service = FakeService::new();
    let mut controller =
        FormController::new(small_form(), policy, Mode::Insert, MemorySessionStore::new());

    assert!(controller.input(1, "Acme"));
    assert!(controller.input(5, path.display().to_string()));
    assert_eq!(controller.submit_with(&service), Ok(Followup::Reload(RELOAD_AFTER)));
    assert_eq!(
        status_text(&controller).as_deref(),
        Some("Data submitted successfully!")
    );
    assert_eq!(controller.form().value("NAME"), Some(""));

    let calls = service.calls();
    let Some(ServiceCall::Insert(request)) = calls.first() else {
        panic!("expected an insert call, got {calls:?}");
    };
    assert_eq!(request.fields.get("NAME").map(String::as_str), Some("Acme"));
    assert_eq!(request.fields.get("STATUS").map(String::as_str), Some("pending"));
    assert!(!request.fields.contains_key("theFile"));
    let attachment = request.file_data.as_ref().expect("attachment sent");
    assert_eq!(attachment.file_name, "quote.pdf");
    assert_eq!(attachment.mime_type, "application/pdf");
    assert_eq!(attachment.decoded_len()?, 8);
    Ok(())
}

#[test]
fn transport_failure_on_submit_is_reported_and_releases_guard() {
    let service = FakeService::new().fail("cannot reach script.example.com");
    let mut controller = FormController::new(
        small_form(),
        small_policy(),
        Mode::Insert,
        MemorySessionStore::new(),
    );
    controller.input(1, "Acme");

    let error = controller.submit_with(&service).expect_err("transport fails");
    assert!(matches!(error, ActionError::Transport(_)));
    assert_eq!(
        status_text(&controller).as_deref(),
        Some("Error: cannot reach script.example.com")
    );
    assert_eq!(controller.form().value("NAME"), Some("Acme"));
    assert_eq!(controller.in_flight(), None);
}

#[test]
fn unavailable_session_storage_still_switches_modes() {
    let mut controller = FormController::new(
        small_form(),
        small_policy(),
        Mode::Query,
        FailingSessionStore,
    );
    assert_eq!(controller.mode(), Mode::Query);
    controller.dispatch(prospect_app::ControllerCommand::SwitchMode(Mode::Insert));
    assert_eq!(controller.mode(), Mode::Insert);
    assert_eq!(controller.form().enabled_names(), vec!["NAME", "AMOUNT"]);
}

#[test]
fn populate_then_collect_all_reproduces_matching_record_keys() {
    for seed in 1..=25 {
        let mut faker = ProspectFaker::new(seed);
        let record = faker.record();
        let mut controller = FormController::new(
            default_form(fixture_date()),
            default_policy(),
            Mode::Insert,
            MemorySessionStore::new(),
        );
        let before = controller.form().len();

        let report = controller.populate(&record);
        assert!(report.is_clean(), "seed {seed}: {:?}", report.failed);
        let payload = controller.collect_all();
        assert_eq!(controller.form().len(), before, "seed {seed}: carriers leaked");

        for (key, value) in &record {
            let Some(index) = controller.form().resolve(key) else {
                continue;
            };
            let field = controller.form().get(index).expect("resolved index");
            if field.kind == FieldKind::File {
                continue;
            }
            let expected = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            assert_eq!(
                payload.get(&field.name),
                Some(&expected),
                "seed {seed}: key {key}"
            );
        }
    }
}

#[test]
fn populate_creates_and_selects_unknown_option() {
    let mut controller = query_controller(default_form(fixture_date()), default_policy());
    let report = controller.populate(&record(&[("ESTATUS", json!("EN REVISION"))]));
    assert_eq!(report.filled, vec!["ESTATUS".to_owned()]);

    let field = controller.form().field("ESTATUS").expect("status select");
    assert_eq!(field.value, "EN REVISION");
    assert_eq!(
        field.options.last().map(|option| option.value.as_str()),
        Some("EN REVISION")
    );
}
