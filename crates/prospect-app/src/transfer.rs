// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde_json::Value;
use std::collections::BTreeSet;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::{FieldKind, FieldMap, Form, FormField, Record, SelectOption};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionResolution {
    Existing(usize),
    Created(usize),
}

impl OptionResolution {
    pub const fn index(self) -> usize {
        match self {
            Self::Existing(index) | Self::Created(index) => index,
        }
    }
}

/// Find-or-create: matches `target` against option values and labels,
/// trimmed and case-insensitively; appends a new option when nothing matches.
pub fn resolve_option(options: &mut Vec<SelectOption>, target: &str) -> OptionResolution {
    let wanted = target.trim();
    let wanted_folded = wanted.to_lowercase();
    let matches = |text: &str| text.trim().to_lowercase() == wanted_folded;

    if let Some(index) = options
        .iter()
        .position(|option| matches(&option.value) || matches(&option.label))
    {
        return OptionResolution::Existing(index);
    }

    options.push(SelectOption::plain(wanted));
    OptionResolution::Created(options.len() - 1)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopulateReport {
    pub filled: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl PopulateReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Form {
    /// Runs `serialize` with one hidden carrier appended per disabled scalar
    /// control. Carriers are gone when this returns, whatever `serialize` did.
    pub fn with_carriers<T>(&mut self, serialize: impl FnOnce(&Form) -> T) -> T {
        let mark = self.len();
        let carriers = self
            .fields()
            .iter()
            .filter(|field| !field.enabled && !field.name.is_empty())
            .filter(|field| field.kind != FieldKind::File)
            .map(|field| {
                FormField::new(field.name.clone(), FieldKind::Hidden).with_default(field.value.clone())
            })
            .collect::<Vec<_>>();
        log::debug!("created {} carrier fields", carriers.len());
        for carrier in carriers {
            self.push(carrier);
        }

        let guard = CarrierGuard { form: self, mark };
        let output = serialize(&*guard.form);
        drop(guard);
        output
    }

    /// Flat name → value map of everything that serializes. Later controls
    /// with the same name overwrite earlier ones.
    pub fn to_field_map(&self) -> FieldMap {
        self.entries()
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect()
    }

    /// Update payload: allowed, enabled, non-empty fields; never the identifier.
    pub fn collect_editable_subset(&self, allow_list: &BTreeSet<String>, id_field: &str) -> FieldMap {
        self.entries()
            .into_iter()
            .filter(|(name, _)| *name != id_field)
            .filter(|(name, _)| allow_list.contains(*name))
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect()
    }

    /// Copies a fetched record into matching controls. A key that fails is
    /// logged and recorded; the remaining keys are still applied.
    pub fn populate(&mut self, record: &Record) -> PopulateReport {
        let mut report = PopulateReport::default();
        for (key, value) in record {
            let Some(index) = self.resolve(key) else {
                report.skipped.push(key.clone());
                continue;
            };
            match self.get_mut(index).map(|field| assign(field, value)) {
                Some(Ok(())) => report.filled.push(key.clone()),
                Some(Err(error)) => {
                    log::warn!("error filling field {key}: {error:#}");
                    report.failed.push((key.clone(), format!("{error:#}")));
                }
                None => report.skipped.push(key.clone()),
            }
        }
        report
    }
}

struct CarrierGuard<'a> {
    form: &'a mut Form,
    mark: usize,
}

impl Drop for CarrierGuard<'_> {
    fn drop(&mut self) {
        self.form.truncate(self.mark);
    }
}

fn assign(field: &mut FormField, value: &Value) -> Result<()> {
    let text = scalar_text(value)?;
    match field.kind {
        FieldKind::Select => {
            let resolution = resolve_option(&mut field.options, &text);
            field.select_index(resolution.index());
        }
        FieldKind::Date => field.value = normalize_date(&text)?,
        FieldKind::File => bail!("file inputs cannot be filled from a record"),
        _ => field.value = text,
    }
    Ok(())
}

fn scalar_text(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(text) => Ok(text.clone()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Array(_) | Value::Object(_) => bail!("value is not a scalar"),
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp and keeps the date part.
pub fn normalize_date(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    let date_format = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(trimmed, date_format) {
        return Ok(date.format(date_format)?);
    }
    match OffsetDateTime::parse(trimmed, &Rfc3339) {
        Ok(timestamp) => Ok(timestamp.date().format(date_format)?),
        Err(_) => bail!("{trimmed:?} is not a date; expected YYYY-MM-DD"),
    }
}

#[cfg(test)]
mod tests {
    use super::{OptionResolution, normalize_date, resolve_option};
    use crate::{FieldKind, Form, FormField, Record, SelectOption};
    use anyhow::{Result, anyhow};
    use serde_json::json;
    use std::collections::BTreeSet;

    fn record(value: serde_json::Value) -> Record {
        serde_json::from_value(value).expect("record literal")
    }

    fn allow(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn resolve_option_matches_value_or_label_ignoring_case_and_space() {
        let mut options = vec![
            SelectOption::new("A1", "Central"),
            SelectOption::new("B2", "Western"),
        ];
        assert_eq!(resolve_option(&mut options, " b2 "), OptionResolution::Existing(1));
        assert_eq!(resolve_option(&mut options, "CENTRAL"), OptionResolution::Existing(0));
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn resolve_option_appends_unmatched_value() {
        let mut options = vec![SelectOption::plain("open")];
        let resolution = resolve_option(&mut options, "  archived ");
        assert_eq!(resolution, OptionResolution::Created(1));
        assert_eq!(options[1], SelectOption::plain("archived"));
    }

    #[test]
    fn carriers_mirror_disabled_fields_during_serialization() {
        let mut form = Form::new(vec![
            FormField::text("NAME").with_default("Acme"),
            FormField::text("STATUS").with_default("pending").disabled(),
            FormField::new("theFile", FieldKind::File).disabled(),
        ]);

        let (map, hidden) = form.with_carriers(|form| {
            let hidden = form
                .fields()
                .iter()
                .filter(|field| field.kind == FieldKind::Hidden)
                .count();
            (form.to_field_map(), hidden)
        });

        assert_eq!(hidden, 1);
        assert_eq!(map.get("STATUS").map(String::as_str), Some("pending"));
        assert_eq!(map.get("NAME").map(String::as_str), Some("Acme"));
        assert!(!map.contains_key("theFile"));
        assert_eq!(form.len(), 3);
    }

    #[test]
    fn carriers_are_removed_when_serialization_fails() {
        let mut form = Form::new(vec![FormField::text("STATUS").disabled()]);
        let result: Result<()> = form.with_carriers(|_| Err(anyhow!("boom")));
        assert!(result.is_err());
        assert_eq!(form.len(), 1);
        assert!(form.fields().iter().all(|field| field.kind != FieldKind::Hidden));
    }

    #[test]
    fn carriers_are_removed_when_serialization_panics() {
        let mut form = Form::new(vec![FormField::text("STATUS").disabled()]);
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: () = form.with_carriers(|_| panic!("serializer exploded"));
        }));
        assert!(outcome.is_err());
        assert_eq!(form.len(), 1);
    }

    #[test]
    fn editable_subset_drops_identifier_and_empty_values() {
        let form = Form::new(vec![
            FormField::text("ID").with_default("X1"),
            FormField::text("NOTES").with_default("new"),
            FormField::text("CATEGORY"),
            FormField::text("NAME").with_default("Acme"),
        ]);
        let subset = form.collect_editable_subset(&allow(&["ID", "NOTES", "CATEGORY"]), "ID");
        assert_eq!(subset.len(), 1);
        assert_eq!(subset.get("NOTES").map(String::as_str), Some("new"));
    }

    #[test]
    fn editable_subset_ignores_disabled_fields() {
        let form = Form::new(vec![FormField::text("NOTES").with_default("kept").disabled()]);
        assert!(form.collect_editable_subset(&allow(&["NOTES"]), "ID").is_empty());
    }

    #[test]
    fn populate_matches_names_case_insensitively() {
        let mut form = Form::new(vec![FormField::text("NAME"), FormField::text("notes")]);
        let report = form.populate(&record(json!({"name": "Acme", "Notes": "hi", "extra": 1})));
        assert_eq!(form.value("NAME"), Some("Acme"));
        assert_eq!(form.value("notes"), Some("hi"));
        assert_eq!(report.skipped, vec!["extra".to_owned()]);
        assert!(report.is_clean());
    }

    #[test]
    fn populate_creates_and_selects_missing_option() {
        let mut form = Form::new(vec![FormField::select(
            "STATUS",
            vec![SelectOption::plain("open")],
        )]);
        form.populate(&record(json!({"STATUS": " Archived "})));
        let field = form.field("STATUS").expect("status field");
        assert_eq!(field.options.len(), 2);
        assert_eq!(field.value, "Archived");
        assert_eq!(field.selected_index(), Some(1));
    }

    #[test]
    fn populate_assigns_first_of_duplicate_controls() {
        let mut form = Form::new(vec![FormField::text("TAG"), FormField::text("TAG")]);
        form.populate(&record(json!({"TAG": "first"})));
        assert_eq!(form.get(0).map(|field| field.value.as_str()), Some("first"));
        assert_eq!(form.get(1).map(|field| field.value.as_str()), Some(""));
    }

    #[test]
    fn populate_continues_after_a_failing_key() {
        let mut form = Form::new(vec![
            FormField::new("DATE", FieldKind::Date),
            FormField::text("LIST"),
            FormField::text("NAME"),
            FormField::text("AMOUNT"),
        ]);
        let report = form.populate(&record(json!({
            "DATE": "next tuesday",
            "LIST": [1, 2],
            "NAME": "Acme",
            "AMOUNT": 12.5,
        })));
        assert_eq!(report.failed.len(), 2);
        assert_eq!(form.value("NAME"), Some("Acme"));
        assert_eq!(form.value("AMOUNT"), Some("12.5"));
        assert_eq!(form.value("DATE"), Some(""));
    }

    #[test]
    fn populate_writes_null_as_empty() {
        let mut form = Form::new(vec![FormField::text("NAME").with_default("x")]);
        form.populate(&record(json!({"NAME": null})));
        assert_eq!(form.value("NAME"), Some(""));
    }

    #[test]
    fn normalize_date_keeps_date_part_of_timestamps() -> Result<()> {
        assert_eq!(normalize_date("2025-03-04")?, "2025-03-04");
        assert_eq!(normalize_date("2025-03-04T04:00:00.000Z")?, "2025-03-04");
        assert_eq!(normalize_date("")?, "");
        assert!(normalize_date("04/03/2025").is_err());
        Ok(())
    }
}
