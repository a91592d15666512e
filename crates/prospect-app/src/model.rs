// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Flat name → value payload sent to the record service.
pub type FieldMap = BTreeMap<String, String>;

/// One remote record as returned by a lookup.
pub type Record = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Insert,
    Query,
}

impl Mode {
    pub const ALL: [Self; 2] = [Self::Insert, Self::Query];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Query => "query",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "insert" => Some(Self::Insert),
            "query" => Some(Self::Query),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Insert => "new record",
            Self::Query => "look up",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Insert => Self::Query,
            Self::Query => Self::Insert,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    TextArea,
    Date,
    Number,
    Select,
    File,
    Hidden,
}

impl FieldKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::TextArea => "textarea",
            Self::Date => "date",
            Self::Number => "number",
            Self::Select => "select",
            Self::File => "file",
            Self::Hidden => "hidden",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "textarea" => Some(Self::TextArea),
            "date" => Some(Self::Date),
            "number" => Some(Self::Number),
            "select" => Some(Self::Select),
            "file" => Some(Self::File),
            "hidden" => Some(Self::Hidden),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Option whose value doubles as its label.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub value: String,
    pub default_value: String,
    pub enabled: bool,
    pub options: Vec<SelectOption>,
}

impl FormField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            kind,
            value: String::new(),
            default_value: String::new(),
            enabled: true,
            options: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// A select starts on its first option, as a browser select does.
    pub fn select(name: impl Into<String>, options: Vec<SelectOption>) -> Self {
        let mut field = Self::new(name, FieldKind::Select);
        let first = options
            .first()
            .map(|option| option.value.clone())
            .unwrap_or_default();
        field.options = options;
        field.value = first.clone();
        field.default_value = first;
        field
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.value = value.clone();
        self.default_value = value;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.options
            .iter()
            .position(|option| option.value == self.value)
    }

    pub fn select_index(&mut self, index: usize) -> bool {
        match self.options.get(index) {
            Some(option) => {
                self.value = option.value.clone();
                true
            }
            None => false,
        }
    }

    pub fn cycle_option(&mut self, delta: isize) {
        if self.options.is_empty() {
            return;
        }
        let len = self.options.len() as isize;
        let current = self.selected_index().map_or(-1, |index| index as isize);
        let next = if current < 0 && delta < 0 {
            len - 1
        } else {
            (current + delta).rem_euclid(len)
        };
        self.select_index(next as usize);
    }

    pub fn reset(&mut self) {
        self.value = self.default_value.clone();
    }

    pub fn display_value(&self) -> &str {
        match self.kind {
            FieldKind::Select => self
                .selected_index()
                .and_then(|index| self.options.get(index))
                .map_or(self.value.as_str(), |option| option.label.as_str()),
            _ => &self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Form {
    fields: Vec<FormField>,
}

impl Form {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FormField> {
        self.fields.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut FormField> {
        self.fields.get_mut(index)
    }

    /// First control carrying exactly `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.position(name).map(|index| &self.fields[index])
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.position(name).map(|index| &mut self.fields[index])
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.field(name).map(|field| field.value.as_str())
    }

    /// Resolves a record key: exact name, then uppercased, then lowercased.
    pub fn resolve(&self, key: &str) -> Option<usize> {
        self.position(key)
            .or_else(|| self.position(&key.to_uppercase()))
            .or_else(|| self.position(&key.to_lowercase()))
    }

    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.reset();
        }
    }

    /// Applies `is_enabled` to every named control; unnamed controls are left alone.
    pub fn set_enabled_where(&mut self, is_enabled: impl Fn(&str) -> bool) {
        for field in self.fields.iter_mut().filter(|field| !field.name.is_empty()) {
            field.enabled = is_enabled(&field.name);
        }
    }

    pub fn enabled_names(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.enabled && !field.name.is_empty())
            .map(|field| field.name.as_str())
            .collect()
    }

    /// Serializable entries in document order: enabled, named, scalar controls.
    /// File controls never serialize; their content travels as an attachment.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        self.fields
            .iter()
            .filter(|field| field.enabled && !field.name.is_empty())
            .filter(|field| field.kind != FieldKind::File)
            .map(|field| (field.name.as_str(), field.value.as_str()))
            .collect()
    }

    /// Path chosen in the first file control, if any.
    pub fn selected_file(&self) -> Option<PathBuf> {
        self.fields
            .iter()
            .filter(|field| field.kind == FieldKind::File)
            .map(|field| field.value.trim())
            .find(|value| !value.is_empty())
            .map(PathBuf::from)
    }

    pub(crate) fn push(&mut self, field: FormField) {
        self.fields.push(field);
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.fields.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldKind, Form, FormField, Mode, SelectOption};
    use std::path::PathBuf;

    fn sample() -> Form {
        Form::new(vec![
            FormField::text("NAME"),
            FormField::text("notes"),
            FormField::select(
                "STATUS",
                vec![SelectOption::plain("open"), SelectOption::plain("closed")],
            ),
            FormField::new("theFile", FieldKind::File),
        ])
    }

    #[test]
    fn mode_round_trips_through_strings() {
        for mode in Mode::ALL {
            assert_eq!(Mode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(Mode::parse("ingresar"), None);
        assert_eq!(Mode::Insert.toggled(), Mode::Query);
    }

    #[test]
    fn resolve_falls_back_to_upper_then_lower_case() {
        let form = sample();
        assert_eq!(form.resolve("NAME"), Some(0));
        assert_eq!(form.resolve("name"), Some(0));
        assert_eq!(form.resolve("NOTES"), Some(1));
        assert_eq!(form.resolve("Missing"), None);
    }

    #[test]
    fn duplicate_names_resolve_to_first_control() {
        let mut form = sample();
        form.push(FormField::text("NAME").with_default("second"));
        assert_eq!(form.position("NAME"), Some(0));
        assert_eq!(form.value("NAME"), Some(""));
    }

    #[test]
    fn entries_skip_disabled_and_file_controls() {
        let mut form = sample();
        form.set_enabled_where(|name| name != "notes");
        form.field_mut("theFile").expect("file field").value = "/tmp/a.pdf".to_owned();

        let names = form
            .entries()
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["NAME", "STATUS"]);
        assert_eq!(form.selected_file(), Some(PathBuf::from("/tmp/a.pdf")));
    }

    #[test]
    fn select_starts_on_first_option_and_cycles() {
        let mut form = sample();
        let status = form.field_mut("STATUS").expect("status field");
        assert_eq!(status.value, "open");
        status.cycle_option(1);
        assert_eq!(status.value, "closed");
        status.cycle_option(1);
        assert_eq!(status.value, "open");
        status.cycle_option(-1);
        assert_eq!(status.value, "closed");
    }

    #[test]
    fn reset_restores_defaults() {
        let mut form = Form::new(vec![FormField::text("STATUS").with_default("pending")]);
        form.field_mut("STATUS").expect("status field").value = "done".to_owned();
        form.reset();
        assert_eq!(form.value("STATUS"), Some("pending"));
    }
}
