// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::{DEFAULT_ID_FIELD, FieldKind, FieldPolicy, Form, FormField, SelectOption};

pub const DEFAULT_INSERT_EDITABLE: [&str; 12] = [
    "FECHA",
    "REGION",
    "EJECUTIVO",
    "RIF",
    "RAZON_SOCIAL",
    "SERVICIO",
    "PROPUESTA",
    "SRM",
    "DESCUENTO",
    "ESTATUS",
    "OBSERVACIONES",
    "theFile",
];

pub const DEFAULT_QUERY_EDITABLE: [&str; 12] = [
    "SERVICIO",
    "PROPUESTA",
    "SRM",
    "DESCUENTO",
    "ESTATUS",
    "FECHACAP",
    "OBSERVACIONES",
    "CODIGOCLIENTE",
    "RANGOKG",
    "CODIGOF",
    "CATEGORIA",
    "theFile",
];

pub fn default_policy() -> FieldPolicy {
    FieldPolicy::new(DEFAULT_ID_FIELD, DEFAULT_INSERT_EDITABLE, DEFAULT_QUERY_EDITABLE)
}

pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Date as the value of a date control.
pub fn date_value(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

fn choices(values: &[&str]) -> Vec<SelectOption> {
    values.iter().map(|value| SelectOption::plain(*value)).collect()
}

/// Prospect sheet layout; date controls default to `today`.
pub fn default_form(today: Date) -> Form {
    let today = date_value(today);
    Form::new(vec![
        FormField::new("FECHA", FieldKind::Date)
            .with_label("date")
            .with_default(today.clone()),
        FormField::select(
            "REGION",
            choices(&["CENTRAL", "OCCIDENTE", "ORIENTE", "ANDES", "CAPITAL"]),
        )
        .with_label("region"),
        FormField::text("EJECUTIVO").with_label("account executive"),
        FormField::text("RIF").with_label("tax id"),
        FormField::text("RAZON_SOCIAL").with_label("company name"),
        FormField::select(
            "SERVICIO",
            choices(&["NACIONAL", "INTERNACIONAL", "COURIER", "CARGA"]),
        )
        .with_label("service"),
        FormField::text("PROPUESTA").with_label("proposal"),
        FormField::text("SRM").with_label("srm"),
        FormField::new("DESCUENTO", FieldKind::Number).with_label("discount"),
        FormField::select(
            "ESTATUS",
            choices(&["PENDIENTE", "EN NEGOCIACION", "GANADO", "PERDIDO"]),
        )
        .with_label("status"),
        FormField::new("FECHACAP", FieldKind::Date)
            .with_label("capture date")
            .with_default(today),
        FormField::new("OBSERVACIONES", FieldKind::TextArea).with_label("notes"),
        FormField::text("CODIGOCLIENTE").with_label("customer code"),
        FormField::text("RANGOKG").with_label("weight range"),
        FormField::text("CODIGOF").with_label("billing code"),
        FormField::select("CATEGORIA", choices(&["PROSPECTO", "CLIENTE", "INACTIVO"]))
            .with_label("category"),
        FormField::new("theFile", FieldKind::File).with_label("attachment"),
    ])
}
