// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use prospect_app::{
    DEFAULT_ID_FIELD, DEFAULT_INSERT_EDITABLE, DEFAULT_QUERY_EDITABLE, FieldKind, FieldPolicy,
    Form, FormField, Mode, SelectOption, date_value, default_form, today,
};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::Date;

pub const APP_NAME: &str = "prospect";
const CONFIG_VERSION: i64 = 1;
const TODAY: &str = "today";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub service: Service,
    #[serde(default)]
    pub form: FormSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            service: Service::default(),
            form: FormSection::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Service {
    pub url: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormSection {
    pub default_mode: Option<String>,
    pub id_field: Option<String>,
    pub insert_editable: Option<Vec<String>>,
    pub query_editable: Option<Vec<String>>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// One `[[form.fields]]` entry. A non-empty list replaces the built-in layout.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: Option<String>,
    pub kind: Option<String>,
    pub default: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("PROSPECT_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set PROSPECT_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [service] and [form]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(url) = &self.service.url
            && url.trim().is_empty()
        {
            bail!(
                "service.url in {} is empty; set it to the record service endpoint",
                path.display()
            );
        }

        if let Some(timeout) = &self.service.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "service.timeout in {} must be positive, got {}; remove it to wait indefinitely",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(mode) = &self.form.default_mode
            && Mode::parse(mode).is_none()
        {
            bail!(
                "form.default_mode in {} must be \"insert\" or \"query\", got {:?}",
                path.display(),
                mode
            );
        }

        for spec in &self.form.fields {
            if spec.name.trim().is_empty() {
                bail!("[[form.fields]] in {} has an empty name", path.display());
            }
            if let Some(kind) = &spec.kind
                && FieldKind::parse(kind).is_none()
            {
                bail!(
                    "field {} in {} has unknown kind {:?}; use text, textarea, date, number, select, file or hidden",
                    spec.name,
                    path.display(),
                    kind
                );
            }
        }

        let form = self.form(today())?;
        let policy = self.policy();
        if form.field(policy.id_field()).is_none() {
            bail!(
                "form.id_field {:?} in {} does not name a form field",
                policy.id_field(),
                path.display()
            );
        }
        for mode in Mode::ALL {
            if let Some(name) = policy
                .allow_list(mode)
                .iter()
                .find(|name| form.field(name).is_none())
            {
                bail!(
                    "form.{}_editable in {} lists {:?}, which is not a form field",
                    mode.as_str(),
                    path.display(),
                    name
                );
            }
        }

        Ok(())
    }

    pub fn service_url(&self) -> Result<&str> {
        self.service
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                anyhow!("service.url is not set; add it under [service] in the config file")
            })
    }

    /// `None` when no timeout is configured.
    pub fn service_timeout(&self) -> Result<Option<Duration>> {
        self.service
            .timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
    }

    pub fn default_mode(&self) -> Mode {
        self.form
            .default_mode
            .as_deref()
            .and_then(Mode::parse)
            .unwrap_or(Mode::Insert)
    }

    pub fn policy(&self) -> FieldPolicy {
        let id_field = self
            .form
            .id_field
            .clone()
            .unwrap_or_else(|| DEFAULT_ID_FIELD.to_owned());
        let insert = self
            .form
            .insert_editable
            .clone()
            .unwrap_or_else(|| DEFAULT_INSERT_EDITABLE.map(str::to_owned).to_vec());
        let query = self
            .form
            .query_editable
            .clone()
            .unwrap_or_else(|| DEFAULT_QUERY_EDITABLE.map(str::to_owned).to_vec());
        FieldPolicy::new(id_field, insert, query)
    }

    /// Configured layout, or the built-in one. A date default of `"today"`
    /// resolves to `today`.
    pub fn form(&self, today: Date) -> Result<Form> {
        if self.form.fields.is_empty() {
            return Ok(default_form(today));
        }

        self.form
            .fields
            .iter()
            .map(|spec| build_field(spec, today))
            .collect::<Result<Vec<_>>>()
            .map(Form::new)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# prospect config\n# Place this file at: {}\n\nversion = 1\n\n[service]\n# Endpoint of the record service (GET ?id=..., POST JSON)\nurl = \"https://script.google.com/macros/s/<deployment>/exec\"\n# Optional. Without it requests wait as long as the service takes.\n# timeout = \"30s\"\n\n[form]\ndefault_mode = \"insert\"\nid_field = \"{}\"\ninsert_editable = [{}]\nquery_editable = [{}]\n\n# Optional. Replaces the built-in field layout.\n# [[form.fields]]\n# name = \"FECHA\"\n# kind = \"date\"\n# default = \"today\"\n#\n# [[form.fields]]\n# name = \"ESTATUS\"\n# kind = \"select\"\n# options = [\"PENDIENTE\", \"GANADO\", \"PERDIDO\"]\n",
            path.display(),
            DEFAULT_ID_FIELD,
            quoted_list(&DEFAULT_INSERT_EDITABLE),
            quoted_list(&DEFAULT_QUERY_EDITABLE),
        )
    }
}

fn build_field(spec: &FieldSpec, today: Date) -> Result<FormField> {
    let kind = match spec.kind.as_deref() {
        Some(raw) => FieldKind::parse(raw)
            .ok_or_else(|| anyhow!("field {} has unknown kind {raw:?}", spec.name))?,
        None => FieldKind::Text,
    };

    let mut field = if kind == FieldKind::Select {
        FormField::select(
            spec.name.trim(),
            spec.options.iter().map(SelectOption::plain).collect(),
        )
    } else {
        FormField::new(spec.name.trim(), kind)
    };

    if let Some(label) = &spec.label {
        field = field.with_label(label);
    }
    match spec.default.as_deref() {
        Some(TODAY) if kind == FieldKind::Date => field = field.with_default(date_value(today)),
        Some(value) => field = field.with_default(value),
        None => {}
    }
    Ok(field)
}

fn quoted_list(names: &[&str]) -> String {
    names
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 30s)")
}
