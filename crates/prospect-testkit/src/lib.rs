// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use prospect_app::{
    FieldKind, FieldPolicy, Form, FormField, InsertRequest, Record, RecordService, ServiceReply,
    SessionStore, UpdateRequest,
};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use time::{Date, Month};

const REGIONS: [&str; 5] = ["CENTRAL", "OCCIDENTE", "ORIENTE", "ANDES", "CAPITAL"];
const SERVICES: [&str; 4] = ["NACIONAL", "INTERNACIONAL", "COURIER", "CARGA"];
const STATUSES: [&str; 4] = ["PENDIENTE", "EN NEGOCIACION", "GANADO", "PERDIDO"];
const CATEGORIES: [&str; 3] = ["PROSPECTO", "CLIENTE", "INACTIVO"];

const COMPANY_WORDS: [&str; 12] = [
    "Andina", "Caribe", "Llanos", "Orinoco", "Avila", "Roraima", "Cumana", "Merida", "Falcon",
    "Lara", "Sucre", "Bolivar",
];
const COMPANY_SUFFIXES: [&str; 5] = ["C.A.", "S.A.", "Logistica", "Import", "Group"];

const FIRST_NAMES: [&str; 12] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Rowan",
];
const LAST_NAMES: [&str; 12] = [
    "Walker", "Martin", "Hill", "Lopez", "Gray", "Diaz", "Reed", "Flores", "Bennett", "Price",
    "Foster", "Brooks",
];

const NOTES: [&str; 6] = [
    "Call back next week",
    "Waiting on signed proposal",
    "Asked for volume pricing",
    "Prefers email contact",
    "Competitor quote pending",
    "",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of prospect records shaped like the service's rows.
#[derive(Debug, Clone)]
pub struct ProspectFaker {
    rng: DeterministicRng,
}

impl ProspectFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn rif(&mut self) -> String {
        let prefix = self.pick(&["J", "G", "V"]);
        format!("{prefix}-{:08}-{}", self.int_range(0, 99_999_999), self.int_n(10))
    }

    pub fn company_name(&mut self) -> String {
        let word = self.pick(&COMPANY_WORDS);
        let suffix = self.pick(&COMPANY_SUFFIXES);
        format!("{word} {suffix}")
    }

    pub fn executive(&mut self) -> String {
        format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES))
    }

    /// A record whose keys mix upper and lower case, with some numeric and
    /// some off-list select values.
    pub fn record(&mut self) -> Record {
        let month = Month::try_from(self.int_range(1, 12) as u8).unwrap_or(Month::January);
        let day = self.int_range(1, 28) as u8;
        let date = Date::from_calendar_date(2026, month, day)
            .map(prospect_app::date_value)
            .unwrap_or_default();

        let status = if self.rng.bool() {
            self.pick(&STATUSES).to_owned()
        } else {
            format!("SEGUIMIENTO {}", self.int_range(1, 9))
        };

        let mut record = Record::new();
        record.insert("RIF".to_owned(), json!(self.rif()));
        record.insert("razon_social".to_owned(), json!(self.company_name()));
        record.insert("EJECUTIVO".to_owned(), json!(self.executive()));
        record.insert("REGION".to_owned(), json!(self.pick(&REGIONS)));
        record.insert("servicio".to_owned(), json!(self.pick(&SERVICES)));
        record.insert("PROPUESTA".to_owned(), json!(format!("P-{}", self.int_range(100, 999))));
        record.insert("DESCUENTO".to_owned(), json!(self.int_range(0, 40)));
        record.insert("ESTATUS".to_owned(), json!(status));
        record.insert("FECHA".to_owned(), json!(date));
        record.insert("CATEGORIA".to_owned(), json!(self.pick(&CATEGORIES)));
        record.insert("OBSERVACIONES".to_owned(), json!(self.pick(&NOTES)));
        record.insert("ROW_NUMBER".to_owned(), json!(self.int_range(2, 500)));
        record
    }

    fn int_range(&mut self, min: usize, max: usize) -> usize {
        min + self.int_n(max - min + 1)
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.int_n(values.len())]
    }
}

pub fn fixture_date() -> Date {
    Date::from_calendar_date(2026, Month::February, 19).unwrap_or(Date::MIN)
}

/// The small form most scenarios use: identifier, two insert fields, a
/// pre-filled status and an attachment control.
pub fn small_form() -> Form {
    Form::new(vec![
        FormField::text("ID"),
        FormField::text("NAME"),
        FormField::new("AMOUNT", FieldKind::Number),
        FormField::text("NOTES"),
        FormField::text("STATUS").with_default("pending"),
        FormField::new("theFile", FieldKind::File),
    ])
}

pub fn small_policy() -> FieldPolicy {
    FieldPolicy::new("ID", ["NAME", "AMOUNT"], ["ID", "NOTES", "STATUS", "theFile"])
}

/// Writes `contents` to `name` inside a fresh temp dir.
pub fn temp_attachment(name: &str, contents: &[u8]) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join(name);
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok((dir, path))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    Lookup(String),
    Insert(InsertRequest),
    Update(UpdateRequest),
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<ServiceCall>,
    replies: VecDeque<Result<ServiceReply, String>>,
}

/// Records every call and answers from a script. Unscripted lookups are not
/// found; unscripted writes succeed.
#[derive(Debug, Clone, Default)]
pub struct FakeService {
    state: Arc<Mutex<FakeState>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, reply: ServiceReply) -> Self {
        self.push(Ok(reply));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(Err(message.to_owned()));
        self
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.state
            .lock()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }

    fn push(&self, reply: Result<ServiceReply, String>) {
        if let Ok(mut state) = self.state.lock() {
            state.replies.push_back(reply);
        }
    }

    fn answer(&self, call: ServiceCall) -> Result<ServiceReply> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("fake service state poisoned"))?;
        let fallback = match &call {
            ServiceCall::Lookup(_) => ServiceReply::not_found(),
            ServiceCall::Insert(_) | ServiceCall::Update(_) => ServiceReply {
                status: "success".to_owned(),
                message: None,
                record: None,
            },
        };
        state.calls.push(call);
        match state.replies.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => bail!("{message}"),
            None => Ok(fallback),
        }
    }
}

impl RecordService for FakeService {
    fn lookup(&self, id: &str) -> Result<ServiceReply> {
        self.answer(ServiceCall::Lookup(id.to_owned()))
    }

    fn insert(&self, request: &InsertRequest) -> Result<ServiceReply> {
        self.answer(ServiceCall::Insert(request.clone()))
    }

    fn update(&self, request: &UpdateRequest) -> Result<ServiceReply> {
        self.answer(ServiceCall::Update(request.clone()))
    }
}

/// Session storage that is always unavailable, like a browser with storage
/// disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSessionStore;

impl SessionStore for FailingSessionStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        bail!("session storage unavailable")
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
        bail!("session storage unavailable")
    }
}

/// Record from `(key, value)` pairs of JSON scalars.
pub fn record(pairs: &[(&str, Value)]) -> Record {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{FakeService, ProspectFaker, ServiceCall};
    use prospect_app::{RecordService, ServiceReply};

    #[test]
    fn faker_is_deterministic_per_seed() {
        let mut left = ProspectFaker::new(7);
        let mut right = ProspectFaker::new(7);
        for _ in 0..20 {
            assert_eq!(left.record(), right.record());
        }
        assert_ne!(ProspectFaker::new(7).record(), ProspectFaker::new(8).record());
    }

    #[test]
    fn faker_rif_has_expected_shape() {
        let mut faker = ProspectFaker::new(3);
        for _ in 0..50 {
            let rif = faker.rif();
            let parts = rif.split('-').collect::<Vec<_>>();
            assert_eq!(parts.len(), 3, "{rif}");
            assert_eq!(parts[1].len(), 8, "{rif}");
        }
    }

    #[test]
    fn fake_service_replays_script_then_falls_back() {
        let service = FakeService::new()
            .reply(ServiceReply::success("first"))
            .fail("boom");

        assert_eq!(
            service.lookup("A").expect("scripted reply").message(),
            Some("first")
        );
        let error = service.lookup("B").expect_err("scripted failure");
        assert_eq!(error.to_string(), "boom");
        assert!(service.lookup("C").expect("fallback").is_not_found());
        assert_eq!(
            service.calls(),
            vec![
                ServiceCall::Lookup("A".to_owned()),
                ServiceCall::Lookup("B".to_owned()),
                ServiceCall::Lookup("C".to_owned()),
            ]
        );
    }
}
