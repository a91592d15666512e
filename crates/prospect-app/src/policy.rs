// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::Mode;

pub const DEFAULT_ID_FIELD: &str = "RIF";

/// Which fields are editable per mode. Pure: applying it to a form lives in
/// the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPolicy {
    id_field: String,
    insert_editable: BTreeSet<String>,
    query_editable: BTreeSet<String>,
}

impl FieldPolicy {
    pub fn new<I, Q, S, T>(id_field: impl Into<String>, insert_editable: I, query_editable: Q) -> Self
    where
        I: IntoIterator<Item = S>,
        Q: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            id_field: id_field.into(),
            insert_editable: insert_editable.into_iter().map(Into::into).collect(),
            query_editable: query_editable.into_iter().map(Into::into).collect(),
        }
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn allow_list(&self, mode: Mode) -> &BTreeSet<String> {
        match mode {
            Mode::Insert => &self.insert_editable,
            Mode::Query => &self.query_editable,
        }
    }

    /// The identifier can never be edited in query mode, whatever the list says.
    pub fn is_enabled(&self, mode: Mode, name: &str) -> bool {
        if mode == Mode::Query && name == self.id_field {
            return false;
        }
        self.allow_list(mode).contains(name)
    }

    /// Enabled flag per name, in input order.
    pub fn enablement<'a, I>(&self, mode: Mode, names: I) -> Vec<bool>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .map(|name| self.is_enabled(mode, name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::FieldPolicy;
    use crate::Mode;

    fn policy() -> FieldPolicy {
        FieldPolicy::new("ID", ["ID", "NAME", "AMOUNT"], ["ID", "NOTES"])
    }

    #[test]
    fn insert_mode_enables_exactly_the_insert_list() {
        let flags = policy().enablement(Mode::Insert, ["ID", "NAME", "AMOUNT", "NOTES", "STATUS"]);
        assert_eq!(flags, vec![true, true, true, false, false]);
    }

    #[test]
    fn query_mode_forces_identifier_disabled() {
        let policy = policy();
        assert!(policy.allow_list(Mode::Query).contains("ID"));
        assert!(!policy.is_enabled(Mode::Query, "ID"));
        assert!(policy.is_enabled(Mode::Query, "NOTES"));
        assert!(!policy.is_enabled(Mode::Query, "NAME"));
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!(!policy().is_enabled(Mode::Insert, "name"));
    }

    #[test]
    fn enablement_is_deterministic_for_every_mode() {
        let policy = policy();
        let names = ["ID", "NAME", "AMOUNT", "NOTES"];
        for mode in Mode::ALL {
            assert_eq!(policy.enablement(mode, names), policy.enablement(mode, names));
            for (name, enabled) in names.iter().zip(policy.enablement(mode, names)) {
                let expected = policy.allow_list(mode).contains(*name)
                    && !(mode == Mode::Query && *name == "ID");
                assert_eq!(enabled, expected, "{name} in {}", mode.as_str());
            }
        }
    }
}
