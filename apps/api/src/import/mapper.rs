//! Column mapping: which CSV header feeds which prospect field.
//!
//! `auto_map` only proposes a mapping. Clients send back whatever mapping the
//! user settled on and it is validated against the parsed headers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::import::registry::{FieldRegistry, ProspectField};

/// Target field → source header. Unmapped fields are skipped on import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping(BTreeMap<ProspectField, String>);

impl FieldMapping {
    pub fn set(&mut self, field: ProspectField, header: impl Into<String>) {
        self.0.insert(field, header.into());
    }

    pub fn clear(&mut self, field: ProspectField) {
        self.0.remove(&field);
    }

    pub fn source_for(&self, field: ProspectField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn mapped_count(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProspectField, &str)> {
        self.0.iter().map(|(field, header)| (*field, header.as_str()))
    }

    /// Every mapped header must be one of the parsed headers.
    pub fn validate(&self, headers: &[String]) -> Result<(), AppError> {
        for (field, header) in self.iter() {
            if !headers.iter().any(|h| h == header) {
                return Err(AppError::Validation(format!(
                    "Field '{}' is mapped to unknown column '{}'",
                    field.as_str(),
                    header
                )));
            }
        }
        Ok(())
    }
}

/// Common header spellings, keyed by normalized header.
///
/// Applied in table order after the exact pass for the same header.
pub const SYNONYM_RULES: &[(&str, ProspectField)] = &[
    ("company", ProspectField::CompanyName),
    ("email", ProspectField::ContactEmail),
    ("name", ProspectField::ContactName),
    ("phone", ProspectField::ContactPhone),
    ("title", ProspectField::ContactTitle),
    ("linkedin", ProspectField::ContactLinkedin),
    ("domain", ProspectField::CompanyDomain),
    ("website", ProspectField::CompanyDomain),
    ("industry", ProspectField::CompanyIndustry),
    ("size", ProspectField::CompanySize),
    ("location", ProspectField::CompanyLocation),
];

/// Lowercases and drops every non-letter character.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Proposes a mapping for `headers` against `registry`.
///
/// Headers are visited left to right. For each header the exact pass
/// (identifier or label) runs first, then `SYNONYM_RULES` in order. A later
/// match for a field replaces an earlier one.
pub fn auto_map(headers: &[String], registry: &FieldRegistry) -> FieldMapping {
    let mut mapping = FieldMapping::default();

    for header in headers {
        let normalized = normalize(header);
        if normalized.is_empty() {
            continue;
        }

        for descriptor in &registry.fields {
            if normalized == normalize(descriptor.field.as_str())
                || normalized == normalize(&descriptor.label)
            {
                mapping.set(descriptor.field, header.clone());
            }
        }

        for (key, field) in SYNONYM_RULES {
            if normalized == *key && registry.contains(*field) {
                mapping.set(*field, header.clone());
            }
        }
    }

    mapping
}
