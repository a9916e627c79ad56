use serde::{Deserialize, Serialize};

use crate::import::mapper::FieldMapping;

/// Prospect attributes a CSV column can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProspectField {
    CompanyName,
    CompanyDomain,
    CompanyIndustry,
    CompanySize,
    CompanyLocation,
    ContactName,
    ContactEmail,
    ContactPhone,
    ContactTitle,
    ContactLinkedin,
    Notes,
    Tags,
}

impl ProspectField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProspectField::CompanyName => "company_name",
            ProspectField::CompanyDomain => "company_domain",
            ProspectField::CompanyIndustry => "company_industry",
            ProspectField::CompanySize => "company_size",
            ProspectField::CompanyLocation => "company_location",
            ProspectField::ContactName => "contact_name",
            ProspectField::ContactEmail => "contact_email",
            ProspectField::ContactPhone => "contact_phone",
            ProspectField::ContactTitle => "contact_title",
            ProspectField::ContactLinkedin => "contact_linkedin",
            ProspectField::Notes => "notes",
            ProspectField::Tags => "tags",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub field: ProspectField,
    pub label: String,
    pub required: bool,
}

impl FieldDescriptor {
    fn optional(field: ProspectField, label: &str) -> Self {
        Self {
            field,
            label: label.to_string(),
            required: false,
        }
    }
}

/// Ordered list of importable fields.
///
/// Carried in `AppState` and passed to the mapper explicitly so alternate
/// registries can be used without touching the import code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRegistry {
    pub fields: Vec<FieldDescriptor>,
}

impl FieldRegistry {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// The prospect import registry. Every field is optional.
    pub fn prospects() -> Self {
        use ProspectField::*;

        Self::new(vec![
            FieldDescriptor::optional(CompanyName, "Company Name"),
            FieldDescriptor::optional(CompanyDomain, "Company Domain"),
            FieldDescriptor::optional(CompanyIndustry, "Industry"),
            FieldDescriptor::optional(CompanySize, "Company Size"),
            FieldDescriptor::optional(CompanyLocation, "Location"),
            FieldDescriptor::optional(ContactName, "Contact Name"),
            FieldDescriptor::optional(ContactEmail, "Contact Email"),
            FieldDescriptor::optional(ContactPhone, "Contact Phone"),
            FieldDescriptor::optional(ContactTitle, "Job Title"),
            FieldDescriptor::optional(ContactLinkedin, "LinkedIn URL"),
            FieldDescriptor::optional(Notes, "Notes"),
            FieldDescriptor::optional(Tags, "Tags"),
        ])
    }

    pub fn contains(&self, field: ProspectField) -> bool {
        self.fields.iter().any(|d| d.field == field)
    }

    /// Required fields the mapping leaves unmapped.
    pub fn missing_required(&self, mapping: &FieldMapping) -> Vec<&FieldDescriptor> {
        self.fields
            .iter()
            .filter(|d| d.required && mapping.source_for(d.field).is_none())
            .collect()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::prospects()
    }
}
