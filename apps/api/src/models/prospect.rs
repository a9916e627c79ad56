use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProspectStatus {
    #[default]
    New,
}

impl ProspectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProspectStatus::New => "new",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProspectType {
    Company,
    Person,
}

impl ProspectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProspectType::Company => "company",
            ProspectType::Person => "person",
        }
    }
}

/// Firmographic details, all optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company_domain: Option<String>,
    pub company_industry: Option<String>,
    pub company_size: Option<String>,
    pub company_location: Option<String>,
}

/// Ways to reach a contact, all optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactChannels {
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_title: Option<String>,
    pub contact_linkedin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProspectMeta {
    pub created_by: Uuid,
    pub status: ProspectStatus,
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProspect {
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    #[serde(flatten)]
    pub company: CompanyProfile,
    #[serde(flatten)]
    pub contact: ContactChannels,
    #[serde(flatten)]
    pub meta: ProspectMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonProspect {
    pub contact_name: String,
    #[serde(flatten)]
    pub company: CompanyProfile,
    #[serde(flatten)]
    pub contact: ContactChannels,
    #[serde(flatten)]
    pub meta: ProspectMeta,
}

/// A prospect ready to be inserted, discriminated by `prospect_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "prospect_type", rename_all = "snake_case")]
pub enum ProspectRecord {
    Company(CompanyProspect),
    Person(PersonProspect),
}

impl ProspectRecord {
    pub fn prospect_type(&self) -> ProspectType {
        match self {
            ProspectRecord::Company(_) => ProspectType::Company,
            ProspectRecord::Person(_) => ProspectType::Person,
        }
    }

    pub fn company_name(&self) -> Option<&str> {
        match self {
            ProspectRecord::Company(c) => c.company_name.as_deref(),
            ProspectRecord::Person(_) => None,
        }
    }

    pub fn contact_name(&self) -> Option<&str> {
        match self {
            ProspectRecord::Company(c) => c.contact_name.as_deref(),
            ProspectRecord::Person(p) => Some(&p.contact_name),
        }
    }

    pub fn company(&self) -> &CompanyProfile {
        match self {
            ProspectRecord::Company(c) => &c.company,
            ProspectRecord::Person(p) => &p.company,
        }
    }

    pub fn contact(&self) -> &ContactChannels {
        match self {
            ProspectRecord::Company(c) => &c.contact,
            ProspectRecord::Person(p) => &p.contact,
        }
    }

    pub fn meta(&self) -> &ProspectMeta {
        match self {
            ProspectRecord::Company(c) => &c.meta,
            ProspectRecord::Person(p) => &p.meta,
        }
    }

    /// Lowercased domain used for duplicate lookups.
    pub fn domain_key(&self) -> Option<String> {
        lookup_key(self.company().company_domain.as_deref())
    }

    /// Lowercased email used for duplicate lookups.
    pub fn email_key(&self) -> Option<String> {
        lookup_key(self.contact().contact_email.as_deref())
    }
}

fn lookup_key(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta() -> ProspectMeta {
        ProspectMeta {
            created_by: Uuid::nil(),
            status: ProspectStatus::New,
            tags: vec![],
            notes: None,
        }
    }

    #[test]
    fn test_person_serializes_with_type_tag() {
        let record = ProspectRecord::Person(PersonProspect {
            contact_name: "Jane Doe".to_string(),
            company: CompanyProfile::default(),
            contact: ContactChannels {
                contact_email: Some("jane@example.com".to_string()),
                ..Default::default()
            },
            meta: meta(),
        });

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["prospect_type"], json!("person"));
        assert_eq!(value["contact_name"], json!("Jane Doe"));
        assert_eq!(value["contact_email"], json!("jane@example.com"));
        assert_eq!(value["status"], json!("new"));
    }

    #[test]
    fn test_lookup_keys_are_lowercased_and_skip_blank() {
        let record = ProspectRecord::Company(CompanyProspect {
            company_name: Some("Acme".to_string()),
            contact_name: None,
            company: CompanyProfile {
                company_domain: Some(" ACME.com ".to_string()),
                ..Default::default()
            },
            contact: ContactChannels {
                contact_email: Some("  ".to_string()),
                ..Default::default()
            },
            meta: meta(),
        });

        assert_eq!(record.domain_key().as_deref(), Some("acme.com"));
        assert_eq!(record.email_key(), None);
        assert_eq!(record.prospect_type(), ProspectType::Company);
        assert_eq!(record.company_name(), Some("Acme"));
    }
}
