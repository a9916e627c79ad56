use std::collections::BTreeMap;

use uuid::Uuid;

use crate::import::csv_parser::CsvRow;
use crate::import::mapper::FieldMapping;
use crate::import::registry::ProspectField;
use crate::models::prospect::{
    CompanyProfile, CompanyProspect, ContactChannels, PersonProspect, ProspectMeta,
    ProspectRecord, ProspectStatus,
};

/// Builds one prospect per row. Output index `i` always corresponds to row `i`.
pub fn transform(rows: &[CsvRow], mapping: &FieldMapping, actor_id: Uuid) -> Vec<ProspectRecord> {
    rows.iter()
        .map(|row| transform_row(row, mapping, actor_id))
        .collect()
}

fn transform_row(row: &CsvRow, mapping: &FieldMapping, actor_id: Uuid) -> ProspectRecord {
    let mut values: BTreeMap<ProspectField, String> = BTreeMap::new();
    let mut tags = Vec::new();

    for (field, header) in mapping.iter() {
        let Some(cell) = row.get(header).map(|c| c.trim()).filter(|c| !c.is_empty()) else {
            continue;
        };

        if field == ProspectField::Tags {
            tags = split_tags(cell);
        } else {
            values.insert(field, cell.to_string());
        }
    }

    let mut take = |field: ProspectField| values.remove(&field);

    let company_name = take(ProspectField::CompanyName);
    let contact_name = take(ProspectField::ContactName);
    let company = CompanyProfile {
        company_domain: take(ProspectField::CompanyDomain),
        company_industry: take(ProspectField::CompanyIndustry),
        company_size: take(ProspectField::CompanySize),
        company_location: take(ProspectField::CompanyLocation),
    };
    let contact = ContactChannels {
        contact_email: take(ProspectField::ContactEmail),
        contact_phone: take(ProspectField::ContactPhone),
        contact_title: take(ProspectField::ContactTitle),
        contact_linkedin: take(ProspectField::ContactLinkedin),
    };
    let meta = ProspectMeta {
        created_by: actor_id,
        status: ProspectStatus::New,
        tags,
        notes: take(ProspectField::Notes),
    };

    match (company_name, contact_name) {
        (None, Some(contact_name)) => ProspectRecord::Person(PersonProspect {
            contact_name,
            company,
            contact,
            meta,
        }),
        (company_name, contact_name) => ProspectRecord::Company(CompanyProspect {
            company_name,
            contact_name,
            company,
            contact,
            meta,
        }),
    }
}

/// Splits a tags cell on commas, trimming and dropping empty pieces.
pub fn split_tags(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
