use std::collections::{BTreeSet, HashSet};

use tracing::{error, info};

use crate::errors::AppError;
use crate::import::store::ProspectStore;
use crate::models::prospect::ProspectRecord;

/// Indices into the transformed record list that already exist in the store.
pub type DuplicateSet = BTreeSet<usize>;

/// Flags records whose domain or email already exists, case-insensitively.
///
/// Issues at most one store lookup regardless of how many records there are.
/// The result is a snapshot; nothing re-checks it before insert. A lookup
/// failure is returned as `AppError::DuplicateCheck` rather than treated as
/// "no duplicates".
pub async fn check_duplicates(
    store: &dyn ProspectStore,
    records: &[ProspectRecord],
) -> Result<DuplicateSet, AppError> {
    let domains: Vec<String> = records.iter().filter_map(ProspectRecord::domain_key).collect();
    let emails: Vec<String> = records.iter().filter_map(ProspectRecord::email_key).collect();

    if domains.is_empty() && emails.is_empty() {
        return Ok(DuplicateSet::new());
    }

    let existing = store.find_existing(&domains, &emails).await.map_err(|e| {
        error!("Duplicate lookup failed: {e}");
        AppError::DuplicateCheck(e.to_string())
    })?;

    let existing_domains: HashSet<String> = existing
        .iter()
        .filter_map(|c| c.company_domain.as_deref())
        .map(str::to_lowercase)
        .collect();
    let existing_emails: HashSet<String> = existing
        .iter()
        .filter_map(|c| c.contact_email.as_deref())
        .map(str::to_lowercase)
        .collect();

    let duplicates: DuplicateSet = records
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            record
                .domain_key()
                .is_some_and(|d| existing_domains.contains(&d))
                || record
                    .email_key()
                    .is_some_and(|e| existing_emails.contains(&e))
        })
        .map(|(i, _)| i)
        .collect();

    info!(
        "Duplicate check: {} of {} records already exist",
        duplicates.len(),
        records.len()
    );
    Ok(duplicates)
}
