//! Prospect store. The only place import code touches the `prospects` table.
//!
//! `AppState` holds an `Arc<dyn ProspectStore>`; tests swap in an in-memory store.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::prospect::ProspectRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Domain/email pair of an already-persisted prospect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExistingContact {
    pub company_domain: Option<String>,
    pub contact_email: Option<String>,
}

#[async_trait]
pub trait ProspectStore: Send + Sync {
    /// Returns every persisted prospect whose lowercased domain is in `domains`
    /// or whose lowercased email is in `emails`, in a single round trip.
    async fn find_existing(
        &self,
        domains: &[String],
        emails: &[String],
    ) -> Result<Vec<ExistingContact>, StoreError>;

    /// Inserts all records or none of them. Returns the number of rows written.
    async fn insert_batch(&self, records: &[ProspectRecord]) -> Result<u64, StoreError>;
}

/// Columns bound per row by `insert_batch`.
pub const INSERT_BINDS_PER_ROW: usize = 15;

/// Largest batch that stays under Postgres's 65535 bind-parameter limit.
pub const MAX_INSERT_BATCH: usize = u16::MAX as usize / INSERT_BINDS_PER_ROW;

/// Timeout and retry policy for store calls.
#[derive(Debug, Clone, Copy)]
pub struct StoreSettings {
    pub timeout: Duration,
    /// Attempts for idempotent lookups. Inserts are attempted once.
    pub max_retries: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_retries: 3,
        }
    }
}

pub struct PgProspectStore {
    pool: PgPool,
    settings: StoreSettings,
}

impl PgProspectStore {
    pub fn new(pool: PgPool, settings: StoreSettings) -> Self {
        Self { pool, settings }
    }
}

#[async_trait]
impl ProspectStore for PgProspectStore {
    async fn find_existing(
        &self,
        domains: &[String],
        emails: &[String],
    ) -> Result<Vec<ExistingContact>, StoreError> {
        with_retry(self.settings, "find_existing", move || async move {
            let rows = sqlx::query_as::<_, ExistingContact>(
                r#"
                SELECT company_domain, contact_email
                FROM prospects
                WHERE lower(company_domain) = ANY($1)
                   OR lower(contact_email) = ANY($2)
                "#,
            )
            .bind(domains)
            .bind(emails)
            .fetch_all(&self.pool)
            .await?;
            Ok::<_, StoreError>(rows)
        })
        .await
    }

    async fn insert_batch(&self, records: &[ProspectRecord]) -> Result<u64, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        with_timeout(self.settings.timeout, async {
            let mut tx = self.pool.begin().await?;

            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO prospects (prospect_type, company_name, company_domain, \
                 company_industry, company_size, company_location, contact_name, \
                 contact_email, contact_phone, contact_title, contact_linkedin, \
                 notes, tags, status, created_by) ",
            );
            builder.push_values(records, |mut b, record| {
                let company = record.company();
                let contact = record.contact();
                let meta = record.meta();
                b.push_bind(record.prospect_type().as_str())
                    .push_bind(record.company_name().map(String::from))
                    .push_bind(company.company_domain.clone())
                    .push_bind(company.company_industry.clone())
                    .push_bind(company.company_size.clone())
                    .push_bind(company.company_location.clone())
                    .push_bind(record.contact_name().map(String::from))
                    .push_bind(contact.contact_email.clone())
                    .push_bind(contact.contact_phone.clone())
                    .push_bind(contact.contact_title.clone())
                    .push_bind(contact.contact_linkedin.clone())
                    .push_bind(meta.notes.clone())
                    .push_bind(meta.tags.clone())
                    .push_bind(meta.status.as_str())
                    .push_bind(meta.created_by);
            });

            let result = builder.build().execute(&mut *tx).await?;
            tx.commit().await?;

            debug!("Inserted {} prospects", result.rows_affected());
            Ok::<_, StoreError>(result.rows_affected())
        })
        .await
    }
}

async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}

/// Runs an idempotent store call with a timeout per attempt.
/// Retries with exponential backoff: 200ms, 400ms, 800ms...
async fn with_retry<T, F, Fut>(
    settings: StoreSettings,
    operation: &str,
    mut call: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let attempts = settings.max_retries.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match with_timeout(settings.timeout, call()).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                let delay = Duration::from_millis(200 * (1 << (attempt - 1)));
                warn!(
                    "{operation} attempt {attempt} failed: {e}; retrying after {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
pub mod memory {
    //! In-memory store for pipeline tests.

    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryStore {
        pub existing: Vec<ExistingContact>,
        /// 1-based batch ordinals that fail on insert.
        pub failing_batches: HashSet<usize>,
        pub fail_lookup: bool,
        /// Simulated round-trip time for `find_existing`.
        pub lookup_delay: Option<Duration>,
        pub lookups: Mutex<Vec<(Vec<String>, Vec<String>)>>,
        pub batches: Mutex<Vec<Vec<ProspectRecord>>>,
    }

    impl MemoryStore {
        pub fn with_existing(existing: Vec<ExistingContact>) -> Self {
            Self {
                existing,
                ..Default::default()
            }
        }

        pub fn batch_sizes(&self) -> Vec<usize> {
            self.batches.lock().unwrap().iter().map(Vec::len).collect()
        }

        pub fn lookup_count(&self) -> usize {
            self.lookups.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ProspectStore for MemoryStore {
        async fn find_existing(
            &self,
            domains: &[String],
            emails: &[String],
        ) -> Result<Vec<ExistingContact>, StoreError> {
            self.lookups
                .lock()
                .unwrap()
                .push((domains.to_vec(), emails.to_vec()));
            if let Some(delay) = self.lookup_delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_lookup {
                return Err(StoreError::Timeout(Duration::from_secs(15)));
            }

            Ok(self
                .existing
                .iter()
                .filter(|c| {
                    let domain = c.company_domain.as_deref().map(str::to_lowercase);
                    let email = c.contact_email.as_deref().map(str::to_lowercase);
                    domain.is_some_and(|d| domains.contains(&d))
                        || email.is_some_and(|e| emails.contains(&e))
                })
                .cloned()
                .collect())
        }

        async fn insert_batch(&self, records: &[ProspectRecord]) -> Result<u64, StoreError> {
            let mut batches = self.batches.lock().unwrap();
            batches.push(records.to_vec());
            if self.failing_batches.contains(&batches.len()) {
                return Err(StoreError::Database(sqlx::Error::Protocol(
                    "duplicate key value violates unique constraint".to_string(),
                )));
            }
            Ok(records.len() as u64)
        }
    }
}
