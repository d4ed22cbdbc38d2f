//! In-memory quote store.
//!
//! The store exclusively owns `Quote` and `Company` records. Every write runs
//! under a single table lock: validate, commit, then notify the registered
//! `CommitObserver` before the lock is released and before the caller sees
//! success. Observers therefore see commits in exactly the order they happened.
//!
//! Invariants:
//! - no quote is ever stored with a blank `name`;
//! - every quote's `company_id` references a registered company (companies are
//!   never removed);
//! - quote ids are assigned monotonically from 1 and never reused;
//! - failed writes neither mutate the table nor notify the observer.
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use log::{debug, info};
use quote_common::model::validate_name;
use quote_common::{
    Company, CompanyId, MessageKind, Quote, QuoteChanges, QuoteError, QuoteId, Result,
    ValidationError,
};

/// Receives every committed quote write.
///
/// Called with the table lock held, so implementations must not call back into
/// the store and should hand off anything slow.
pub trait CommitObserver: Send + Sync {
    /// `quote` is the committed snapshot (the last state, for deletes).
    fn on_commit(&self, kind: MessageKind, quote: &Quote);
}

#[derive(Default)]
struct Table {
    quotes: BTreeMap<QuoteId, Quote>,
    companies: BTreeMap<CompanyId, Company>,
    last_quote_id: u64,
    last_company_id: u64,
}

impl Table {
    fn ensure_company(&self, id: CompanyId) -> Result<()> {
        if self.companies.contains_key(&id) {
            Ok(())
        } else {
            Err(ValidationError::UnknownCompany(id).into())
        }
    }
}

/// Thread-safe quote table with commit notifications.
pub struct QuoteStore {
    table: Mutex<Table>,
    observer: Arc<dyn CommitObserver>,
}

impl QuoteStore {
    /// Creates an empty store that reports commits to `observer`.
    pub fn new(observer: Arc<dyn CommitObserver>) -> Self {
        Self {
            table: Mutex::new(Table::default()),
            observer,
        }
    }

    /// Registers a company and returns it with its assigned id.
    pub fn create_company(&self, name: &str) -> Result<Company> {
        let name = validate_name(name)?;
        let mut table = self.table.lock()?;
        table.last_company_id += 1;
        let company = Company {
            id: CompanyId(table.last_company_id),
            name,
        };
        table.companies.insert(company.id, company.clone());
        info!("Company {} registered: {}", company.id, company.name);
        Ok(company)
    }

    /// All registered companies, by id.
    pub fn companies(&self) -> Result<Vec<Company>> {
        let table = self.table.lock()?;
        Ok(table.companies.values().cloned().collect())
    }

    /// Validates and commits a new quote, then broadcasts `created`.
    pub fn create(&self, name: &str, company_id: CompanyId) -> Result<Quote> {
        let name = validate_name(name)?;
        let mut table = self.table.lock()?;
        table.ensure_company(company_id)?;

        table.last_quote_id += 1;
        let now = Utc::now();
        let quote = Quote {
            id: QuoteId(table.last_quote_id),
            name,
            company_id,
            created_at: now,
            updated_at: now,
        };
        table.quotes.insert(quote.id, quote.clone());
        info!("Quote {} created for company {}", quote.id, quote.company_id);

        self.observer.on_commit(MessageKind::Created, &quote);
        Ok(quote)
    }

    /// Applies `changes` to quote `id`, then broadcasts `updated`.
    ///
    /// The merged record is validated as a whole; on any error the stored
    /// quote is left untouched.
    pub fn update(&self, id: QuoteId, changes: &QuoteChanges) -> Result<Quote> {
        let name = changes.name.as_deref().map(validate_name).transpose()?;
        let mut table = self.table.lock()?;
        if !table.quotes.contains_key(&id) {
            return Err(QuoteError::NotFound(id));
        }
        if let Some(company_id) = changes.company_id {
            table.ensure_company(company_id)?;
        }

        let quote = table
            .quotes
            .get_mut(&id)
            .ok_or(QuoteError::NotFound(id))?;
        if let Some(name) = name {
            quote.name = name;
        }
        if let Some(company_id) = changes.company_id {
            quote.company_id = company_id;
        }
        quote.updated_at = Utc::now();
        let quote = quote.clone();
        info!("Quote {} updated", quote.id);

        self.observer.on_commit(MessageKind::Updated, &quote);
        Ok(quote)
    }

    /// Removes quote `id`, then broadcasts `deleted` with its last state.
    pub fn delete(&self, id: QuoteId) -> Result<()> {
        let mut table = self.table.lock()?;
        let quote = table.quotes.remove(&id).ok_or(QuoteError::NotFound(id))?;
        info!("Quote {} deleted", quote.id);

        self.observer.on_commit(MessageKind::Deleted, &quote);
        Ok(())
    }

    /// Looks up one quote.
    pub fn find(&self, id: QuoteId) -> Result<Option<Quote>> {
        let table = self.table.lock()?;
        Ok(table.quotes.get(&id).cloned())
    }

    /// All quotes, newest (highest id) first.
    pub fn list_ordered(&self) -> Result<Vec<Quote>> {
        let table = self.table.lock()?;
        let quotes: Vec<Quote> = table.quotes.values().rev().cloned().collect();
        debug!("Listing {} quotes", quotes.len());
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(MessageKind, QuoteId, String)>>,
    }

    impl CommitObserver for Recorder {
        fn on_commit(&self, kind: MessageKind, quote: &Quote) {
            self.seen
                .lock()
                .unwrap()
                .push((kind, quote.id, quote.name.clone()));
        }
    }

    fn store() -> (QuoteStore, Arc<Recorder>, CompanyId) {
        let recorder = Arc::new(Recorder::default());
        let store = QuoteStore::new(recorder.clone());
        let company = store.create_company("KPMG").unwrap();
        (store, recorder, company.id)
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let (store, _, company) = store();
        let first = store.create("A", company).unwrap();
        store.delete(first.id).unwrap();
        let second = store.create("B", company).unwrap();
        assert_eq!(first.id, QuoteId(1));
        assert_eq!(second.id, QuoteId(2));
    }

    #[test]
    fn unknown_company_is_rejected_without_notification() {
        let (store, recorder, _) = store();
        let err = store.create("A", CompanyId(99)).unwrap_err();
        assert!(matches!(
            err,
            QuoteError::Validation(ValidationError::UnknownCompany(CompanyId(99)))
        ));
        assert!(store.list_ordered().unwrap().is_empty());
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn failed_update_leaves_record_untouched() {
        let (store, recorder, company) = store();
        let quote = store.create("A", company).unwrap();

        let blank = QuoteChanges {
            name: Some("  ".to_string()),
            company_id: None,
        };
        assert!(matches!(
            store.update(quote.id, &blank),
            Err(QuoteError::Validation(ValidationError::BlankName))
        ));

        let bad_company = QuoteChanges {
            name: Some("B".to_string()),
            company_id: Some(CompanyId(42)),
        };
        assert!(store.update(quote.id, &bad_company).is_err());

        assert_eq!(store.find(quote.id).unwrap(), Some(quote));
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn update_can_move_quote_to_another_company() {
        let (store, _, company) = store();
        let other = store.create_company("Deloitte").unwrap();
        let quote = store.create("A", company).unwrap();
        let changes = QuoteChanges {
            name: None,
            company_id: Some(other.id),
        };
        let updated = store.update(quote.id, &changes).unwrap();
        assert_eq!(updated.company_id, other.id);
        assert_eq!(updated.name, "A");
        assert!(updated.updated_at >= quote.updated_at);
        assert_eq!(updated.created_at, quote.created_at);
    }

    #[test]
    fn missing_quotes_report_not_found() {
        let (store, recorder, _) = store();
        assert!(matches!(
            store.update(QuoteId(5), &QuoteChanges::default()),
            Err(QuoteError::NotFound(QuoteId(5)))
        ));
        assert!(matches!(
            store.delete(QuoteId(5)),
            Err(QuoteError::NotFound(QuoteId(5)))
        ));
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn observer_sees_commits_in_order() {
        let (store, recorder, company) = store();
        let a = store.create("A", company).unwrap();
        let b = store.create("B", company).unwrap();
        store
            .update(
                a.id,
                &QuoteChanges {
                    name: Some("A2".to_string()),
                    company_id: None,
                },
            )
            .unwrap();
        store.delete(b.id).unwrap();

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                (MessageKind::Created, a.id, "A".to_string()),
                (MessageKind::Created, b.id, "B".to_string()),
                (MessageKind::Updated, a.id, "A2".to_string()),
                (MessageKind::Deleted, b.id, "B".to_string()),
            ]
        );
    }

    #[test]
    fn blank_company_name_is_rejected() {
        let (store, _, _) = store();
        assert!(store.create_company("").is_err());
        assert_eq!(store.companies().unwrap().len(), 1);
    }
}
