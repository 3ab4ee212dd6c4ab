//! Capability interfaces for the two external collaborators.
//!
//! The enrichment pipeline only talks to the outside world through these
//! traits. `rolodex-storage` and `rolodex-source` ship reference
//! implementations; tests use in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Account, CompanyFacts, Contact, ContactPayload};

/// Read/write access to the authoritative store of accounts and contacts.
#[async_trait]
pub trait SystemOfRecordClient: Send + Sync {
    /// Accounts flagged for enrichment and not yet complete.
    async fn list_pending_accounts(&self) -> Result<Vec<Account>>;

    /// Contacts already stored for `account` (status `existing`).
    async fn list_existing_contacts(&self, account: &Account) -> Result<Vec<Contact>>;

    /// Insert new contacts for `account` as one batch.
    async fn write_contacts(&self, account: &Account, payloads: &[ContactPayload]) -> Result<()>;

    /// Replace the account's notes text.
    async fn write_notes(&self, account: &Account, notes: &str) -> Result<()>;

    /// Clear the account from the pending set.
    async fn mark_complete(&self, account: &Account) -> Result<()>;
}

/// Read access to the third-party people/company data provider.
#[async_trait]
pub trait EnrichmentSourceClient: Send + Sync {
    /// Company facts for `account`, or `None` when the provider has no match.
    async fn find_company(&self, account: &Account) -> Result<Option<CompanyFacts>>;

    /// Candidate contacts for `account` (status `candidate`).
    async fn find_contacts(&self, account: &Account) -> Result<Vec<Contact>>;
}
