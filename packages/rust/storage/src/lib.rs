//! libSQL-backed reference system of record.
//!
//! The [`Storage`] struct wraps a local libSQL database holding accounts,
//! their contacts, enrichment flags and notes, and implements
//! [`SystemOfRecordClient`] on top of it.
//!
//! **Access rules:**
//! - `rolodex run` / `rolodex import`: read-write via [`Storage::open`]
//! - `rolodex accounts`: read-only via [`Storage::open_readonly`]

mod migrations;
pub mod seed;

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database, params};
use rolodex_shared::{
    Account, Contact, ContactPayload, ContactStatus, Result, RolodexError, SystemOfRecordClient,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub use seed::{ImportSummary, SeedAccount, SeedContact, SeedFile};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
    /// Serializes writers sharing the connection.
    write_lock: Mutex<()>,
}

/// An account row with its enrichment flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub account: Account,
    pub enrichment_requested: bool,
    pub enrichment_complete: bool,
    pub contact_count: usize,
}

impl AccountRecord {
    pub fn is_pending(&self) -> bool {
        self.enrichment_requested && !self.enrichment_complete
    }
}

fn storage_err(e: libsql::Error) -> RolodexError {
    RolodexError::Storage(e.to_string())
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RolodexError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
            write_lock: Mutex::new(()),
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RolodexError::Storage(format!(
                "database not found at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
            write_lock: Mutex::new(()),
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    RolodexError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(RolodexError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Seeding
    // -----------------------------------------------------------------------

    /// Insert or update an account. Existing enrichment state is reset to
    /// `requested` / not complete.
    pub async fn import_account(&self, account: &Account, requested: bool) -> Result<()> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO accounts (record_id, external_id, owner_id, name, domain, phone,
                                       enrichment_requested, enrichment_complete, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)
                 ON CONFLICT(record_id) DO UPDATE SET
                   external_id = excluded.external_id,
                   owner_id = excluded.owner_id,
                   name = excluded.name,
                   domain = excluded.domain,
                   phone = excluded.phone,
                   enrichment_requested = excluded.enrichment_requested,
                   enrichment_complete = 0,
                   updated_at = excluded.updated_at",
                params![
                    account.record_id.as_str(),
                    account.external_id.as_str(),
                    account.owner_id.as_str(),
                    account.name.as_str(),
                    account.domain.as_str(),
                    account.phone.as_str(),
                    i64::from(requested),
                    now.as_str(),
                ],
            )
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Insert a contact under `contact.account_ref`. Returns the new contact id.
    pub async fn import_contact(&self, contact: &Contact) -> Result<String> {
        self.check_writable()?;
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO contacts (id, account_id, name, title, office, direct, mobile, email, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    id.as_str(),
                    contact.account_ref.as_str(),
                    contact.name.as_str(),
                    contact.title.as_str(),
                    contact.office.as_str(),
                    contact.direct.as_str(),
                    contact.mobile.as_str(),
                    contact.email.as_str(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(storage_err)?;
        Ok(id)
    }

    /// Import every account and contact of a seed file.
    #[instrument(skip_all, fields(accounts = seed.accounts.len()))]
    pub async fn import_seed(&self, seed: &SeedFile) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        for entry in &seed.accounts {
            let account = &entry.account;
            self.import_account(account, entry.enrichment_requested)
                .await?;
            summary.accounts += 1;

            for seeded in &entry.contacts {
                let contact = Contact {
                    account_ref: account.record_id.clone(),
                    record_id: None,
                    name: seeded.name.clone(),
                    title: seeded.title.clone(),
                    office: seeded.office.clone().unwrap_or_else(|| account.phone.clone()),
                    direct: seeded.direct.clone(),
                    mobile: seeded.mobile.clone(),
                    email: seeded.email.clone(),
                    status: ContactStatus::Existing,
                };
                self.import_contact(&contact).await?;
                summary.contacts += 1;
            }
        }
        info!(accounts = summary.accounts, contacts = summary.contacts, "seed imported");
        Ok(summary)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// All accounts with their flags and contact counts, ordered by name.
    pub async fn list_accounts(&self) -> Result<Vec<AccountRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT a.record_id, a.external_id, a.owner_id, a.name, a.domain, a.phone,
                        a.enrichment_requested, a.enrichment_complete,
                        (SELECT COUNT(*) FROM contacts c WHERE c.account_id = a.record_id)
                 FROM accounts a ORDER BY a.name, a.record_id",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(AccountRecord {
                account: row_to_account(&row)?,
                enrichment_requested: row.get::<i64>(6).map_err(storage_err)? != 0,
                enrichment_complete: row.get::<i64>(7).map_err(storage_err)? != 0,
                contact_count: row.get::<i64>(8).map_err(storage_err)? as usize,
            });
        }
        Ok(results)
    }

    /// Notes written to an account, if any.
    pub async fn get_notes(&self, record_id: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT notes FROM accounts WHERE record_id = ?1",
                params![record_id],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(row.get::<Option<String>>(0).map_err(storage_err)?),
            None => Ok(None),
        }
    }

    /// Whether the account has been marked enrichment-complete.
    pub async fn is_complete(&self, record_id: &str) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                "SELECT enrichment_complete FROM accounts WHERE record_id = ?1",
                params![record_id],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(row.get::<i64>(0).map_err(storage_err)? != 0),
            None => Err(RolodexError::Storage(format!("unknown account {record_id}"))),
        }
    }
}

#[async_trait]
impl SystemOfRecordClient for Storage {
    async fn list_pending_accounts(&self) -> Result<Vec<Account>> {
        let mut rows = self
            .conn
            .query(
                "SELECT record_id, external_id, owner_id, name, domain, phone
                 FROM accounts
                 WHERE enrichment_requested = 1 AND enrichment_complete = 0
                 ORDER BY created_at, record_id",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_account(&row)?);
        }
        debug!(count = results.len(), "pending accounts listed");
        Ok(results)
    }

    async fn list_existing_contacts(&self, account: &Account) -> Result<Vec<Contact>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, account_id, name, title, office, direct, mobile, email
                 FROM contacts WHERE account_id = ?1 ORDER BY created_at, id",
                params![account.record_id.as_str()],
            )
            .await
            .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            results.push(row_to_contact(&row)?);
        }
        Ok(results)
    }

    #[instrument(skip_all, fields(account = %account.name, contacts = payloads.len()))]
    async fn write_contacts(&self, account: &Account, payloads: &[ContactPayload]) -> Result<()> {
        self.check_writable()?;
        let _guard = self.write_lock.lock().await;

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction().await.map_err(storage_err)?;
        for payload in payloads {
            let id = Uuid::now_v7().to_string();
            let name = format!("{} {}", payload.first_name, payload.last_name)
                .trim()
                .to_string();
            tx.execute(
                "INSERT INTO contacts (id, account_id, owner_id, name, title, office, direct, mobile, email, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    id.as_str(),
                    payload.account_id.as_str(),
                    payload.owner_id.as_str(),
                    name.as_str(),
                    payload.title.as_str(),
                    account.phone.as_str(),
                    payload.phone.as_str(),
                    payload.mobile_phone.as_str(),
                    payload.email.as_str(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(storage_err)?;
        }
        // Dropping an uncommitted transaction rolls it back.
        tx.commit().await.map_err(storage_err)?;
        Ok(())
    }

    async fn write_notes(&self, account: &Account, notes: &str) -> Result<()> {
        self.check_writable()?;
        let _guard = self.write_lock.lock().await;
        let now = Utc::now().to_rfc3339();
        let changed = self
            .conn
            .execute(
                "UPDATE accounts SET notes = ?1, updated_at = ?2 WHERE record_id = ?3",
                params![notes, now.as_str(), account.record_id.as_str()],
            )
            .await
            .map_err(storage_err)?;
        ensure_found(changed, account)
    }

    async fn mark_complete(&self, account: &Account) -> Result<()> {
        self.check_writable()?;
        let _guard = self.write_lock.lock().await;
        let now = Utc::now().to_rfc3339();
        let changed = self
            .conn
            .execute(
                "UPDATE accounts SET enrichment_complete = 1, enriched_at = ?1, updated_at = ?1
                 WHERE record_id = ?2",
                params![now.as_str(), account.record_id.as_str()],
            )
            .await
            .map_err(storage_err)?;
        ensure_found(changed, account)
    }
}

fn ensure_found(changed: u64, account: &Account) -> Result<()> {
    if changed == 0 {
        return Err(RolodexError::Storage(format!(
            "unknown account {}",
            account.record_id
        )));
    }
    Ok(())
}

/// Columns 0..=5: record_id, external_id, owner_id, name, domain, phone.
fn row_to_account(row: &libsql::Row) -> Result<Account> {
    Ok(Account {
        record_id: row.get::<String>(0).map_err(storage_err)?,
        external_id: row.get::<String>(1).map_err(storage_err)?,
        owner_id: row.get::<String>(2).map_err(storage_err)?,
        name: row.get::<String>(3).map_err(storage_err)?,
        domain: row.get::<String>(4).map_err(storage_err)?,
        phone: row.get::<String>(5).map_err(storage_err)?,
    })
}

fn row_to_contact(row: &libsql::Row) -> Result<Contact> {
    Ok(Contact {
        record_id: Some(row.get::<String>(0).map_err(storage_err)?),
        account_ref: row.get::<String>(1).map_err(storage_err)?,
        name: row.get::<String>(2).map_err(storage_err)?,
        title: row.get::<String>(3).map_err(storage_err)?,
        office: row.get::<String>(4).map_err(storage_err)?,
        direct: row.get::<String>(5).map_err(storage_err)?,
        mobile: row.get::<String>(6).map_err(storage_err)?,
        email: row.get::<String>(7).map_err(storage_err)?,
        status: ContactStatus::Existing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("rolodex_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    fn acme() -> Account {
        Account {
            record_id: "001ACME".into(),
            external_id: "9001".into(),
            owner_id: "005OWNER".into(),
            name: "Acme".into(),
            domain: "https://www.acme.com".into(),
            phone: "555-0100".into(),
        }
    }

    fn payload(first: &str, last: &str, email: &str) -> ContactPayload {
        ContactPayload {
            account_id: "001ACME".into(),
            owner_id: "005OWNER".into(),
            first_name: first.into(),
            last_name: last.into(),
            title: "Recruiter".into(),
            phone: "555-0111".into(),
            mobile_phone: String::new(),
            email: email.into(),
        }
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        assert_eq!(storage.get_schema_version().await, 2);
    }

    #[tokio::test]
    async fn idempotent_migration() {
        let tmp = std::env::temp_dir().join(format!("rolodex_test_{}.db", Uuid::now_v7()));
        let s1 = Storage::open(&tmp).await.expect("first open");
        drop(s1);
        let s2 = Storage::open(&tmp).await.expect("second open");
        assert_eq!(s2.get_schema_version().await, 2);
    }

    #[tokio::test]
    async fn pending_means_requested_and_not_complete() {
        let storage = test_storage().await;
        storage.import_account(&acme(), true).await.unwrap();
        let idle = Account {
            record_id: "002IDLE".into(),
            name: "Idle".into(),
            ..Default::default()
        };
        storage.import_account(&idle, false).await.unwrap();

        let pending = storage.list_pending_accounts().await.unwrap();
        assert_eq!(pending, vec![acme()]);

        storage.mark_complete(&acme()).await.unwrap();
        assert!(storage.list_pending_accounts().await.unwrap().is_empty());
        assert!(storage.is_complete("001ACME").await.unwrap());
        assert!(!storage.is_complete("002IDLE").await.unwrap());
    }

    #[tokio::test]
    async fn existing_contacts_round_trip() {
        let storage = test_storage().await;
        storage.import_account(&acme(), true).await.unwrap();
        let id = storage
            .import_contact(&Contact {
                account_ref: "001ACME".into(),
                name: "A Alpha".into(),
                title: "CEO".into(),
                office: "555-0100".into(),
                email: "a@acme.com".into(),
                status: ContactStatus::Existing,
                ..Default::default()
            })
            .await
            .unwrap();

        let contacts = storage.list_existing_contacts(&acme()).await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].record_id.as_deref(), Some(id.as_str()));
        assert_eq!(contacts[0].name, "A Alpha");
        assert_eq!(contacts[0].status, ContactStatus::Existing);
    }

    #[tokio::test]
    async fn write_back_sequence() {
        let storage = test_storage().await;
        storage.import_account(&acme(), true).await.unwrap();

        storage
            .write_contacts(
                &acme(),
                &[payload("C", "Gamma", "c@other.com"), payload("Dee", "", "dee@else.com")],
            )
            .await
            .unwrap();
        storage.write_notes(&acme(), "<b>Enrichment Summary</b>").await.unwrap();
        storage.mark_complete(&acme()).await.unwrap();

        let contacts = storage.list_existing_contacts(&acme()).await.unwrap();
        let names: Vec<_> = contacts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["C Gamma", "Dee"]);
        assert_eq!(contacts[0].office, "555-0100");
        assert_eq!(contacts[0].direct, "555-0111");
        assert_eq!(
            storage.get_notes("001ACME").await.unwrap().as_deref(),
            Some("<b>Enrichment Summary</b>")
        );

        let records = storage.list_accounts().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].contact_count, 2);
        assert!(!records[0].is_pending());
    }

    #[tokio::test]
    async fn notes_for_unknown_account_fail() {
        let storage = test_storage().await;
        let err = storage.write_notes(&acme(), "x").await.unwrap_err();
        assert!(err.to_string().contains("unknown account 001ACME"));
    }

    #[tokio::test]
    async fn reimport_resets_completion() {
        let storage = test_storage().await;
        storage.import_account(&acme(), true).await.unwrap();
        storage.mark_complete(&acme()).await.unwrap();
        storage.import_account(&acme(), true).await.unwrap();
        assert_eq!(storage.list_pending_accounts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn import_seed_file() {
        let storage = test_storage().await;
        let seed = SeedFile::from_json(
            r#"{"accounts": [
                {"record_id": "001ACME", "name": "Acme", "domain": "acme.com", "phone": "555-0100",
                 "contacts": [{"name": "A Alpha", "email": "a@acme.com"},
                              {"name": "Z Zed", "email": "z@acme.com", "office": "555-0999"}]},
                {"record_id": "002BETA", "name": "Beta", "enrichment_requested": false}
            ]}"#,
        )
        .unwrap();

        let summary = storage.import_seed(&seed).await.unwrap();
        assert_eq!(summary, ImportSummary { accounts: 2, contacts: 2 });

        let pending = storage.list_pending_accounts().await.unwrap();
        assert_eq!(pending.len(), 1);
        let contacts = storage.list_existing_contacts(&pending[0]).await.unwrap();
        assert_eq!(contacts[0].office, "555-0100");
        assert_eq!(contacts[1].office, "555-0999");
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("rolodex_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        rw.import_account(&acme(), true).await.unwrap();
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        assert_eq!(ro.list_accounts().await.unwrap().len(), 1);
        let result = ro.mark_complete(&acme()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
    }

    #[tokio::test]
    async fn readonly_requires_existing_file() {
        let tmp = std::env::temp_dir().join(format!("rolodex_missing_{}.db", Uuid::now_v7()));
        assert!(Storage::open_readonly(&tmp).await.is_err());
    }
}
