//! JSON seed files for populating a records database.
//!
//! ```json
//! {
//!   "accounts": [
//!     {
//!       "record_id": "001ACME",
//!       "name": "Acme",
//!       "domain": "https://www.acme.com",
//!       "phone": "555-0100",
//!       "enrichment_requested": true,
//!       "contacts": [{ "name": "A Alpha", "email": "a@acme.com", "title": "CEO" }]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use rolodex_shared::{Account, Result, RolodexError};
use serde::Deserialize;

/// Top-level seed document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,
}

/// An account plus its existing contacts.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAccount {
    #[serde(flatten)]
    pub account: Account,
    #[serde(default = "default_requested")]
    pub enrichment_requested: bool,
    #[serde(default)]
    pub contacts: Vec<SeedContact>,
}

fn default_requested() -> bool {
    true
}

/// An existing contact. Office phone falls back to the account's.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedContact {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub office: Option<String>,
    #[serde(default)]
    pub direct: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub email: String,
}

impl SeedFile {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RolodexError::parse(format!("seed file: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RolodexError::io(path, e))?;
        Self::from_json(&content)
    }
}

/// Counts from an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub accounts: usize,
    pub contacts: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_documented_shape() {
        let seed = SeedFile::from_json(
            r#"{"accounts": [{
                "record_id": "001ACME",
                "name": "Acme",
                "domain": "https://www.acme.com",
                "contacts": [{"name": "A Alpha", "email": "a@acme.com"}]
            }]}"#,
        )
        .unwrap();
        assert_eq!(seed.accounts.len(), 1);
        let acct = &seed.accounts[0];
        assert_eq!(acct.account.record_id, "001ACME");
        assert!(acct.enrichment_requested);
        assert_eq!(acct.contacts[0].email, "a@acme.com");
        assert!(acct.contacts[0].office.is_none());
    }

    #[test]
    fn loads_demo_seed() {
        let seed = SeedFile::load(Path::new("../../../demos/seed.json")).expect("read demo seed");
        assert_eq!(seed.accounts.len(), 2);
        assert!(!seed.accounts[1].enrichment_requested);
        assert_eq!(seed.accounts[0].account.owner_id, "005OWNER");
    }

    #[test]
    fn rejects_missing_name() {
        let err = SeedFile::from_json(r#"{"accounts": [{"record_id": "001"}]}"#).unwrap_err();
        assert!(err.to_string().starts_with("parse error: seed file"));
    }
}
