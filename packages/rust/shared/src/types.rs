//! Core record types for Rolodex: accounts, contacts, company facts, and
//! the flattened write-back payload.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RolodexError};

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// An organization in the system of record that has been flagged for enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Identity in the system of record.
    pub record_id: String,
    /// Identity in the enrichment source (may be empty).
    #[serde(default)]
    pub external_id: String,
    /// Assignee for newly created contacts (may be empty).
    #[serde(default)]
    pub owner_id: String,
    /// Display name.
    pub name: String,
    /// Website, either a URL or a bare hostname.
    #[serde(default)]
    pub domain: String,
    /// Main office phone, inherited by every contact of this account.
    #[serde(default)]
    pub phone: String,
}

// ---------------------------------------------------------------------------
// Contact
// ---------------------------------------------------------------------------

/// Where a contact came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    /// Already stored in the system of record.
    Existing,
    /// Supplied by the enrichment source, not yet persisted.
    #[default]
    Candidate,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::Candidate => "candidate",
        }
    }
}

/// A person record attached to an account.
///
/// Rating and priority are deliberately absent: they only exist on
/// [`ScoredContact`], which the scorer produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// The owning account's `record_id`.
    pub account_ref: String,
    /// Set for existing contacts, `None` for candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub title: String,
    /// Office line, copied from the account.
    #[serde(default)]
    pub office: String,
    #[serde(default)]
    pub direct: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: ContactStatus,
}

impl Contact {
    /// The part of the email after `@`, if any.
    pub fn email_domain(&self) -> Option<&str> {
        email_domain(&self.email)
    }
}

/// Extract the domain part of an email address.
pub fn email_domain(email: &str) -> Option<&str> {
    email
        .split_once('@')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
}

/// A contact after title/function classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredContact {
    pub contact: Contact,
    /// Index of the first matching title group (lower is better).
    pub rating: usize,
    /// Index of the first matching function token (lower is better).
    pub priority: usize,
}

impl ScoredContact {
    /// Combined ranking key.
    pub fn score(&self) -> usize {
        self.rating + self.priority
    }
}

// ---------------------------------------------------------------------------
// Company facts
// ---------------------------------------------------------------------------

/// Firmographic facts about an account as reported by the enrichment source.
///
/// Numeric fields are kept as raw JSON values because providers send them
/// either as numbers or preformatted strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFacts {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub num_employees: Option<serde_json::Value>,
    #[serde(default)]
    pub revenue: Option<serde_json::Value>,
    #[serde(default)]
    pub revenues: Option<serde_json::Value>,
    #[serde(default)]
    pub location: Option<CompanyLocation>,
}

impl CompanyFacts {
    /// Revenue under whichever key the provider used.
    pub fn revenue(&self) -> Option<&serde_json::Value> {
        self.revenue
            .as_ref()
            .filter(|v| !v.is_null())
            .or_else(|| self.revenues.as_ref().filter(|v| !v.is_null()))
    }
}

/// Headquarters location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state_province_region: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
}

// ---------------------------------------------------------------------------
// ContactPayload
// ---------------------------------------------------------------------------

/// Flattened contact record ready for bulk insert into the system of record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContactPayload {
    pub account_id: String,
    pub owner_id: String,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub phone: String,
    pub mobile_phone: String,
    pub email: String,
}

impl ContactPayload {
    /// Build the write-back payload for `contact` under `account`.
    ///
    /// The owner falls back to `default_owner` when the account has none.
    /// Fails with [`RolodexError::MalformedCandidate`] when the name is blank.
    pub fn from_contact(account: &Account, contact: &Contact, default_owner: &str) -> Result<Self> {
        let (first_name, last_name) = split_name(&contact.name).ok_or_else(|| {
            RolodexError::malformed(format!(
                "contact <{}> for account {} has no name",
                contact.email, account.name
            ))
        })?;

        let owner_id = if account.owner_id.is_empty() {
            default_owner.to_string()
        } else {
            account.owner_id.clone()
        };

        Ok(Self {
            account_id: account.record_id.clone(),
            owner_id,
            first_name,
            last_name,
            title: contact.title.clone(),
            phone: contact.direct.clone(),
            mobile_phone: contact.mobile.clone(),
            email: contact.email.clone(),
        })
    }
}

/// Split a full name into first token and the remainder.
pub fn split_name(name: &str) -> Option<(String, String)> {
    let mut parts = name.split_whitespace();
    let first = parts.next()?.to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    Some((first, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            record_id: "001A".into(),
            external_id: "9001".into(),
            owner_id: "005X".into(),
            name: "Acme".into(),
            domain: "https://www.acme.com".into(),
            phone: "555-0100".into(),
        }
    }

    fn candidate(name: &str) -> Contact {
        Contact {
            account_ref: "001A".into(),
            name: name.into(),
            title: "Director of Talent".into(),
            direct: "555-0101".into(),
            mobile: "555-0102".into(),
            email: "jane@other.com".into(),
            ..Default::default()
        }
    }

    #[test]
    fn email_domain_extraction() {
        assert_eq!(email_domain("jane@acme.com"), Some("acme.com"));
        assert_eq!(email_domain("jane"), None);
        assert_eq!(email_domain("jane@"), None);
        assert_eq!(email_domain(""), None);
    }

    #[test]
    fn split_name_variants() {
        assert_eq!(split_name("Jane Doe"), Some(("Jane".into(), "Doe".into())));
        assert_eq!(
            split_name("Mary Jane  Watson"),
            Some(("Mary".into(), "Jane Watson".into()))
        );
        assert_eq!(split_name("Cher"), Some(("Cher".into(), String::new())));
        assert_eq!(split_name("   "), None);
    }

    #[test]
    fn payload_from_contact() {
        let payload =
            ContactPayload::from_contact(&account(), &candidate("Jane Doe"), "005DEFAULT").unwrap();
        assert_eq!(payload.account_id, "001A");
        assert_eq!(payload.owner_id, "005X");
        assert_eq!(payload.first_name, "Jane");
        assert_eq!(payload.last_name, "Doe");
        assert_eq!(payload.phone, "555-0101");
        assert_eq!(payload.mobile_phone, "555-0102");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["FirstName"], "Jane");
        assert_eq!(json["MobilePhone"], "555-0102");
        assert_eq!(json["AccountId"], "001A");
    }

    #[test]
    fn payload_uses_default_owner() {
        let mut acct = account();
        acct.owner_id.clear();
        let payload =
            ContactPayload::from_contact(&acct, &candidate("Jane Doe"), "005DEFAULT").unwrap();
        assert_eq!(payload.owner_id, "005DEFAULT");
    }

    #[test]
    fn payload_rejects_blank_name() {
        let err = ContactPayload::from_contact(&account(), &candidate("  "), "").unwrap_err();
        assert!(matches!(err, RolodexError::MalformedCandidate { .. }));
    }

    #[test]
    fn company_facts_accepts_either_revenue_key() {
        let facts: CompanyFacts =
            serde_json::from_str(r#"{"revenues": 1200000, "numEmployees": 40}"#).unwrap();
        assert_eq!(facts.revenue(), Some(&serde_json::json!(1200000)));

        let facts: CompanyFacts = serde_json::from_str(
            r#"{"revenue": "$5M", "location": {"city": "Austin", "countryName": "United States"}}"#,
        )
        .unwrap();
        assert_eq!(facts.revenue(), Some(&serde_json::json!("$5M")));
        let location = facts.location.unwrap();
        assert_eq!(location.city.as_deref(), Some("Austin"));
        assert!(location.state_province_region.is_none());
    }

    #[test]
    fn contact_status_defaults_to_candidate() {
        let contact: Contact =
            serde_json::from_str(r#"{"account_ref": "001A", "name": "Jane Doe"}"#).unwrap();
        assert_eq!(contact.status, ContactStatus::Candidate);
        assert!(contact.record_id.is_none());
        assert_eq!(ContactStatus::Existing.as_str(), "existing");
    }
}
