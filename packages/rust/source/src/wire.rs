//! Request and response bodies for the provider's search API.
//!
//! Responses wrap records in a `content` array. Person records are mapped to
//! candidate [`Contact`]s; the first company record becomes [`CompanyFacts`].

use rolodex_shared::{Account, CompanyFacts, Contact, ContactStatus, Result, RolodexError};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchRequest<'a> {
    pub company_criteria: CompanyCriteria<'a>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompanyCriteria<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_string: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub query_string_application: Vec<&'static str>,
    pub website_urls: Vec<&'a str>,
}

impl<'a> SearchRequest<'a> {
    /// Persons employed at the account's website.
    pub fn persons(account: &'a Account) -> Self {
        Self {
            company_criteria: CompanyCriteria {
                website_urls: vec![account.domain.as_str()],
                ..Default::default()
            },
        }
    }

    /// Company matched by name and website.
    pub fn company(account: &'a Account) -> Self {
        Self {
            company_criteria: CompanyCriteria {
                query_string: Some(account.name.as_str()),
                query_string_application: vec!["NAME"],
                website_urls: vec![account.domain.as_str()],
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse<T> {
    #[serde(default)]
    pub content: Vec<T>,
}

/// One person record. Every field may be missing or null.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PersonRecord {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub office_tel_number: Option<String>,
    #[serde(default)]
    pub mobile_tel_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl PersonRecord {
    /// Map into a candidate contact of `account`. The office phone is the account's.
    pub fn into_contact(self, account: &Account) -> Contact {
        Contact {
            account_ref: account.record_id.clone(),
            record_id: None,
            name: clean(self.full_name),
            title: clean(self.title),
            office: account.phone.clone(),
            direct: clean(self.office_tel_number),
            mobile: clean(self.mobile_tel_number),
            email: clean(self.email),
            status: ContactStatus::Candidate,
        }
    }
}

fn clean(value: Option<String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

pub(crate) fn parse_persons(body: &str, account: &Account) -> Result<Vec<Contact>> {
    let parsed: SearchResponse<PersonRecord> = serde_json::from_str(body)
        .map_err(|e| RolodexError::parse(format!("persons response for {}: {e}", account.name)))?;
    Ok(parsed
        .content
        .into_iter()
        .map(|record| record.into_contact(account))
        .collect())
}

pub(crate) fn parse_company(body: &str, account: &Account) -> Result<Option<CompanyFacts>> {
    let parsed: SearchResponse<CompanyFacts> = serde_json::from_str(body)
        .map_err(|e| RolodexError::parse(format!("companies response for {}: {e}", account.name)))?;
    Ok(parsed.content.into_iter().next())
}
