//! HTTP client for the enrichment source's search API.
//!
//! [`SourceClient`] implements [`EnrichmentSourceClient`] over two endpoints:
//! `POST {base}/v1/search/companies` for company facts and
//! `POST {base}/v1/search/persons` for candidate contacts. Both authenticate
//! with a partner key and a session token sent as headers.

mod wire;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rolodex_shared::{
    Account, CompanyFacts, Contact, EnrichmentSourceClient, Result, RolodexError, SourceConfig,
    SourceCredentials,
};
use tracing::{debug, info, instrument, warn};
use url::Url;

use wire::SearchRequest;

/// User-Agent string for source requests.
const USER_AGENT: &str = concat!("Rolodex/", env!("CARGO_PKG_VERSION"));

const PARTNER_KEY_HEADER: &str = "X-PARTNER-KEY";
const AUTH_TOKEN_HEADER: &str = "X-AUTH-TOKEN";

/// Reference enrichment source backed by the provider's REST API.
#[derive(Debug, Clone)]
pub struct SourceClient {
    client: Client,
    base: String,
    credentials: SourceCredentials,
}

impl SourceClient {
    /// Build a client from config and already-resolved credentials.
    pub fn new(config: &SourceConfig, credentials: SourceCredentials) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            RolodexError::validation(format!("invalid source base_url {:?}: {e}", config.base_url))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RolodexError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base: base.as_str().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// POST a search body and return the response text on 2xx.
    async fn search(&self, path: &str, body: &SearchRequest<'_>) -> Result<String> {
        let url = self.endpoint(path);
        let response = self
            .client
            .post(&url)
            .header(PARTNER_KEY_HEADER, &self.credentials.partner_key)
            .header(AUTH_TOKEN_HEADER, &self.credentials.auth_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| RolodexError::SourceUnavailable(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RolodexError::SourceUnavailable(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| RolodexError::Network(format!("{url}: failed to read body: {e}")))
    }
}

#[async_trait]
impl EnrichmentSourceClient for SourceClient {
    #[instrument(skip_all, fields(account = %account.name))]
    async fn find_company(&self, account: &Account) -> Result<Option<CompanyFacts>> {
        let body = self
            .search("/v1/search/companies", &SearchRequest::company(account))
            .await?;
        let facts = wire::parse_company(&body, account)?;
        match &facts {
            Some(_) => info!("company info retrieved"),
            None => warn!("no company record matched"),
        }
        Ok(facts)
    }

    #[instrument(skip_all, fields(account = %account.name))]
    async fn find_contacts(&self, account: &Account) -> Result<Vec<Contact>> {
        let body = self
            .search("/v1/search/persons", &SearchRequest::persons(account))
            .await?;
        let contacts = wire::parse_persons(&body, account)?;
        debug!(count = contacts.len(), "candidate contacts retrieved");
        Ok(contacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> SourceCredentials {
        SourceCredentials {
            partner_key: "pk-test".into(),
            auth_token: "tok-test".into(),
        }
    }

    fn client_for(server: &MockServer) -> SourceClient {
        let config = SourceConfig {
            base_url: format!("{}/papi/", server.uri()),
            ..SourceConfig::default()
        };
        SourceClient::new(&config, credentials()).unwrap()
    }

    fn account() -> Account {
        Account {
            record_id: "001ACME".into(),
            name: "Acme".into(),
            domain: "acme.com".into(),
            phone: "555-0100".into(),
            ..Default::default()
        }
    }

    #[test]
    fn rejects_invalid_base_url() {
        let config = SourceConfig {
            base_url: "not a url".into(),
            ..SourceConfig::default()
        };
        let err = SourceClient::new(&config, credentials()).unwrap_err();
        assert!(err.to_string().contains("invalid source base_url"));
    }

    #[tokio::test]
    async fn find_contacts_sends_auth_and_maps_records() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/papi/v1/search/persons"))
            .and(header("X-PARTNER-KEY", "pk-test"))
            .and(header("X-AUTH-TOKEN", "tok-test"))
            .and(body_json(serde_json::json!({
                "companyCriteria": {"websiteUrls": ["acme.com"]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    {"fullName": "Jane Doe", "title": "VP People", "email": "jane@elsewhere.org"},
                    {"fullName": "John Roe", "title": "Analyst", "email": "john@elsewhere.org",
                     "mobileTelNumber": "555-0199"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let contacts = client_for(&server).find_contacts(&account()).await.unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].name, "Jane Doe");
        assert_eq!(contacts[1].mobile, "555-0199");
        assert!(contacts.iter().all(|c| c.office == "555-0100"));
    }

    #[tokio::test]
    async fn find_company_returns_first_record() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/papi/v1/search/companies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [{
                    "description": "Anvils and rockets",
                    "numEmployees": 250,
                    "revenues": "$10M-$50M",
                    "location": {"city": "Phoenix", "stateProvinceRegion": "AZ", "countryName": "USA"}
                }]
            })))
            .mount(&server)
            .await;

        let facts = client_for(&server)
            .find_company(&account())
            .await
            .unwrap()
            .expect("company facts");
        assert_eq!(facts.description.as_deref(), Some("Anvils and rockets"));
        assert_eq!(facts.revenue(), Some(&serde_json::json!("$10M-$50M")));
        assert_eq!(
            facts.location.and_then(|l| l.city).as_deref(),
            Some("Phoenix")
        );
    }

    #[tokio::test]
    async fn non_success_is_source_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.find_contacts(&account()).await.unwrap_err();
        assert!(matches!(err, RolodexError::SourceUnavailable(_)));
        assert!(err.to_string().contains("503"));

        let err = client.find_company(&account()).await.unwrap_err();
        assert!(matches!(err, RolodexError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn empty_company_search_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/papi/v1/search/companies"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"content": []}"#))
            .mount(&server)
            .await;

        let facts = client_for(&server).find_company(&account()).await.unwrap();
        assert!(facts.is_none());
    }
}
