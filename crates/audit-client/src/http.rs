//! HTTP transport and read client for the audit API.

use crate::client::ClientError;
use crate::transport::{AuditTransport, OutboundMessage, TransportError};
use audit_types::{ArgumentError, AuditPage};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;

/// Route for plain event ingest, relative to `{base}/api/`.
pub const AUDIT_ROUTE: &str = "audit";
/// Route for encrypted envelope ingest.
pub const ENVELOPE_ROUTE: &str = "audit/envelope";
/// Request header carrying the continuation token on page reads.
pub const CONTINUATION_HEADER: &str = "ContinuationToken";

fn service_base_from_env() -> String {
    std::env::var("AUDIT_SERVICE_BASE").unwrap_or_else(|_| "http://localhost:8002".to_string())
}

async fn read_success(res: reqwest::Response) -> Result<String, TransportError> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| TransportError::Request(e.to_string()))?;
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Transport that POSTs events to the audit API.
pub struct HttpTransport {
    client: reqwest::Client,
    service_base: String,
}

impl HttpTransport {
    pub fn new(service_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            service_base: service_base.into(),
        }
    }

    /// Service base from `AUDIT_SERVICE_BASE` (default `http://localhost:8002`).
    pub fn from_env() -> Self {
        Self::new(service_base_from_env())
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}/api/{}", self.service_base.trim_end_matches('/'), route)
    }
}

#[async_trait::async_trait]
impl AuditTransport for HttpTransport {
    async fn send(&self, message: OutboundMessage) -> Result<(), TransportError> {
        let req = match message {
            OutboundMessage::Plain(json) => self
                .client
                .post(self.endpoint(AUDIT_ROUTE))
                .header(CONTENT_TYPE, "application/json")
                .body(json),
            OutboundMessage::Encrypted(envelope) => self
                .client
                .post(self.endpoint(ENVELOPE_ROUTE))
                .json(&envelope),
        };
        let res = req
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        read_success(res).await?;
        Ok(())
    }
}

/// Reads paginated audit trails from the audit API.
pub struct AuditReadClient {
    client: reqwest::Client,
    service_base: String,
}

impl AuditReadClient {
    pub fn new(service_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            service_base: service_base.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(service_base_from_env())
    }

    fn page_url(
        &self,
        target_type: &str,
        target_id: &str,
        page_size: usize,
        search_term: Option<&str>,
    ) -> Result<Url, TransportError> {
        let size = page_size.to_string();
        let mut url = Url::parse(&self.service_base)
            .map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl(self.service_base.clone()))?
            .pop_if_empty()
            .extend(["api", "audit", target_type, target_id, size.as_str()]);
        if let Some(term) = search_term.filter(|t| !t.is_empty()) {
            url.query_pairs_mut().append_pair("searchTerm", term);
        }
        Ok(url)
    }

    /// Fetch one page, newest first. Pass the previous page's token to continue.
    pub async fn get_page(
        &self,
        target_type: &str,
        target_id: &str,
        page_size: usize,
        search_term: Option<&str>,
        continuation: Option<&str>,
    ) -> Result<AuditPage, ClientError> {
        if target_type.trim().is_empty() {
            return Err(ArgumentError::Empty("target_type").into());
        }
        if target_id.trim().is_empty() {
            return Err(ArgumentError::Empty("target_id").into());
        }
        if page_size == 0 {
            return Err(ArgumentError::NotPositive("page_size").into());
        }

        let url = self.page_url(target_type, target_id, page_size, search_term)?;
        let mut req = self.client.get(url);
        if let Some(token) = continuation.filter(|t| !t.is_empty()) {
            req = req.header(CONTINUATION_HEADER, token);
        }
        let res = req
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let body = read_success(res).await?;
        let page = serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(page)
    }
}
