use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use caixa_core::{EntryDraft, EntryFilter, LedgerEntry, RecognitionResult, Summary};

use crate::error::{service_message, ApiError, GENERIC_SERVICE_ERROR};
use crate::session::{Session, SessionStore, UserAccount};

/// Read side of the ledger service, as the query engine sees it.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, ApiError>;
    async fn daily_summary(&self, date: NaiveDate) -> Result<Summary, ApiError>;
}

/// Remote text-recognition service, as the digitization workflow sees it.
#[async_trait]
pub trait ReceiptScanner: Send + Sync {
    async fn scan_receipt(
        &self,
        base64_image: &str,
        language: &str,
    ) -> Result<RecognitionResult, ApiError>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserAccount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserAccount,
}

/// Thin authenticated wrapper over the cash-ledger service.
///
/// Every request attaches the stored bearer token when present; any 401
/// clears the session store before the error is returned, so subscribers
/// can redirect to authentication.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: SessionStore) -> Self {
        ApiClient {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Status triage shared by every call: 401 ends the session, every other
    /// failure becomes an [`ApiError::Service`] carrying the best message the
    /// body offers.
    async fn triage(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::info!("received 401, ending session");
            self.session.clear();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message =
                service_message(&body).unwrap_or_else(|| GENERIC_SERVICE_ERROR.to_string());
            return Err(ApiError::Service { status: status.as_u16(), message });
        }
        Ok(response)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.triage(self.authorize(request).send().await?).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!("undecodable response body: {e}");
            ApiError::Decode(e.to_string())
        })
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.triage(self.authorize(request).send().await?).await?;
        Ok(())
    }

    // ── Session endpoints ────────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = self
            .http
            .post(self.url("/login"))
            .json(&serde_json::json!({ "email": email, "password": password }));
        let login: LoginResponse = self.send(request).await?;
        self.session.set(Session {
            access_token: login.access_token.clone(),
            user: Some(login.user.clone()),
        });
        Ok(login)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse, ApiError> {
        let request = self.http.post(self.url("/register")).json(&serde_json::json!({
            "name": name,
            "email": email,
            "password": password,
        }));
        self.send(request).await
    }

    pub fn logout(&self) {
        self.session.clear();
    }

    // ── Ledger endpoints ─────────────────────────────────────────────────────

    pub async fn create_entry(&self, draft: &EntryDraft) -> Result<LedgerEntry, ApiError> {
        let request = self.http.post(self.url("/cash-entries")).json(draft);
        self.send(request).await
    }

    pub async fn delete_entry(&self, id: i64) -> Result<(), ApiError> {
        let request = self.http.delete(self.url(&format!("/cash-entries/{id}")));
        self.send_empty(request).await
    }
}

#[async_trait]
impl LedgerApi for ApiClient {
    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, ApiError> {
        let request = self
            .http
            .get(self.url("/cash-entries"))
            .query(&filter.query_pairs());
        self.send(request).await
    }

    async fn daily_summary(&self, date: NaiveDate) -> Result<Summary, ApiError> {
        let request = self
            .http
            .get(self.url("/cash-summary/daily"))
            .query(&[("date", date.to_string())]);
        self.send(request).await
    }
}

#[async_trait]
impl ReceiptScanner for ApiClient {
    async fn scan_receipt(
        &self,
        base64_image: &str,
        language: &str,
    ) -> Result<RecognitionResult, ApiError> {
        let request = self
            .http
            .post(self.url("/cash-entries/scan-receipt"))
            .json(&serde_json::json!({
                "base64Image": base64_image,
                "language": language,
            }));
        self.send(request).await
    }
}
