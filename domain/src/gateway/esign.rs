//! E-signature REST API client.
//!
//! A thin pass-through: each operation is one authenticated request against the
//! account discovered during authorization. There is no caching and no retrying; a
//! failed call is returned to the caller unchanged apart from being classified.

use crate::envelope::{
    ConsoleViewRequest, Envelope, EnvelopeDefinition, EnvelopeDocumentsResult,
    EnvelopeRecipients, EnvelopeSummary, EnvelopesInformation, ListStatusChangesOptions,
    RecipientViewRequest, ReturnUrlRequest, ViewUrl,
};
use crate::error::{DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind};
use esign_auth::http::{ClientBuilder, HttpClientConfig};
use esign_auth::oauth::{token::AccessToken, AccountBinding};
use log::*;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

const API_VERSION: &str = "v2";

/// Client for the envelope endpoints of one account.
pub struct ApiGateway {
    client: reqwest::Client,
    binding: Option<AccountBinding>,
    access_token: Option<AccessToken>,
}

impl ApiGateway {
    /// Create an unconfigured gateway with the given HTTP settings.
    pub fn new(config: HttpClientConfig) -> Result<Self, Error> {
        let client = ClientBuilder::from_config(config).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            binding: None,
            access_token: None,
        }
    }

    /// Point the gateway at a discovered account, replacing any previous binding.
    pub fn configure(&mut self, binding: AccountBinding) {
        info!(
            "Configuring API gateway for account {} at {}",
            binding.account_id, binding.base_url
        );
        self.binding = Some(binding);
    }

    /// Use `token` for every subsequent request.
    pub fn authorize(&mut self, token: AccessToken) {
        self.access_token = Some(token);
    }

    pub fn binding(&self) -> Option<&AccountBinding> {
        self.binding.as_ref()
    }

    /// Create (and optionally send) an envelope.
    pub async fn create_envelope(
        &self,
        definition: &EnvelopeDefinition,
    ) -> Result<EnvelopeSummary, Error> {
        self.ready("create_envelope")?;
        let url = self.account_url("create_envelope", &["envelopes"])?;
        let request = self.client.post(url).json(definition);
        let summary: EnvelopeSummary = self.send_json("create_envelope", request).await?;
        info!("Created envelope {}", summary.envelope_id);
        Ok(summary)
    }

    /// Get envelope status and information.
    pub async fn get_envelope(&self, envelope_id: &str) -> Result<Envelope, Error> {
        self.ready("get_envelope")?;
        require("envelope_id", envelope_id)?;
        let url = self.account_url("get_envelope", &["envelopes", envelope_id])?;
        self.send_json("get_envelope", self.client.get(url)).await
    }

    pub async fn list_recipients(&self, envelope_id: &str) -> Result<EnvelopeRecipients, Error> {
        self.ready("list_recipients")?;
        require("envelope_id", envelope_id)?;
        let url = self.account_url("list_recipients", &["envelopes", envelope_id, "recipients"])?;
        self.send_json("list_recipients", self.client.get(url)).await
    }

    pub async fn list_documents(
        &self,
        envelope_id: &str,
    ) -> Result<EnvelopeDocumentsResult, Error> {
        self.ready("list_documents")?;
        require("envelope_id", envelope_id)?;
        let url = self.account_url("list_documents", &["envelopes", envelope_id, "documents"])?;
        self.send_json("list_documents", self.client.get(url)).await
    }

    /// Download one document's bytes.
    pub async fn get_document(&self, envelope_id: &str, document_id: &str) -> Result<Vec<u8>, Error> {
        self.ready("get_document")?;
        require("envelope_id", envelope_id)?;
        require("document_id", document_id)?;
        let url = self.account_url(
            "get_document",
            &["envelopes", envelope_id, "documents", document_id],
        )?;

        let response = self.send("get_document", self.client.get(url)).await?;
        let bytes = response.bytes().await.map_err(|e| {
            warn!("Failed to read document body: {e:?}");
            Error::from(e)
        })?;
        debug!("Downloaded document {} ({} bytes)", document_id, bytes.len());
        Ok(bytes.to_vec())
    }

    /// Embedded signing URL for a recipient created with a `client_user_id`.
    pub async fn create_recipient_view(
        &self,
        envelope_id: &str,
        request: &RecipientViewRequest,
    ) -> Result<ViewUrl, Error> {
        self.ready("create_recipient_view")?;
        require("envelope_id", envelope_id)?;
        let url = self.account_url(
            "create_recipient_view",
            &["envelopes", envelope_id, "views", "recipient"],
        )?;
        self.send_json("create_recipient_view", self.client.post(url).json(request))
            .await
    }

    /// Embedded sending ("tag and send") URL for a draft envelope.
    pub async fn create_sender_view(
        &self,
        envelope_id: &str,
        request: &ReturnUrlRequest,
    ) -> Result<ViewUrl, Error> {
        self.ready("create_sender_view")?;
        require("envelope_id", envelope_id)?;
        let url = self.account_url(
            "create_sender_view",
            &["envelopes", envelope_id, "views", "sender"],
        )?;
        self.send_json("create_sender_view", self.client.post(url).json(request))
            .await
    }

    /// Embedded console (web app) URL.
    pub async fn create_console_view(&self, request: &ConsoleViewRequest) -> Result<ViewUrl, Error> {
        self.ready("create_console_view")?;
        let url = self.account_url("create_console_view", &["views", "console"])?;
        self.send_json("create_console_view", self.client.post(url).json(request))
            .await
    }

    /// Envelopes whose status changed since `options.from_date`.
    pub async fn list_status_changes(
        &self,
        options: &ListStatusChangesOptions,
    ) -> Result<EnvelopesInformation, Error> {
        self.ready("list_status_changes")?;
        require("from_date", &options.from_date)?;
        let url = self.account_url("list_status_changes", &["envelopes"])?;
        self.send_json("list_status_changes", self.client.get(url).query(options))
            .await
    }

    /// A binding and a token must be in place before anything is validated or sent.
    fn ready(&self, operation: &str) -> Result<(), Error> {
        if self.binding.is_none() {
            warn!("{operation} called before the gateway was configured");
            return Err(Error::internal(
                InternalErrorKind::NotConfigured,
                &format!("{operation}: no account binding configured"),
            ));
        }
        if self.access_token.is_none() {
            warn!("{operation} called without an access token");
            return Err(Error::external(
                ExternalErrorKind::Unauthorized,
                &format!("{operation}: no access token"),
            ));
        }
        Ok(())
    }

    /// `{base_url}/v2/accounts/{account_id}/{segments...}` with each segment escaped.
    fn account_url(&self, operation: &str, segments: &[&str]) -> Result<String, Error> {
        let binding = self.binding.as_ref().ok_or_else(|| {
            Error::internal(
                InternalErrorKind::NotConfigured,
                &format!("{operation}: no account binding configured"),
            )
        })?;
        require("account_id", &binding.account_id)?;
        if binding.base_url.trim().is_empty() {
            return Err(Error::internal(
                InternalErrorKind::NotConfigured,
                &format!("{operation}: base URL is empty"),
            ));
        }

        let mut url = format!(
            "{}/{}/accounts/{}",
            binding.base_url.trim_end_matches('/'),
            API_VERSION,
            urlencoding::encode(&binding.account_id)
        );
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        Ok(url)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response, Error> {
        let token = self.access_token.as_ref().ok_or_else(|| {
            Error::external(
                ExternalErrorKind::Unauthorized,
                &format!("{operation}: no access token"),
            )
        })?;

        debug!("Sending {operation} request");

        let response = request
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to send {operation} request: {e:?}");
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        warn!("{operation} failed: {status} - {error_text}");
        let message = format!("{operation}: {status} - {error_text}");
        Err(if status == StatusCode::UNAUTHORIZED {
            Error::external(ExternalErrorKind::Unauthorized, &message)
        } else {
            Error::external(ExternalErrorKind::Transport(status.to_string()), &message)
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<T, Error> {
        let response = self.send(operation, request).await?;
        response.json().await.map_err(|e| {
            warn!("Failed to parse {operation} response: {e:?}");
            Error::external(
                ExternalErrorKind::Other(format!("Invalid {operation} response")),
                &format!("{operation}: {e}"),
            )
        })
    }
}

fn require(name: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::internal(
            InternalErrorKind::InvalidInput(format!("{name} must not be empty")),
            &format!("{name} must not be empty"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Document, EnvelopeStatus, SignHere, Signer};
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn binding(base_url: &str) -> AccountBinding {
        AccountBinding {
            account_id: "A1".to_string(),
            base_url: base_url.to_string(),
        }
    }

    fn gateway_for(base_url: &str) -> ApiGateway {
        let mut gateway = ApiGateway::new(HttpClientConfig::default()).unwrap();
        gateway.configure(binding(base_url));
        gateway.authorize(AccessToken::new("tok123"));
        gateway
    }

    #[tokio::test]
    async fn test_unconfigured_gateway_fails_before_sending() {
        let mut gateway = ApiGateway::new(HttpClientConfig::default()).unwrap();
        gateway.authorize(AccessToken::new("tok123"));

        let err = gateway.get_envelope("env-1").await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::NotConfigured)
        );
    }

    #[tokio::test]
    async fn test_binding_and_token_are_checked_before_ids() {
        let mut gateway = ApiGateway::new(HttpClientConfig::default()).unwrap();
        let err = gateway.get_envelope("").await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::NotConfigured)
        );

        gateway.configure(binding("https://demo.example"));
        let err = gateway.get_envelope("").await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Unauthorized)
        );
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/accounts/A1/envelopes/env-1")
            .expect(0)
            .create_async()
            .await;

        let mut gateway = ApiGateway::new(HttpClientConfig::default()).unwrap();
        gateway.configure(binding(&server.url()));

        let err = gateway.get_envelope("env-1").await.unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Unauthorized)
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_envelope_id_is_invalid_input() {
        let gateway = gateway_for("https://demo.example");
        let err = gateway.list_recipients("  ").await.unwrap_err();
        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_account_id_is_invalid_input() {
        let mut gateway = gateway_for("https://demo.example");
        gateway.configure(AccountBinding {
            account_id: String::new(),
            base_url: "https://demo.example".to_string(),
        });

        let err = gateway.get_envelope("env-1").await.unwrap_err();
        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Bind then drop a listener so the port is closed.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let mut gateway = ApiGateway::new(HttpClientConfig {
            timeout: std::time::Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap();
        gateway.configure(binding(&format!("http://127.0.0.1:{port}")));
        gateway.authorize(AccessToken::new("tok123"));

        let err = gateway.get_envelope("env-1").await.unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Network)
        );
        let source = err.source.as_ref().expect("send failure should be kept");
        assert!(source.downcast_ref::<reqwest::Error>().is_some());
    }

    #[tokio::test]
    async fn test_create_envelope() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/accounts/A1/envelopes")
            .match_header("authorization", "Bearer tok123")
            .match_body(Matcher::PartialJson(json!({
                "emailSubject": "Please sign",
                "status": "sent",
                "recipients": {"signers": [{"email": "jane@example.com", "recipientId": "1"}]}
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"envelopeId":"env-1","status":"sent","statusDateTime":"2024-01-01T00:00:00Z","uri":"/envelopes/env-1"}"#,
            )
            .create_async()
            .await;

        let gateway = gateway_for(&server.url());
        let signer = Signer::new("1", "Jane Roe", "jane@example.com")
            .with_sign_here(SignHere::at("1", "1", 1, 100, 150));
        let definition = EnvelopeDefinition::with_document(
            "Please sign",
            Document::from_bytes("1", "TestFile", "pdf", b"%PDF"),
            signer,
            EnvelopeStatus::Sent,
        );

        let summary = gateway.create_envelope(&definition).await.unwrap();
        assert_eq!(summary.envelope_id, "env-1");
        assert_eq!(summary.status.as_deref(), Some("sent"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_envelope_unauthorized() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v2/accounts/A1/envelopes/env-1")
            .with_status(401)
            .with_body(r#"{"errorCode":"USER_AUTHENTICATION_FAILED"}"#)
            .create_async()
            .await;

        let gateway = gateway_for(&server.url());
        let err = gateway.get_envelope("env-1").await.unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Unauthorized)
        );
        assert!(err.to_string().contains("get_envelope"));
    }

    #[tokio::test]
    async fn test_server_error_is_transport_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v2/accounts/A1/envelopes/missing/recipients")
            .with_status(404)
            .with_body(r#"{"errorCode":"ENVELOPE_DOES_NOT_EXIST"}"#)
            .create_async()
            .await;

        let gateway = gateway_for(&server.url());
        let err = gateway.list_recipients("missing").await.unwrap_err();

        assert!(matches!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::Transport(_))
        ));
        let text = err.to_string();
        assert!(text.contains("list_recipients"));
        assert!(text.contains("ENVELOPE_DOES_NOT_EXIST"));
    }

    #[tokio::test]
    async fn test_list_recipients() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v2/accounts/A1/envelopes/env-1/recipients")
            .with_status(200)
            .with_body(
                r#"{"signers":[{"email":"jane@example.com","name":"Jane Roe","recipientId":"1","status":"sent"}],"recipientCount":"1","carbonCopies":[]}"#,
            )
            .create_async()
            .await;

        let gateway = gateway_for(&server.url());
        let recipients = gateway.list_recipients("env-1").await.unwrap();

        assert_eq!(recipients.signers.len(), 1);
        assert_eq!(recipients.signers[0].status.as_deref(), Some("sent"));
        assert!(recipients.extra.contains_key("carbonCopies"));
    }

    #[tokio::test]
    async fn test_get_document_returns_bytes() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v2/accounts/A1/envelopes/env-1/documents/combined")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body(b"%PDF-1.4")
            .create_async()
            .await;

        let gateway = gateway_for(&server.url());
        let bytes = gateway.get_document("env-1", "combined").await.unwrap();
        assert_eq!(bytes, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_views() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v2/accounts/A1/envelopes/env-1/views/sender")
            .match_body(Matcher::Json(json!({"returnUrl": "https://example.com/done"})))
            .with_status(201)
            .with_body(r#"{"url":"https://demo/sender"}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/v2/accounts/A1/views/console")
            .match_body(Matcher::Json(json!({"returnUrl": "https://example.com/done"})))
            .with_status(201)
            .with_body(r#"{"url":"https://demo/console"}"#)
            .create_async()
            .await;

        let gateway = gateway_for(&server.url());
        let sender = gateway
            .create_sender_view(
                "env-1",
                &ReturnUrlRequest {
                    return_url: "https://example.com/done".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(sender.url, "https://demo/sender");

        let console = gateway
            .create_console_view(&ConsoleViewRequest {
                return_url: Some("https://example.com/done".to_string()),
                envelope_id: None,
            })
            .await
            .unwrap();
        assert_eq!(console.url, "https://demo/console");
    }

    #[tokio::test]
    async fn test_list_status_changes_sends_filter() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/accounts/A1/envelopes")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("from_date".into(), "2024-01-15".into()),
                Matcher::UrlEncoded("count".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"envelopes":[{"envelopeId":"env-1","status":"sent"}],"resultSetSize":"1"}"#,
            )
            .create_async()
            .await;

        let gateway = gateway_for(&server.url());
        let options = ListStatusChangesOptions {
            from_date: "2024-01-15".to_string(),
            count: Some(10),
            status: None,
        };

        let info = gateway.list_status_changes(&options).await.unwrap();
        assert_eq!(info.envelopes.len(), 1);
        assert_eq!(info.result_set_size.as_deref(), Some("1"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reconfigure_replaces_base_url() {
        let mut first = Server::new_async().await;
        let mut second = Server::new_async().await;
        let old = first
            .mock("GET", "/v2/accounts/A1/envelopes/env-1")
            .expect(0)
            .create_async()
            .await;
        let new = second
            .mock("GET", "/v2/accounts/A1/envelopes/env-1")
            .with_status(200)
            .with_body(r#"{"envelopeId":"env-1"}"#)
            .create_async()
            .await;

        let mut gateway = gateway_for(&first.url());
        gateway.configure(binding(&second.url()));
        gateway.get_envelope("env-1").await.unwrap();

        old.assert_async().await;
        new.assert_async().await;
    }
}
