//! Envelope payloads exchanged with the e-signature REST API.
//!
//! Only the fields the sample flows set or read are modeled. Response types keep every
//! other field in `extra`, so nothing the service returns is dropped when a payload is
//! passed through.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Send the envelope right away, or keep it as a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Sent,
    Created,
}

/// Request body for creating an envelope.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDefinition {
    pub email_subject: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Recipients>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub template_roles: Vec<TemplateRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EnvelopeStatus>,
}

impl EnvelopeDefinition {
    /// An envelope carrying one document and one signer.
    pub fn with_document(
        email_subject: &str,
        document: Document,
        signer: Signer,
        status: EnvelopeStatus,
    ) -> Self {
        Self {
            email_subject: email_subject.to_string(),
            documents: vec![document],
            recipients: Some(Recipients {
                signers: vec![signer],
            }),
            status: Some(status),
            ..Default::default()
        }
    }

    /// An envelope created from a server-side template.
    pub fn from_template(
        email_subject: &str,
        template_id: &str,
        roles: Vec<TemplateRole>,
        status: EnvelopeStatus,
    ) -> Self {
        Self {
            email_subject: email_subject.to_string(),
            template_id: Some(template_id.to_string()),
            template_roles: roles,
            status: Some(status),
            ..Default::default()
        }
    }
}

/// A document inlined as base64.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_base64: String,
    /// Display name; may differ from the file the bytes came from.
    pub name: String,
    pub file_extension: String,
    pub document_id: String,
}

impl Document {
    pub fn from_bytes(document_id: &str, name: &str, file_extension: &str, bytes: &[u8]) -> Self {
        Self {
            document_base64: STANDARD.encode(bytes),
            name: name.to_string(),
            file_extension: file_extension.trim_start_matches('.').to_string(),
            document_id: document_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipients {
    #[serde(default)]
    pub signers: Vec<Signer>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signer {
    pub email: String,
    pub name: String,
    pub recipient_id: String,
    /// Setting this makes the signer an embedded recipient, which is required before a
    /// recipient view (signing URL) can be generated for them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabs: Option<Tabs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Signer {
    pub fn new(recipient_id: &str, name: &str, email: &str) -> Self {
        Self {
            email: email.to_string(),
            name: name.to_string(),
            recipient_id: recipient_id.to_string(),
            ..Default::default()
        }
    }

    pub fn embedded(mut self, client_user_id: &str) -> Self {
        self.client_user_id = Some(client_user_id.to_string());
        self
    }

    pub fn with_sign_here(mut self, sign_here: SignHere) -> Self {
        self.tabs
            .get_or_insert_with(Tabs::default)
            .sign_here_tabs
            .push(sign_here);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tabs {
    #[serde(default)]
    pub sign_here_tabs: Vec<SignHere>,
}

/// Signature field placement. Positions are in pixels from the top left of the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignHere {
    pub document_id: String,
    pub page_number: String,
    pub recipient_id: String,
    pub x_position: String,
    pub y_position: String,
}

impl SignHere {
    pub fn at(document_id: &str, recipient_id: &str, page: u32, x: u32, y: u32) -> Self {
        Self {
            document_id: document_id.to_string(),
            page_number: page.to_string(),
            recipient_id: recipient_id.to_string(),
            x_position: x.to_string(),
            y_position: y.to_string(),
        }
    }
}

/// Signer information for a role defined on a template.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRole {
    pub role_name: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_user_id: Option<String>,
}

impl TemplateRole {
    pub fn new(role_name: &str, name: &str, email: &str) -> Self {
        Self {
            role_name: role_name.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            client_user_id: None,
        }
    }
}

/// Response from creating an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeSummary {
    pub envelope_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_date_time: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Envelope status and information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub envelope_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub email_subject: Option<String>,
    #[serde(default)]
    pub sent_date_time: Option<String>,
    #[serde(default)]
    pub status_changed_date_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Recipients as listed for an existing envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeRecipients {
    #[serde(default)]
    pub signers: Vec<Signer>,
    #[serde(default)]
    pub recipient_count: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDocumentsResult {
    #[serde(default)]
    pub envelope_id: Option<String>,
    #[serde(default)]
    pub envelope_documents: Vec<EnvelopeDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDocument {
    pub document_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub document_type: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request for an embedded signing URL. Recipient details must match the embedded
/// signer on the envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientViewRequest {
    pub return_url: String,
    pub authentication_method: String,
    pub email: String,
    pub user_name: String,
    pub recipient_id: String,
    pub client_user_id: String,
}

impl RecipientViewRequest {
    /// A view request for an embedded `signer`, authenticated by email.
    pub fn for_signer(signer: &Signer, client_user_id: &str, return_url: &str) -> Self {
        Self {
            return_url: return_url.to_string(),
            authentication_method: "email".to_string(),
            email: signer.email.clone(),
            user_name: signer.name.clone(),
            recipient_id: signer.recipient_id.clone(),
            client_user_id: client_user_id.to_string(),
        }
    }
}

/// Request for an embedded sender ("tag and send") view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnUrlRequest {
    pub return_url: String,
}

/// Request for an embedded console view. With an envelope id the console opens on it.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleViewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envelope_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewUrl {
    pub url: String,
}

/// Filter for listing envelope status changes. A `from_date` is required by the service.
#[derive(Debug, Clone, Serialize)]
pub struct ListStatusChangesOptions {
    pub from_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ListStatusChangesOptions {
    pub fn since(from: DateTime<Utc>) -> Self {
        Self {
            from_date: from.to_rfc3339(),
            count: None,
            status: None,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopesInformation {
    #[serde(default)]
    pub envelopes: Vec<Envelope>,
    #[serde(default)]
    pub result_set_size: Option<String>,
    #[serde(default)]
    pub total_set_size: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
