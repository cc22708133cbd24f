//! Sample signing flows built on top of [`ApiGateway`].
//!
//! Each flow is a short sequence of gateway calls: sending a local document for
//! signature, sending from a template, embedded signing, downloading the documents of
//! an envelope and listing recent status changes.

use crate::envelope::{
    Document, EnvelopeDefinition, EnvelopeStatus, EnvelopeSummary, EnvelopesInformation,
    ListStatusChangesOptions, RecipientViewRequest, SignHere, Signer, TemplateRole, ViewUrl,
};
use crate::error::{Error, InternalErrorKind};
use crate::gateway::esign::ApiGateway;
use chrono::{Duration, Utc};
use log::*;
use std::path::{Path, PathBuf};

const DOCUMENT_ID: &str = "1";
const RECIPIENT_ID: &str = "1";
const DEFAULT_FILE_EXTENSION: &str = "pdf";

// Sign-here tab placement, in pixels from the top left of the first page.
const SIGN_HERE_PAGE: u32 = 1;
const SIGN_HERE_X: u32 = 100;
const SIGN_HERE_Y: u32 = 150;

/// Name and email of the person asked to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub email: String,
}

impl Participant {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
        }
    }

    fn signer(&self) -> Signer {
        Signer::new(RECIPIENT_ID, &self.name, &self.email).with_sign_here(SignHere::at(
            DOCUMENT_ID,
            RECIPIENT_ID,
            SIGN_HERE_PAGE,
            SIGN_HERE_X,
            SIGN_HERE_Y,
        ))
    }
}

/// Send the file at `path` to `signer` with one sign-here tab on the first page.
///
/// With [`EnvelopeStatus::Created`] the envelope is saved as a draft instead.
pub async fn send_document(
    gateway: &ApiGateway,
    path: &Path,
    signer: &Participant,
    status: EnvelopeStatus,
) -> Result<EnvelopeSummary, Error> {
    let definition = document_envelope(path, signer.signer(), status).await?;
    gateway.create_envelope(&definition).await
}

/// Like [`send_document`], but the signer is embedded: they sign through a URL from
/// [`embedded_signing_url`] rather than by email.
pub async fn send_embedded_document(
    gateway: &ApiGateway,
    path: &Path,
    signer: &Participant,
    client_user_id: &str,
) -> Result<EnvelopeSummary, Error> {
    require("client_user_id", client_user_id)?;
    let embedded = signer.signer().embedded(client_user_id);
    let definition = document_envelope(path, embedded, EnvelopeStatus::Sent).await?;
    gateway.create_envelope(&definition).await
}

/// Send an envelope from a server-side template, filling `role_name` with `signer`.
pub async fn send_from_template(
    gateway: &ApiGateway,
    template_id: &str,
    role_name: &str,
    signer: &Participant,
) -> Result<EnvelopeSummary, Error> {
    require("template_id", template_id)?;
    require("role_name", role_name)?;

    let definition = EnvelopeDefinition::from_template(
        "Please sign this document",
        template_id,
        vec![TemplateRole::new(role_name, &signer.name, &signer.email)],
        EnvelopeStatus::Sent,
    );
    gateway.create_envelope(&definition).await
}

/// URL where an embedded signer can sign `envelope_id`.
pub async fn embedded_signing_url(
    gateway: &ApiGateway,
    envelope_id: &str,
    signer: &Participant,
    client_user_id: &str,
    return_url: &str,
) -> Result<ViewUrl, Error> {
    require("client_user_id", client_user_id)?;
    require("return_url", return_url)?;

    let embedded = Signer::new(RECIPIENT_ID, &signer.name, &signer.email).embedded(client_user_id);
    let request = RecipientViewRequest::for_signer(&embedded, client_user_id, return_url);
    gateway.create_recipient_view(envelope_id, &request).await
}

/// Download every document of `envelope_id` into `dir`, returning the written paths
/// in listing order.
pub async fn download_documents(
    gateway: &ApiGateway,
    envelope_id: &str,
    dir: &Path,
) -> Result<Vec<PathBuf>, Error> {
    let listing = gateway.list_documents(envelope_id).await?;
    tokio::fs::create_dir_all(dir).await?;

    let mut written = Vec::with_capacity(listing.envelope_documents.len());
    for document in &listing.envelope_documents {
        let bytes = gateway
            .get_document(envelope_id, &document.document_id)
            .await?;

        let name = document.name.as_deref().unwrap_or_default();
        let path = dir.join(document_file_name(&document.document_id, name));
        tokio::fs::write(&path, &bytes).await?;
        info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        written.push(path);
    }

    Ok(written)
}

/// Envelopes whose status changed during the last `days` days.
pub async fn recent_status_changes(
    gateway: &ApiGateway,
    days: u32,
    count: Option<u32>,
) -> Result<EnvelopesInformation, Error> {
    let since = Duration::try_days(i64::from(days))
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .ok_or_else(|| {
            Error::internal(
                InternalErrorKind::InvalidInput(format!("{days} days is out of range")),
                "status change window reaches before the earliest representable date",
            )
        })?;
    let mut options = ListStatusChangesOptions::since(since);
    if let Some(count) = count {
        options = options.with_count(count);
    }
    gateway.list_status_changes(&options).await
}

async fn document_envelope(
    path: &Path,
    signer: Signer,
    status: EnvelopeStatus,
) -> Result<EnvelopeDefinition, Error> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        warn!("Failed to read document {}: {e:?}", path.display());
        Error::from(e)
    })?;
    if bytes.is_empty() {
        return Err(Error::internal(
            InternalErrorKind::InvalidInput(format!("{} is empty", path.display())),
            "document has no content",
        ));
    }

    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("Document");
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or(DEFAULT_FILE_EXTENSION);
    debug!("Attaching {} ({} bytes)", path.display(), bytes.len());

    Ok(EnvelopeDefinition::with_document(
        "Please sign this document",
        Document::from_bytes(DOCUMENT_ID, name, extension, &bytes),
        signer,
        status,
    ))
}

/// `{document_id}-{name}` reduced to characters that are safe in a file name.
fn document_file_name(document_id: &str, name: &str) -> String {
    let sanitize = |s: &str| -> String {
        s.chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
                _ => '_',
            })
            .collect::<String>()
            .trim_matches('.')
            .to_string()
    };

    let id = sanitize(document_id);
    let name = sanitize(name);
    let mut file_name = if name.is_empty() {
        format!("document-{id}")
    } else {
        format!("{id}-{name}")
    };
    if !file_name.contains('.') {
        file_name.push('.');
        file_name.push_str(DEFAULT_FILE_EXTENSION);
    }
    file_name
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
