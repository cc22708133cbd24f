use anyhow::{bail, Context, Result};
use clap::Parser;
use domain::envelope::{ConsoleViewRequest, EnvelopeStatus, ReturnUrlRequest};
use domain::gateway::esign::ApiGateway;
use domain::signing::{self, Participant};
use esign_auth::http::ClientBuilder;
use esign_auth::oauth::{AuthorizationCode, Session};
use log::*;
use serde_json::{json, Value};
use service::config::{self, Config};
use service::logging::Logger;
use std::path::PathBuf;

/// Authorize against the e-signature service and run one envelope sample.
///
/// Run once without `--code`/`--redirect-url` to get the login URL, then again with
/// the code (or the whole redirect URL) the browser was sent back with.
#[derive(Parser)]
#[command(name = "esign_samples", version, about)]
struct Cli {
    #[command(flatten)]
    config: Config,

    /// Authorization code from the redirect
    #[arg(long, conflicts_with = "redirect_url")]
    code: Option<String>,

    /// Full URL the browser was redirected to after consent
    #[arg(long)]
    redirect_url: Option<String>,

    /// Opaque state to carry through the login URL
    #[arg(long)]
    state: Option<String>,

    /// Sample to run once authorized
    #[arg(long, value_enum, default_value_t = SampleChoice::Account)]
    sample: SampleChoice,

    /// Name of the signer
    #[arg(long, env)]
    signer_name: Option<String>,

    /// Email of the signer
    #[arg(long, env)]
    signer_email: Option<String>,

    /// Local document to send for signature
    #[arg(long)]
    document: Option<PathBuf>,

    /// Envelope to inspect, download or open a view for
    #[arg(long)]
    envelope_id: Option<String>,

    /// Server-side template to send from
    #[arg(long, env)]
    template_id: Option<String>,

    /// Template role filled by the signer
    #[arg(long, default_value = "Signer")]
    role_name: String,

    /// Identifier the embedded signer is known by in this application
    #[arg(long, default_value = "1001")]
    client_user_id: String,

    /// Where embedded views send the user when they finish
    #[arg(long, default_value = "https://www.docusign.com/devcenter")]
    return_url: String,

    /// How many days back to look for status changes
    #[arg(long, default_value_t = 10)]
    days: u32,

    /// Maximum number of envelopes to list
    #[arg(long)]
    count: Option<u32>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SampleChoice {
    /// Print the discovered account binding
    Account,
    /// Send a local document to a signer by email
    SendDocument,
    /// Save a local document as a draft envelope
    SendDraft,
    /// Send a local document to an embedded signer and return the signing URL
    EmbeddedSigning,
    /// Send an envelope from a template
    SendTemplate,
    /// Get an envelope's status
    EnvelopeStatus,
    /// List an envelope's recipients
    ListRecipients,
    /// Download every document of an envelope
    DownloadDocuments,
    /// List envelopes whose status changed recently
    StatusChanges,
    /// Open the embedded sending view for a draft envelope
    SenderView,
    /// Open the embedded console
    ConsoleView,
}

#[tokio::main]
async fn main() -> Result<()> {
    config::load_dotenv();
    let cli = Cli::parse();

    Logger::init_logger(&cli.config).context("Failed to start logger")?;
    info!(
        "Starting esign_samples in {} mode",
        cli.config.runtime_env()
    );

    let credentials = cli
        .config
        .credentials()
        .context("Invalid client credentials")?;
    let client = ClientBuilder::from_config(cli.config.http_client_config())
        .build()
        .context("Failed to build HTTP client")?;
    let mut session = Session::with_client(credentials, client.clone())?;

    let code = match (&cli.code, &cli.redirect_url) {
        (Some(code), _) => AuthorizationCode::new(code),
        (None, Some(redirect_url)) => session.receive_redirect(redirect_url)?,
        (None, None) => {
            let url = match &cli.state {
                Some(state) => session.build_authorization_url_with_state(state)?,
                None => session.build_authorization_url()?,
            };
            println!("Open this URL in a browser and grant consent:\n\n{url}\n");
            println!("Then run again with --code <CODE> or --redirect-url <URL>.");
            return Ok(());
        }
    };

    session.register_token_listener(|token| {
        info!(
            "Received {} access token issued at {}",
            token.token_type, token.issued_at
        );
        Ok(())
    });

    let token = session
        .exchange_code(&code)
        .await
        .context("Authorization code exchange failed")?;
    let binding = session
        .discover_account(&token)
        .await
        .context("Account discovery failed")?;

    let mut gateway = ApiGateway::with_client(client);
    gateway.configure(binding);
    gateway.authorize(token);

    let output = run_sample(&cli, &gateway).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_sample(cli: &Cli, gateway: &ApiGateway) -> Result<Value> {
    debug!("Running sample {:?}", cli.sample);

    let output = match cli.sample {
        SampleChoice::Account => serde_json::to_value(gateway.binding())?,
        SampleChoice::SendDocument | SampleChoice::SendDraft => {
            let status = match cli.sample {
                SampleChoice::SendDraft => EnvelopeStatus::Created,
                _ => EnvelopeStatus::Sent,
            };
            let summary =
                signing::send_document(gateway, document(cli)?, &signer(cli)?, status).await?;
            serde_json::to_value(summary)?
        }
        SampleChoice::EmbeddedSigning => {
            let signer = signer(cli)?;
            let summary = signing::send_embedded_document(
                gateway,
                document(cli)?,
                &signer,
                &cli.client_user_id,
            )
            .await?;
            let view = signing::embedded_signing_url(
                gateway,
                &summary.envelope_id,
                &signer,
                &cli.client_user_id,
                &cli.return_url,
            )
            .await?;
            json!({ "envelope": summary, "signing_url": view.url })
        }
        SampleChoice::SendTemplate => {
            let template_id = required(&cli.template_id, "--template-id")?;
            let summary =
                signing::send_from_template(gateway, template_id, &cli.role_name, &signer(cli)?)
                    .await?;
            serde_json::to_value(summary)?
        }
        SampleChoice::EnvelopeStatus => {
            let envelope_id = required(&cli.envelope_id, "--envelope-id")?;
            serde_json::to_value(gateway.get_envelope(envelope_id).await?)?
        }
        SampleChoice::ListRecipients => {
            let envelope_id = required(&cli.envelope_id, "--envelope-id")?;
            serde_json::to_value(gateway.list_recipients(envelope_id).await?)?
        }
        SampleChoice::DownloadDocuments => {
            let envelope_id = required(&cli.envelope_id, "--envelope-id")?;
            let written =
                signing::download_documents(gateway, envelope_id, &cli.config.download_dir)
                    .await?;
            serde_json::to_value(written)?
        }
        SampleChoice::StatusChanges => {
            let changes = signing::recent_status_changes(gateway, cli.days, cli.count).await?;
            serde_json::to_value(changes)?
        }
        SampleChoice::SenderView => {
            let envelope_id = required(&cli.envelope_id, "--envelope-id")?;
            let request = ReturnUrlRequest {
                return_url: cli.return_url.clone(),
            };
            serde_json::to_value(gateway.create_sender_view(envelope_id, &request).await?)?
        }
        SampleChoice::ConsoleView => {
            let request = ConsoleViewRequest {
                return_url: Some(cli.return_url.clone()),
                envelope_id: cli.envelope_id.clone(),
            };
            serde_json::to_value(gateway.create_console_view(&request).await?)?
        }
    };

    Ok(output)
}

fn signer(cli: &Cli) -> Result<Participant> {
    let name = required(&cli.signer_name, "--signer-name")?;
    let email = required(&cli.signer_email, "--signer-email")?;
    Ok(Participant::new(name, email))
}

fn document(cli: &Cli) -> Result<&std::path::Path> {
    match &cli.document {
        Some(path) => Ok(path.as_path()),
        None => bail!("--document is required for the {:?} sample", cli.sample),
    }
}

fn required<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("{flag} is required for this sample"),
    }
}
