use async_trait::async_trait;
use serde::Serialize;

use crate::config::MailConfig;
use crate::error::SendError;

/// Rendered notification, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Delivery collaborator. Lifecycle operations never roll back on a send
/// failure; callers log and move on.
#[async_trait]
pub trait Sender: Send + Sync {
    async fn send(&self, to: &str, message: &Message) -> Result<(), SendError>;
}

#[async_trait]
impl<T: Sender + ?Sized> Sender for std::sync::Arc<T> {
    async fn send(&self, to: &str, message: &Message) -> Result<(), SendError> {
        (**self).send(to, message).await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoEmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendEmailBody {
    sender: BrevoEmailAddress,
    to: Vec<BrevoEmailAddress>,
    subject: String,
    html_content: String,
    text_content: String,
}

pub const BREVO_ENDPOINT: &str = "https://api.brevo.com/v3/smtp/email";

/// Sender backed by the Brevo transactional email API.
pub struct BrevoSender {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    sender_email: String,
    sender_name: Option<String>,
}

impl BrevoSender {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: BREVO_ENDPOINT.to_string(),
            api_key: config.api_key.clone(),
            sender_email: config.sender_email.clone(),
            sender_name: config.sender_name.clone(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Sender for BrevoSender {
    async fn send(&self, to: &str, message: &Message) -> Result<(), SendError> {
        let body = BrevoSendEmailBody {
            sender: BrevoEmailAddress {
                email: self.sender_email.clone(),
                name: self.sender_name.clone(),
            },
            to: vec![BrevoEmailAddress {
                email: to.to_string(),
                name: None,
            }],
            subject: message.subject.clone(),
            html_content: message.html.clone(),
            text_content: message.text.clone(),
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .header("Accept", "application/json")
            .header("User-Agent", "Spearmint/0.1")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(SendError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}

/// Build a portal link with the email/code pair query-encoded.
fn portal_link(public_url: &str, path: &str, email: &str, code: &str) -> String {
    let base = format!("{}/{}", public_url.trim_end_matches('/'), path);
    match reqwest::Url::parse_with_params(&base, &[("email", email), ("code", code)]) {
        Ok(url) => url.to_string(),
        // public_url was validated at config time; fall back to a naive join
        // rather than dropping the notification.
        Err(_) => format!("{base}?email={email}&code={code}"),
    }
}

pub fn activation_message(public_url: &str, email: &str, code: &str) -> Message {
    let link = portal_link(public_url, "activate", email, code);
    Message {
        subject: "Activate your corp portal account".to_string(),
        html: format!(
            "<p>Welcome to the corp portal.</p>\
             <p><a href=\"{link}\">Activate your account</a> to finish registration.</p>"
        ),
        text: format!(
            "Welcome to the corp portal.\n\nActivate your account to finish registration:\n{link}\n"
        ),
    }
}

pub fn recovery_message(public_url: &str, email: &str, code: &str) -> Message {
    let link = portal_link(public_url, "recover", email, code);
    Message {
        subject: "Corp portal password recovery".to_string(),
        html: format!(
            "<p>A password recovery was requested for your account.</p>\
             <p><a href=\"{link}\">Reset your password</a>. \
             If you did not request this, you can ignore this message.</p>"
        ),
        text: format!(
            "A password recovery was requested for your account.\n\n\
             Reset your password:\n{link}\n\n\
             If you did not request this, you can ignore this message.\n"
        ),
    }
}
