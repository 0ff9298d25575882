use crate::{
    configuration::EmailClientSettings,
    domain::{LeadMagnet, NewSubscriber, SubscriberEmail},
};

use {
    chrono::{Datelike, Utc},
    reqwest::Client,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Client for the Brevo REST API, covering the two halves used by the signup
/// funnel: contact-list upserts and transactional email.
///
/// Credentials are optional so that a deployment without them still boots;
/// every operation then short-circuits to [`EmailClientError::NotConfigured`]
/// without touching the network.
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: SubscriberEmail,
    sender_name: String,
    site_url: String,
    api_key: Option<Secret<String>>,
    list_id: Option<i64>,
}

#[derive(thiserror::Error, Debug)]
pub enum EmailClientError {
    #[error("email service not configured")]
    NotConfigured,
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("rejected by the email provider: {0}")]
    Rejected(String),
}

/// Outcome of a contact upsert. The provider reports an already-known email
/// as a `duplicate_parameter` error; with update semantics enabled that is a
/// success, not a failure.
#[derive(Debug, PartialEq, Eq)]
pub enum ContactOutcome {
    Created(i64),
    AlreadyExists,
}

impl EmailClient {
    pub fn new(
        settings: EmailClientSettings,
        sender_name: String,
        site_url: String,
    ) -> Result<Self, String> {
        let http_client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| format!("Failed to build the HTTP client: {}", e))?;
        let sender = settings.sender()?;
        Ok(Self {
            http_client,
            base_url: settings.base_url,
            sender,
            sender_name,
            site_url,
            api_key: settings.api_key,
            list_id: settings.list_id,
        })
    }

    /// Insert-or-update a contact on the configured list, keyed on email.
    #[tracing::instrument(
        name = "Upserting contact in the CRM",
        skip(self, subscriber),
        fields(subscriber_email = %subscriber.email)
    )]
    pub async fn upsert_contact(
        &self,
        subscriber: &NewSubscriber,
    ) -> Result<ContactOutcome, EmailClientError> {
        let (api_key, list_id) = match (&self.api_key, self.list_id) {
            (Some(key), Some(id)) => (key, id),
            _ => return Err(EmailClientError::NotConfigured),
        };

        let (first_name, last_name) = subscriber.first_last_name();
        let body = UpsertContactRequest {
            email: subscriber.email.as_ref(),
            attributes: ContactAttributes {
                first_name,
                last_name,
                source: &subscriber.source,
                interests: subscriber.tags.join(","),
            },
            list_ids: [list_id],
            update_enabled: true,
        };

        let response = self
            .http_client
            .post(format!("{}/contacts", self.base_url))
            .header("api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            let created: CreatedContact = response.json().await?;
            return Ok(ContactOutcome::Created(created.id));
        }

        let error: ProviderError = response.json().await?;
        if error.code.as_deref() == Some("duplicate_parameter") {
            Ok(ContactOutcome::AlreadyExists)
        } else {
            Err(EmailClientError::Rejected(
                error
                    .message
                    .unwrap_or_else(|| "no error detail provided".into()),
            ))
        }
    }

    /// Send a single transactional email.
    pub async fn send_email(
        &self,
        recipient: &SubscriberEmail,
        subject: &str,
        html_content: &str,
        text_content: Option<&str>,
        tags: &[&str],
    ) -> Result<(), EmailClientError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(EmailClientError::NotConfigured)?;

        let body = SendEmailRequest {
            sender: EmailAddress {
                name: &self.sender_name,
                email: self.sender.as_ref(),
            },
            to: [Recipient {
                email: recipient.as_ref(),
            }],
            subject,
            html_content,
            text_content,
            tags,
        };

        let response = self
            .http_client
            .post(format!("{}/smtp/email", self.base_url))
            .header("api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let error: ProviderError = response.json().await?;
            Err(EmailClientError::Rejected(
                error
                    .message
                    .unwrap_or_else(|| "no error detail provided".into()),
            ))
        }
    }

    /// Send the onboarding email to a fresh subscriber.
    #[tracing::instrument(
        name = "Sending welcome email",
        skip(self, recipient, name),
        fields(subscriber_email = %recipient)
    )]
    pub async fn send_welcome_email(
        &self,
        recipient: &SubscriberEmail,
        name: Option<&str>,
    ) -> Result<(), EmailClientError> {
        let greeting = name.unwrap_or("there");
        let subject = format!("Welcome to {}! \u{1f389}", self.sender_name);
        let html_content = format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h1>Welcome to {site_name}!</h1>
  <p>Hi {greeting},</p>
  <p>Thanks for subscribing to {site_name}! You're now part of a community of 10,000+ creators and entrepreneurs.</p>
  <h2>What You'll Get:</h2>
  <ul>
    <li>Weekly AI tool reviews and comparisons</li>
    <li>Exclusive deals and discounts</li>
    <li>Early access to new tools</li>
    <li>Tips and tutorials for growing your business</li>
  </ul>
  <p><a href="{site_url}/blog">Explore Our Latest Articles</a></p>
  <p>If you have any questions, just reply to this email. I'm here to help!</p>
  <p>Best regards,<br>The {site_name} Team</p>
  <p style="color: #666; font-size: 12px;">
    &copy; {year} {site_name}. All rights reserved.<br>
    <a href="{site_url}/privacy">Privacy Policy</a> | <a href="{site_url}/unsubscribe">Unsubscribe</a>
  </p>
</body>
</html>"#,
            site_name = self.sender_name,
            site_url = self.site_url,
            greeting = greeting,
            year = Utc::now().year(),
        );
        let text_content = format!(
            "Welcome to {site_name}!\n\n\
             Hi {greeting},\n\n\
             Thanks for subscribing to {site_name}! You're now part of a community of 10,000+ creators and entrepreneurs.\n\n\
             What You'll Get:\n\
             - Weekly AI tool reviews and comparisons\n\
             - Exclusive deals and discounts\n\
             - Early access to new tools\n\
             - Tips and tutorials for growing your business\n\n\
             Explore our latest articles: {site_url}/blog\n\n\
             Best regards,\nThe {site_name} Team\n",
            site_name = self.sender_name,
            site_url = self.site_url,
            greeting = greeting,
        );

        self.send_email(
            recipient,
            &subject,
            &html_content,
            Some(&text_content),
            &["welcome", "transactional"],
        )
        .await
    }

    /// Deliver a lead magnet download link.
    #[tracing::instrument(
        name = "Sending lead magnet email",
        skip(self, recipient, lead_magnet, name),
        fields(subscriber_email = %recipient, lead_magnet = %lead_magnet.name)
    )]
    pub async fn send_lead_magnet_email(
        &self,
        recipient: &SubscriberEmail,
        lead_magnet: &LeadMagnet,
        name: Option<&str>,
    ) -> Result<(), EmailClientError> {
        let greeting = name.unwrap_or("there");
        let subject = format!("Your Free {} is Ready! \u{1f4e5}", lead_magnet.name);
        let html_content = format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h1>Here's Your Free {name}!</h1>
  <p>Hi {greeting},</p>
  <p>Thanks for downloading our {name}!</p>
  <p><a href="{file_url}" style="background: #10b981; color: white; padding: 15px 40px; text-decoration: none;">Download Now</a></p>
  <p>{description}</p>
  <p>Enjoy!<br>The {site_name} Team</p>
</body>
</html>"#,
            name = lead_magnet.name,
            file_url = lead_magnet.file_url,
            description = lead_magnet.description,
            greeting = greeting,
            site_name = self.sender_name,
        );

        self.send_email(
            recipient,
            &subject,
            &html_content,
            None,
            &["lead-magnet", "download"],
        )
        .await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpsertContactRequest<'a> {
    email: &'a str,
    attributes: ContactAttributes<'a>,
    list_ids: [i64; 1],
    update_enabled: bool,
}

#[derive(Serialize)]
struct ContactAttributes<'a> {
    #[serde(rename = "FIRSTNAME", skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    #[serde(rename = "LASTNAME", skip_serializing_if = "Option::is_none")]
    last_name: Option<&'a str>,
    #[serde(rename = "SOURCE")]
    source: &'a str,
    #[serde(rename = "INTERESTS")]
    interests: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    sender: EmailAddress<'a>,
    to: [Recipient<'a>; 1],
    subject: &'a str,
    html_content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_content: Option<&'a str>,
    tags: &'a [&'a str],
}

#[derive(Serialize)]
struct EmailAddress<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct Recipient<'a> {
    email: &'a str,
}

#[derive(Deserialize)]
struct CreatedContact {
    id: i64,
}

#[derive(Deserialize)]
struct ProviderError {
    code: Option<String>,
    message: Option<String>,
}
