use crate::{configuration::WebhookSettings, domain::NewSubscriber};

use {chrono::Utc, reqwest::Client, serde::Serialize};

/// Best-effort signup notifications to an automation webhook (a Make.com
/// scenario in production). Deployments without a URL skip the call entirely.
pub struct WebhookClient {
    http_client: Client,
    url: Option<String>,
}

impl WebhookClient {
    pub fn new(settings: WebhookSettings) -> Result<Self, String> {
        let http_client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| format!("Failed to build the HTTP client: {}", e))?;
        Ok(Self {
            http_client,
            url: settings.url,
        })
    }

    /// POST a `newsletter_signup` event carrying the submitted fields and a
    /// timestamp. A no-op when no webhook URL is configured.
    #[tracing::instrument(
        name = "Notifying the signup webhook",
        skip(self, subscriber),
        fields(subscriber_email = %subscriber.email)
    )]
    pub async fn notify_signup(&self, subscriber: &NewSubscriber) -> Result<(), reqwest::Error> {
        let url = match &self.url {
            Some(url) => url,
            None => return Ok(()),
        };

        let event = SignupEvent {
            event: "newsletter_signup",
            data: SignupData {
                email: subscriber.email.as_ref(),
                name: subscriber.name.as_deref(),
                source: &subscriber.source,
                tags: &subscriber.tags,
                timestamp: Utc::now().to_rfc3339(),
            },
        };

        self.http_client
            .post(url)
            .json(&event)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

#[derive(Serialize)]
struct SignupEvent<'a> {
    event: &'static str,
    data: SignupData<'a>,
}

#[derive(Serialize)]
struct SignupData<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    source: &'a str,
    tags: &'a [String],
    timestamp: String,
}
