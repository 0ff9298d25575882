use crate::{
    domain::{NewSubscriber, SubscriberEmail},
    webhook::WebhookClient,
    EmailClient,
};

use {
    actix_web::{http::StatusCode, web, HttpResponse, ResponseError},
    anyhow::Context,
    chrono::Utc,
    serde::{Deserialize, Serialize},
    sqlx::PgPool,
    uuid::Uuid,
};

#[derive(Deserialize, Debug)]
pub struct SubscribeRequest {
    email: Option<String>,
    name: Option<String>,
    source: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl TryFrom<SubscribeRequest> for NewSubscriber {
    type Error = String;

    fn try_from(request: SubscribeRequest) -> Result<Self, Self::Error> {
        let email = SubscriberEmail::parse(request.email.unwrap_or_default())?;
        Ok(NewSubscriber {
            email,
            name: request.name,
            source: request.source.unwrap_or_else(|| "website".to_string()),
            tags: request.tags,
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SubscribeError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Callers get the fixed public messages; the detail stays in the logs.
    fn error_response(&self) -> HttpResponse {
        let error = match self {
            SubscribeError::ValidationError(_) => "Valid email is required",
            SubscribeError::UnexpectedError(_) => "Internal server error",
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            success: false,
            error,
        })
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: &'static str,
}

#[derive(Serialize)]
struct SubscribeResponse {
    success: bool,
    message: &'static str,
}

/// `POST /api/newsletter`.
///
/// Accepts a signup and fans it out to the CRM, the subscriber store and the
/// welcome email, then fires the optional automation webhook. The three
/// integrations are independent of each other, so they run concurrently.
///
/// Downstream failures are logged but never fail the request: once the input
/// validates, the signup is accepted. Only a malformed request body produces
/// a 500, and a missing or `@`-less email a 400.
#[tracing::instrument(
    name = "Handling a newsletter signup",
    skip(body, pool, email_client, webhook_client)
)]
pub async fn subscribe(
    body: web::Bytes,
    pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    webhook_client: web::Data<WebhookClient>,
) -> Result<HttpResponse, SubscribeError> {
    let request: SubscribeRequest =
        serde_json::from_slice(&body).context("Failed to parse the request body")?;
    let new_subscriber: NewSubscriber =
        request.try_into().map_err(SubscribeError::ValidationError)?;

    let (crm, store, email) = tokio::join!(
        email_client.upsert_contact(&new_subscriber),
        upsert_subscriber(&new_subscriber, &pool),
        email_client.send_welcome_email(&new_subscriber.email, new_subscriber.name.as_deref()),
    );

    if let Err(e) = &crm {
        tracing::error!(error = %e, "Failed to upsert the contact in the CRM");
    }
    if let Err(e) = &store {
        tracing::error!(error = %e, "Failed to upsert the subscriber in the database");
    }
    if let Err(e) = &email {
        tracing::error!(error = %e, "Failed to send the welcome email");
    }

    let webhook = webhook_client.notify_signup(&new_subscriber).await;
    if let Err(e) = &webhook {
        tracing::error!(error = %e, "Failed to notify the signup webhook");
    }

    // The caller only sees "accepted"; which integrations actually succeeded
    // is observable server-side through this event.
    tracing::info!(
        subscriber_email = %new_subscriber.email,
        crm = crm.is_ok(),
        store = store.is_ok(),
        email = email.is_ok(),
        webhook = webhook.is_ok(),
        "Newsletter signup processed"
    );

    Ok(HttpResponse::Ok().json(SubscribeResponse {
        success: true,
        message: "Successfully subscribed to newsletter!",
    }))
}

/// Store-level upsert keyed on the email column: a repeat signup refreshes
/// name, source, tags and `updated_at` instead of inserting a second row.
#[tracing::instrument(
    name = "Upserting subscriber in the database",
    skip(new_subscriber, pool),
    fields(subscriber_email = %new_subscriber.email)
)]
async fn upsert_subscriber(
    new_subscriber: &NewSubscriber,
    pool: &PgPool,
) -> Result<(), sqlx::Error> {
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO subscribers (id, email, name, source, tags, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        ON CONFLICT (email) DO UPDATE
        SET name = EXCLUDED.name,
            source = EXCLUDED.source,
            tags = EXCLUDED.tags,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new_subscriber.email.as_ref())
    .bind(new_subscriber.name.as_deref())
    .bind(&new_subscriber.source)
    .bind(&new_subscriber.tags)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = ?e, "Failed to execute query");
        e
    })?;

    Ok(())
}
