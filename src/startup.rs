use crate::{
    configuration::{DatabaseSettings, Settings},
    routes,
    webhook::WebhookClient,
    EmailClient,
};

use std::net::TcpListener;

use {
    actix_web::{dev::Server, web, App, HttpServer},
    sqlx::{postgres::PgPoolOptions, PgPool},
    tracing_actix_web::TracingLogger,
};

/// The configured application, bound to its port but not yet running.
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let pool = get_connection_pool(&configuration.database);

        let email_client = EmailClient::new(
            configuration.email_client,
            configuration.application.site_name.clone(),
            configuration.application.site_url.clone(),
        )
        .map_err(|e| anyhow::anyhow!("Failed to build the email client: {}", e))?;

        let webhook_client = WebhookClient::new(configuration.webhook)
            .map_err(|e| anyhow::anyhow!("Failed to build the webhook client: {}", e))?;

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let server = run(listener, pool, email_client, webhook_client)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// Lazy pool: connections are only established on first use, so the server
/// can boot (and serve `/health_check`) before the database is reachable.
pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new().connect_lazy_with(configuration.connect_options())
}

pub fn run(
    listener: TcpListener,
    pool: PgPool,
    email_client: EmailClient,
    webhook_client: WebhookClient,
) -> Result<Server, std::io::Error> {
    let pool = web::Data::new(pool);
    let email_client = web::Data::new(email_client);
    let webhook_client = web::Data::new(webhook_client);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(routes::health_check))
            .route("/api/newsletter", web::post().to(routes::subscribe))
            .app_data(pool.clone())
            .app_data(email_client.clone())
            .app_data(webhook_client.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
