use {
    aitoolshub::{
        configuration::{get_configuration, DatabaseSettings},
        startup::{get_connection_pool, Application},
        telemetry::{get_subscriber, init_subscriber},
    },
    once_cell::sync::Lazy,
    secrecy::Secret,
    sqlx::{Connection, Executor, PgConnection, PgPool},
    uuid::Uuid,
    wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    },
};

// Run with `TEST_LOG=true cargo test | bunyan` to see the service's output.
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    /// Stands in for the Brevo API (both `/contacts` and `/smtp/email`)
    pub brevo_server: MockServer,
    /// Present only for apps spawned with a configured webhook URL
    pub webhook_server: Option<MockServer>,
}

impl TestApp {
    pub async fn post_newsletter(&self, body: serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/api/newsletter", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Send a raw (possibly malformed) body with a JSON content type.
    pub async fn post_newsletter_raw(&self, body: String) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/api/newsletter", self.address))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Accept every Brevo call with a happy-path response; for tests that
    /// don't inspect the outbound requests.
    pub async fn mount_permissive_brevo_mocks(&self) {
        Mock::given(path("/contacts"))
            .and(method("POST"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": 1 })),
            )
            .mount(&self.brevo_server)
            .await;
        Mock::given(path("/smtp/email"))
            .and(method("POST"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({ "messageId": "x" })),
            )
            .mount(&self.brevo_server)
            .await;
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_inner(false).await
}

pub async fn spawn_app_with_webhook() -> TestApp {
    spawn_app_inner(true).await
}

async fn spawn_app_inner(with_webhook: bool) -> TestApp {
    Lazy::force(&TRACING);

    let brevo_server = MockServer::start().await;
    let webhook_server = if with_webhook {
        Some(MockServer::start().await)
    } else {
        None
    };

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration");
        // A fresh database per test keeps them independent
        c.database.database_name = Uuid::new_v4().to_string();
        // Port 0 makes the OS hand out a random free port
        c.application.port = 0;
        c.email_client.base_url = brevo_server.uri();
        c.email_client.api_key = Some(Secret::new("test-api-key".to_string()));
        c.email_client.list_id = Some(3);
        c.webhook.url = webhook_server.as_ref().map(|s| s.uri());
        c
    };

    configure_database(&configuration.database).await;

    let application = Application::build(configuration.clone())
        .await
        .expect("Failed to build application");
    let address = format!("http://127.0.0.1:{}", application.port());
    let db_pool = get_connection_pool(&configuration.database);

    tokio::spawn(application.run_until_stopped());

    TestApp {
        address,
        db_pool,
        brevo_server,
        webhook_server,
    }
}

async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect_with(&config.connect_options_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.database_name).as_str())
        .await
        .expect("Failed to create database");

    let connection_pool = PgPool::connect_with(config.connect_options())
        .await
        .expect("Failed to connect to Postgres");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database");

    connection_pool
}
