pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod webhook;

pub use {
    configuration::get_configuration,
    email_client::EmailClient,
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
    webhook::WebhookClient,
};
