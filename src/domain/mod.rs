mod lead_magnet;
mod new_subscriber;
mod subscriber_email;

pub use {
    lead_magnet::LeadMagnet, new_subscriber::NewSubscriber, subscriber_email::SubscriberEmail,
};
