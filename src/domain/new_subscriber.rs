use crate::domain::SubscriberEmail;

/// A validated signup, ready to be fanned out to the CRM, the subscriber
/// store and the welcome email.
#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    /// Free-form display name; the original forms never constrained it
    pub name: Option<String>,
    /// Which form or page produced the signup
    pub source: String,
    pub tags: Vec<String>,
}

impl NewSubscriber {
    /// Split the display name on the first whitespace into the CRM's
    /// FIRSTNAME/LASTNAME attributes.
    pub fn first_last_name(&self) -> (Option<&str>, Option<&str>) {
        match self.name.as_deref() {
            None => (None, None),
            Some(name) => match name.split_once(char::is_whitespace) {
                Some((first, last)) => (Some(first), Some(last)),
                None => (Some(name), None),
            },
        }
    }
}
