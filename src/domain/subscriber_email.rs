use serde::Deserialize;

/// The email address of a (prospective) subscriber.
///
/// The only structural requirement is the presence of an `@`. Anything
/// stricter would reject addresses that the CRM and the mail provider accept,
/// so their validation is treated as authoritative.
#[derive(Clone, Debug, Deserialize)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(s: String) -> Result<Self, String> {
        if s.contains('@') {
            Ok(Self(s))
        } else {
            Err(format!("'{}' is not a valid subscriber email", s))
        }
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
