use serde::Deserialize;

/// A downloadable resource delivered by email in exchange for a signup.
#[derive(Clone, Debug, Deserialize)]
pub struct LeadMagnet {
    pub name: String,
    pub description: String,
    pub file_url: String,
}
