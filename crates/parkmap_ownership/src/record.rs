use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const UNKNOWN_OWNER: &str = "Unknown";
pub const UNKNOWN_CONTACT: &str = "N/A";

/// Body of a successful ownership lookup. Every field is optional, the service omits what it does not know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

impl OwnershipRecord {
    pub fn owner_or_unknown(&self) -> &str {
        match self.owner.as_deref() {
            Some(owner) if !owner.is_empty() => owner,
            _ => UNKNOWN_OWNER,
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
pub enum LookupError {
    #[error("invalid ownership service url")]
    Url(#[from] url::ParseError),
    #[error("ownership service unreachable: {0}")]
    Transport(String),
    #[error("ownership service answered with status {0}")]
    Status(u16),
    #[error("ownership service sent an unreadable body")]
    Decode(#[source] std::io::Error),
    #[error("lookup worker is gone")]
    WorkerGone,
}
