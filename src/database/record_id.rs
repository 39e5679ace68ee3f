use rand::distributions::{Alphanumeric, DistString};
use rand::thread_rng;
use rocket::serde::{Deserialize, Serialize};

const RECORD_ID_LENGTH: usize = 24;

/// Server-assigned identifier of a stored score.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn generate() -> Self {
        Self(Alphanumeric.sample_string(&mut thread_rng(), RECORD_ID_LENGTH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
