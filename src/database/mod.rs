mod record_id;
mod score;
mod store;
mod store_error;

pub use record_id::RecordId;
pub use score::{Score, ScoreRecord, ScoreSubmission};
pub use store::ScoreStore;
pub use store_error::*;

pub type DatabasePool = sqlx::AnyPool;
