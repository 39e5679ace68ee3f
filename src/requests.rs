use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::{self, Json};
use rocket::serde::{Deserialize, Serialize};
use rocket::{catch, get, post, Request, State};

use crate::database::{Score, ScoreRecord, ScoreStore, ScoreSubmission, StoreError};

/// Name reported when there is no high score to show.
pub const PLACEHOLDER_NAME: &str = "None";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

/// Response of the high score query: either a stored record
/// or a zero placeholder when none is available.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", untagged)]
pub enum HighScore {
    Record(ScoreRecord),
    Placeholder { name: String, score: Score },
}

impl HighScore {
    pub fn placeholder() -> Self {
        Self::Placeholder {
            name: PLACEHOLDER_NAME.to_owned(),
            score: Score::default(),
        }
    }
}

pub type ApiResult<T> = Result<status::Custom<Json<T>>, status::Custom<Json<ErrorBody>>>;

fn log_store_error(context: &str, error: &StoreError) {
    if error.is_connection_loss() {
        log::warn!("Lost connection to the score database");
    }
    if error.is_persistence() {
        log::error!("Error {}: {}", context, error);
    } else {
        log::warn!("Rejected {}: {}", context, error);
    }
}

#[get("/")]
pub async fn index(store: &State<ScoreStore>) -> String {
    let database = if store.is_connected().await {
        "connected"
    } else {
        "disconnected"
    };
    format!("This is a high score server! Database: {}", database)
}

/// Fetches the current high score.
/// Never fails: an empty or unreachable store yields the placeholder.
#[get("/api/highscore")]
pub async fn get_high_score(store: &State<ScoreStore>) -> Json<HighScore> {
    match store.highest().await {
        Ok(Some(record)) => {
            log::info!("High score: {} by {:?}", record.score, record.name);
            Json(HighScore::Record(record))
        }
        Ok(None) => Json(HighScore::placeholder()),
        Err(error) => {
            log_store_error("high score query", &error);
            Json(HighScore::placeholder())
        }
    }
}

/// Stores a new score and returns the created record.
/// Any failure, including an unreachable store, is reported as a bad request.
#[post("/api/score", data = "<submission>")]
pub async fn submit_score(
    submission: Result<Json<ScoreSubmission>, json::Error<'_>>,
    store: &State<ScoreStore>,
) -> ApiResult<ScoreRecord> {
    let submission = match submission {
        Ok(submission) => submission.into_inner(),
        Err(error) => {
            let message = match error {
                json::Error::Io(error) => error.to_string(),
                json::Error::Parse(_, error) => error.to_string(),
            };
            log::error!("Error submitting score: malformed body: {}", message);
            return Err(status::Custom(Status::BadRequest, Json(ErrorBody::new(message))));
        }
    };

    log::info!(
        "Received score: name = {:?}, score = {:?}",
        submission.name,
        submission.score
    );

    match store.insert(submission).await {
        Ok(record) => Ok(status::Custom(Status::Created, Json(record))),
        Err(error) => {
            log_store_error("score submission", &error);
            Err(status::Custom(Status::BadRequest, Json(ErrorBody::new(&error))))
        }
    }
}

#[catch(default)]
pub fn default_catcher(code: Status, _request: &Request<'_>) -> status::Custom<Json<ErrorBody>> {
    let reason = code.reason().unwrap_or("unknown error");
    status::Custom(code, Json(ErrorBody::new(reason)))
}
