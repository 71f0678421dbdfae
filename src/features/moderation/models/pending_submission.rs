use serde::{Deserialize, Serialize};

use crate::features::films::Film;

/// Submitter details shown alongside a queued film.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submitter {
    pub username: Option<String>,
    pub full_name: Option<String>,
}

/// A film awaiting review, with its submitter when the store can join one.
#[derive(Debug, Clone, Serialize)]
pub struct PendingSubmission {
    pub film: Film,
    pub submitter: Option<Submitter>,
}
