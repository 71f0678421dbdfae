use serde::Serialize;

use crate::features::films::models::Film;
use crate::features::profiles::Profile;

/// A film paired with its submitter's public profile for the detail view.
/// A missing or unreadable profile degrades to film-only.
#[derive(Debug, Clone, Serialize)]
pub struct FilmDetail {
    pub film: Film,
    pub submitter: Option<Profile>,
}
