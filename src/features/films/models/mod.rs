mod film;
mod film_detail;

pub use film::{normalize_year, validate_year, Film, FilmDraft, FilmPatch, FilmStatus};
pub use film_detail::FilmDetail;
