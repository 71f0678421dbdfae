//! Film records: the community-submitted points that end up on the map.
//!
//! Rows live in the remote record store; stills live in the asset store.
//! Everything the rest of the crate does with a film goes through
//! [`FilmRepository`].

pub mod models;
pub mod services;

pub use models::{normalize_year, validate_year, Film, FilmDetail, FilmDraft, FilmPatch, FilmStatus};
pub use services::{FilmRepository, FILMS_TABLE};
