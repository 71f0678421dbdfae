mod film_repository;

pub use film_repository::{FilmRepository, FILMS_TABLE};
