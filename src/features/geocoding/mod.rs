//! Geocoding proxy feature.
//!
//! Keeps the provider access token server-side: map clients call the proxy
//! with a single `query` parameter and get back the provider's wire shape.
//! A query that parses as a `lat,lng` pair is treated as a reverse lookup;
//! anything else is a free-text forward search.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/geocode?query=Paris` | Forward search, up to 5 candidates |
//! | GET | `/api/geocode?query=48.85,2.35` | Reverse lookup, single candidate |

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use services::GeocodingService;
