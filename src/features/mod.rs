pub mod auth;
pub mod films;
pub mod geocoding;
pub mod map;
pub mod moderation;
pub mod profiles;
pub mod submission;
