pub mod models;
pub mod services;

pub use models::{Profile, ProfilePatch};
pub use services::ProfileService;
