pub mod events;
pub mod model;
pub mod session;

pub use events::{AuthEvents, AuthState};
pub use model::Session;
pub use session::{IdentityClient, SessionProvider};
