mod profile;

pub use profile::{Profile, ProfilePatch};
