/// Earliest plausible film year (first public film screening).
pub const MIN_FILM_YEAR: i32 = 1895;

/// Maximum accepted image upload size in bytes (5MB).
pub const MAX_IMAGE_SIZE_BYTES: usize = 5 * 1024 * 1024;

/// Default rejection reason stored when a moderator supplies none.
pub const DEFAULT_REJECTION_REASON: &str = "No reason provided";
