//! Map synchronization: keeps the embedded map widget's clustered film
//! source in step with the film list and turns widget interactions into
//! domain outcomes.
//!
//! The widget itself is behind the [`MapWidget`] trait; the embedding shell
//! binds the real view. Everything stateful lives in [`MapSyncEngine`].

pub mod backoff;
pub mod engine;
pub mod widget;

pub use backoff::{next_delay, BackoffConfig};
pub use engine::{
    ClickOutcome, EngineState, MapSyncEngine, ScratchPin, SearchOutcome, UpdateOutcome,
    CLUSTERS_LAYER_ID, CLUSTER_COUNT_LAYER_ID, CLUSTER_MAX_ZOOM, CLUSTER_RADIUS, DEFAULT_CENTER,
    DEFAULT_ZOOM, FILMS_SOURCE_ID, SEARCH_JUMP_ZOOM, UNCLUSTERED_LAYER_ID,
};
pub use widget::{MapClick, MapWidget};
