use serde_json::Value;
use uuid::Uuid;

use crate::core::error::Result;
use crate::shared::geo::LngLat;

/// Surface the sync engine drives on the embedded map view.
///
/// The engine never talks to a concrete map library; the embedding shell
/// binds the real widget and tests bind a scripted fake. Probes are cheap
/// and may be polled repeatedly while the style is still loading.
pub trait MapWidget: Send {
    /// Whether the style assets have finished loading. The widget rejects
    /// source and layer mutations until this reports true.
    fn is_style_loaded(&self) -> bool;

    fn has_source(&self, source_id: &str) -> bool;

    /// Create a clustered GeoJSON source with an empty dataset.
    fn add_cluster_source(
        &mut self,
        source_id: &str,
        cluster_radius: f64,
        cluster_max_zoom: f64,
    ) -> Result<()>;

    fn has_layer(&self, layer_id: &str) -> bool;

    fn add_layer(&mut self, layer_id: &str, source_id: &str) -> Result<()>;

    /// Replace the source's dataset wholesale with a GeoJSON feature
    /// collection.
    fn set_source_data(&mut self, source_id: &str, data: Value) -> Result<()>;

    /// Animate the camera towards a center and zoom level.
    fn ease_to(&mut self, center: LngLat, zoom: f64);

    /// Zoom level at which the given cluster breaks apart into its members.
    fn cluster_expansion_zoom(&mut self, cluster_id: u64) -> Result<f64>;

    /// Drop a provisional marker for a not-yet-confirmed submission spot.
    /// At most one such marker exists at a time.
    fn place_marker(&mut self, at: LngLat);

    fn remove_marker(&mut self);

    /// Show the "add a film here?" confirmation affordance next to the
    /// provisional marker.
    fn show_confirmation_popup(&mut self, at: LngLat);

    fn remove_popup(&mut self);
}

/// A pointer interaction, already hit-tested by the widget.
///
/// The widget resolves which rendered feature (if any) sits under the
/// pointer; the engine only decides what the hit means.
#[derive(Debug, Clone, PartialEq)]
pub enum MapClick {
    /// A cluster circle was hit.
    Cluster { cluster_id: u64, center: LngLat },
    /// An individual film point was hit.
    Point { film_id: Uuid },
    /// No film feature under the pointer.
    Empty { coordinates: LngLat },
}
