use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::AuthState;
use crate::features::films::Film;
use crate::features::geocoding::GeocodingService;
use crate::shared::geo::LngLat;

use super::backoff::{next_delay, BackoffConfig};
use super::widget::{MapClick, MapWidget};

pub const FILMS_SOURCE_ID: &str = "films";
pub const CLUSTERS_LAYER_ID: &str = "clusters";
pub const CLUSTER_COUNT_LAYER_ID: &str = "cluster-count";
pub const UNCLUSTERED_LAYER_ID: &str = "unclustered-point";

const LAYER_IDS: [&str; 3] = [CLUSTERS_LAYER_ID, CLUSTER_COUNT_LAYER_ID, UNCLUSTERED_LAYER_ID];

/// Points closer than this many pixels collapse into one cluster.
pub const CLUSTER_RADIUS: f64 = 50.0;
/// Beyond this zoom level every point renders individually.
pub const CLUSTER_MAX_ZOOM: f64 = 14.0;

/// World view over the Atlantic, roughly centered between the continents.
pub const DEFAULT_CENTER: LngLat = LngLat { lng: -40.0, lat: 20.0 };
pub const DEFAULT_ZOOM: f64 = 1.5;
/// City-level zoom used when jumping to a search result.
pub const SEARCH_JUMP_ZOOM: f64 = 12.0;

/// Readiness probes before a deferred update gives up. With the default
/// backoff this spans roughly half a minute of style loading.
const FLUSH_MAX_ATTEMPTS: u32 = 8;

/// Where the engine stands in the widget's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    /// Widget exists but its style assets are still loading; data writes
    /// are deferred.
    StyleLoading,
    Ready,
    Updating,
    /// Source or layers vanished (typically a style swap); they are
    /// recreated before the next write.
    LayersMissing,
    /// A deferred update exhausted its retries. Terminal.
    Failed,
}

/// What happened to a dataset handed to [`MapSyncEngine::apply_films`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Written to the widget.
    Applied,
    /// Style still loading; held until the next flush.
    Deferred,
    /// Nothing was pending.
    Idle,
}

/// Result of a location search driven through the map camera.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Camera is easing towards the best candidate.
    Jumped { place_name: String },
    /// The provider had no candidates; the camera did not move.
    NoResults,
}

/// What a hit-tested click resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Camera is easing into the cluster; nothing for the host to do.
    ClusterExpanded { center: LngLat, zoom: f64 },
    /// Open the detail view for this film.
    ShowDetail(Uuid),
    /// A provisional pin was placed and the confirmation affordance is
    /// showing; the suggested label comes from a reverse lookup.
    ScratchPlaced {
        coordinates: LngLat,
        suggested_location: String,
    },
    /// Read-only mode; the click changed nothing.
    Ignored,
}

/// A provisional submission location: pinned on the map but not yet part of
/// any film record. At most one exists per engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ScratchPin {
    pub coordinates: LngLat,
    /// Reverse-geocoded label offered as the draft's location field.
    pub suggested_location: String,
    /// True once the user has confirmed the spot and the submission form
    /// took over; the marker stays until the form closes.
    pub confirmed: bool,
}

struct PendingUpdate {
    generation: u64,
    data: Value,
}

/// Keeps the map widget's clustered film source in sync with the film list
/// and turns raw widget interactions into domain outcomes.
///
/// The engine is single-owner: every mutation goes through `&mut self`, so
/// dataset writes are serialized by construction. Updates that arrive while
/// the style is still loading are held as the single newest pending dataset;
/// an older deferred dataset is discarded the moment a newer one arrives, so
/// the widget can never regress to stale data.
pub struct MapSyncEngine<W: MapWidget> {
    widget: W,
    geocoding: Arc<GeocodingService>,
    backoff: BackoffConfig,
    state: EngineState,
    read_only: bool,
    scratch: Option<ScratchPin>,
    generation: u64,
    applied_generation: u64,
    pending: Option<PendingUpdate>,
}

impl<W: MapWidget> MapSyncEngine<W> {
    /// Engines start read-only; submissions unlock when a sign-in is
    /// observed via [`MapSyncEngine::apply_auth_state`].
    pub fn new(widget: W, geocoding: Arc<GeocodingService>) -> Self {
        Self {
            widget,
            geocoding,
            backoff: BackoffConfig::default(),
            state: EngineState::Uninitialized,
            read_only: true,
            scratch: None,
            generation: 0,
            applied_generation: 0,
            pending: None,
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn scratch(&self) -> Option<&ScratchPin> {
        self.scratch.as_ref()
    }

    /// Generation of the dataset currently on the widget.
    pub fn applied_generation(&self) -> u64 {
        self.applied_generation
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    #[cfg(test)]
    fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    /// Bind the engine to its widget. Creates the clustered source and its
    /// layers if the style is already loaded, otherwise leaves that to the
    /// first flush. Safe to call repeatedly.
    pub fn initialize(&mut self) -> Result<()> {
        if self.state == EngineState::Uninitialized {
            self.state = EngineState::Initializing;
        }
        if !self.widget.is_style_loaded() {
            self.state = EngineState::StyleLoading;
            return Ok(());
        }
        self.ensure_layers()?;
        self.state = EngineState::Ready;
        Ok(())
    }

    /// Replace the widget's dataset with the given films.
    ///
    /// Films without renderable coordinates are dropped here so the widget
    /// never sees them. If the style is still loading the dataset is held
    /// and a later [`MapSyncEngine::flush_deferred`] writes it; a newer
    /// dataset arriving first simply takes its place.
    pub fn apply_films(&mut self, films: &[Film]) -> Result<UpdateOutcome> {
        if self.state == EngineState::Failed {
            return Err(AppError::Internal(
                "Map synchronization engine has failed".to_string(),
            ));
        }

        self.generation += 1;
        let update = PendingUpdate {
            generation: self.generation,
            data: Self::project(films),
        };
        if let Some(stale) = self.pending.replace(update) {
            tracing::debug!(
                "Discarding deferred map update (generation {})",
                stale.generation
            );
        }

        if !self.widget.is_style_loaded() {
            self.state = EngineState::StyleLoading;
            tracing::debug!("Map style still loading, deferring data update");
            return Ok(UpdateOutcome::Deferred);
        }
        self.write_pending()
    }

    /// Write the newest deferred dataset once the widget reports its style
    /// loaded, sleeping on a capped backoff between probes. Exhausting the
    /// probes marks the engine failed.
    pub async fn flush_deferred(&mut self) -> Result<UpdateOutcome> {
        if self.state == EngineState::Failed {
            return Err(AppError::Internal(
                "Map synchronization engine has failed".to_string(),
            ));
        }
        if self.pending.is_none() {
            return Ok(UpdateOutcome::Idle);
        }

        let mut delay = self.backoff.initial_delay;
        let mut attempt = 0u32;
        while !self.widget.is_style_loaded() {
            attempt += 1;
            if attempt > FLUSH_MAX_ATTEMPTS {
                self.state = EngineState::Failed;
                tracing::error!(
                    "Map style never loaded after {} attempts, giving up",
                    FLUSH_MAX_ATTEMPTS
                );
                return Err(AppError::Internal(
                    "Map widget never became ready".to_string(),
                ));
            }
            self.state = EngineState::StyleLoading;
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Waiting for map style");
            tokio::time::sleep(delay).await;
            delay = next_delay(delay, &self.backoff);
        }
        self.write_pending()
    }

    fn write_pending(&mut self) -> Result<UpdateOutcome> {
        let Some(update) = self.pending.take() else {
            return Ok(UpdateOutcome::Idle);
        };
        debug_assert!(update.generation > self.applied_generation);

        self.ensure_layers()?;
        self.state = EngineState::Updating;
        self.widget.set_source_data(FILMS_SOURCE_ID, update.data)?;
        self.applied_generation = update.generation;
        self.state = EngineState::Ready;
        Ok(UpdateOutcome::Applied)
    }

    /// Create the source and layers that are missing. Style swaps silently
    /// drop both, so this runs before every write, not just at startup.
    fn ensure_layers(&mut self) -> Result<()> {
        let intact = self.widget.has_source(FILMS_SOURCE_ID)
            && LAYER_IDS.iter().all(|layer| self.widget.has_layer(layer));
        if intact {
            return Ok(());
        }

        if matches!(self.state, EngineState::Ready | EngineState::Updating) {
            tracing::warn!("Map source or layers missing, recreating them");
            self.state = EngineState::LayersMissing;
        }

        if !self.widget.has_source(FILMS_SOURCE_ID) {
            self.widget
                .add_cluster_source(FILMS_SOURCE_ID, CLUSTER_RADIUS, CLUSTER_MAX_ZOOM)?;
        }
        for layer in LAYER_IDS {
            if !self.widget.has_layer(layer) {
                self.widget.add_layer(layer, FILMS_SOURCE_ID)?;
            }
        }
        Ok(())
    }

    fn project(films: &[Film]) -> Value {
        let features: Vec<Value> = films
            .iter()
            .filter(|film| {
                let renderable = film.coordinates.is_renderable();
                if !renderable {
                    tracing::warn!("Film \"{}\" has no renderable coordinates", film.title);
                }
                renderable
            })
            .map(|film| {
                json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "Point",
                        "coordinates": [film.coordinates.lng, film.coordinates.lat],
                    },
                    "properties": {
                        "id": film.id,
                        "title": film.title,
                        "location": film.location,
                        "year": film.year,
                        "description": film.description,
                    },
                })
            })
            .collect();

        json!({"type": "FeatureCollection", "features": features})
    }

    /// Turn a hit-tested click into a domain outcome. Clusters zoom in,
    /// points open their detail, and empty spots start a submission unless
    /// the engine is read-only.
    pub async fn handle_click(&mut self, click: MapClick) -> Result<ClickOutcome> {
        match click {
            MapClick::Cluster { cluster_id, center } => {
                let zoom = self.widget.cluster_expansion_zoom(cluster_id)?;
                self.widget.ease_to(center, zoom);
                Ok(ClickOutcome::ClusterExpanded { center, zoom })
            }
            MapClick::Point { film_id } => Ok(ClickOutcome::ShowDetail(film_id)),
            MapClick::Empty { coordinates } => {
                if self.read_only {
                    return Ok(ClickOutcome::Ignored);
                }
                Ok(self.place_scratch(coordinates).await)
            }
        }
    }

    /// Pin a provisional submission spot, replacing any earlier pin. The
    /// marker and confirmation affordance show immediately; the suggested
    /// label arrives from the reverse lookup, which always produces
    /// something (coordinate fallback at worst).
    async fn place_scratch(&mut self, coordinates: LngLat) -> ClickOutcome {
        self.clear_scratch();
        self.widget.place_marker(coordinates);
        self.widget.show_confirmation_popup(coordinates);

        let place = self.geocoding.reverse_geocode(coordinates).await;
        self.scratch = Some(ScratchPin {
            coordinates,
            suggested_location: place.place_name.clone(),
            confirmed: false,
        });

        ClickOutcome::ScratchPlaced {
            coordinates,
            suggested_location: place.place_name,
        }
    }

    /// Confirm the pending pin: the popup goes away, the marker stays, and
    /// the returned pin seeds the submission draft.
    pub fn confirm_scratch(&mut self) -> Result<ScratchPin> {
        let Some(pin) = self.scratch.as_mut() else {
            return Err(AppError::BadRequest("No location is selected".to_string()));
        };
        pin.confirmed = true;
        self.widget.remove_popup();
        Ok(pin.clone())
    }

    /// Drop the pin and everything it put on the map. Called when the
    /// confirmation popup is closed unanswered, when a submission finishes,
    /// or when the engine turns read-only.
    pub fn dismiss_scratch(&mut self) {
        self.clear_scratch();
    }

    fn clear_scratch(&mut self) {
        if self.scratch.take().is_some() {
            self.widget.remove_marker();
            self.widget.remove_popup();
        }
    }

    /// Signed-out viewers browse; they do not submit.
    pub fn apply_auth_state(&mut self, auth: &AuthState) {
        self.set_read_only(matches!(auth, AuthState::SignedOut));
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
        if read_only {
            self.clear_scratch();
        }
    }

    /// Ease the camera to the best candidate for a free-text query. The
    /// camera stays put when the provider has nothing.
    pub async fn search_jump(&mut self, query: &str) -> Result<SearchOutcome> {
        let candidates = self.geocoding.forward_geocode(query).await?;
        match candidates.into_iter().next() {
            Some(place) => {
                let center = LngLat::new(place.center[0], place.center[1]);
                self.widget.ease_to(center, SEARCH_JUMP_ZOOM);
                Ok(SearchOutcome::Jumped {
                    place_name: place.place_name,
                })
            }
            None => Ok(SearchOutcome::NoResults),
        }
    }
}
