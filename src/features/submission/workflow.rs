use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::SessionProvider;
use crate::features::films::{normalize_year, validate_year, Film, FilmDraft, FilmRepository};
use crate::features::map::ScratchPin;
use crate::shared::constants::MAX_IMAGE_SIZE_BYTES;

const SUBMITTED_MESSAGE: &str =
    "Film added successfully! It will be visible to others after review.";

/// Raw form fields as the user typed them. Normalization happens at
/// submit time, not while editing.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub title: String,
    pub director: String,
    pub location: String,
    pub year: String,
    pub description: String,
    pub image: Option<ImageAttachment>,
}

/// An image picked for upload, held in memory until commit.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Drives one film submission from a confirmed map location to a pending
/// record in the store.
///
/// The workflow owns the draft state between user edits and the commit; the
/// map engine owns the pin itself and hands over a [`ScratchPin`] once the
/// user confirms the spot. Every outcome, success or failure, lands in
/// [`SubmissionWorkflow::message`] so no attempt resolves silently.
pub struct SubmissionWorkflow {
    sessions: Arc<dyn SessionProvider>,
    films: FilmRepository,
    form: SubmissionForm,
    location: Option<ScratchPin>,
    busy: bool,
    message: Option<String>,
}

impl SubmissionWorkflow {
    pub fn new(sessions: Arc<dyn SessionProvider>, films: FilmRepository) -> Self {
        Self {
            sessions,
            films,
            form: SubmissionForm::default(),
            location: None,
            busy: false,
            message: None,
        }
    }

    pub fn form(&self) -> &SubmissionForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut SubmissionForm {
        &mut self.form
    }

    pub fn location(&self) -> Option<&ScratchPin> {
        self.location.as_ref()
    }

    /// True while a submit call is in flight.
    pub fn busy(&self) -> bool {
        self.busy
    }

    /// Outcome of the last user-visible action, success or failure.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Take over a confirmed map pin. The suggested label prefills the
    /// location field unless the user already typed one.
    pub fn set_location(&mut self, pin: ScratchPin) {
        if self.form.location.trim().is_empty() {
            self.form.location = pin.suggested_location.clone();
        }
        self.location = Some(pin);
    }

    /// Forget the confirmed location, e.g. when its pin was dismissed.
    pub fn clear_location(&mut self) {
        self.location = None;
    }

    /// Validate and hold an image for the eventual commit. Rejections keep
    /// any previously attached image.
    pub fn attach_image(&mut self, attachment: ImageAttachment) -> Result<()> {
        if !attachment.content_type.starts_with("image/") {
            let message = "Please select an image file (jpg, png, etc.)";
            self.message = Some(message.to_string());
            return Err(AppError::Validation(message.to_string()));
        }
        if attachment.bytes.len() > MAX_IMAGE_SIZE_BYTES {
            let message = "File size exceeds 5MB. Please choose a smaller image.";
            self.message = Some(message.to_string());
            return Err(AppError::Validation(message.to_string()));
        }
        self.form.image = Some(attachment);
        Ok(())
    }

    pub fn remove_image(&mut self) {
        self.form.image = None;
    }

    /// Clear the whole draft, e.g. after the map turned read-only.
    pub fn reset(&mut self) {
        self.form = SubmissionForm::default();
        self.location = None;
        self.message = None;
    }

    /// Commit the draft as a pending film.
    ///
    /// Local checks run first and fail without touching the network:
    /// confirmed location, signed-in user, non-empty title, plausible year.
    /// The session is then re-validated for freshness right before the
    /// writes, since the form may have sat open past its expiry. On success
    /// the draft resets and the returned record carries the client-known
    /// coordinates, whatever echo the store produced.
    pub async fn submit(&mut self) -> Result<Film> {
        self.busy = true;
        let result = self.run_submit().await;
        self.busy = false;
        result
    }

    async fn run_submit(&mut self) -> Result<Film> {
        let Some(pin) = self.location.clone() else {
            let message = "Please select a location on the map first";
            self.message = Some(message.to_string());
            return Err(AppError::Validation(message.to_string()));
        };

        if self.sessions.current_session().await?.is_none() {
            let message = "You must be logged in to add a film";
            self.message = Some(message.to_string());
            return Err(AppError::Auth(message.to_string()));
        }

        let title = self.form.title.trim().to_string();
        if title.is_empty() {
            let message = "Film title is required";
            self.message = Some(message.to_string());
            return Err(AppError::Validation(message.to_string()));
        }

        let year = normalize_year(&self.form.year);
        if let Err(e) = validate_year(year) {
            self.message = Some(match &e {
                AppError::Validation(text) => text.clone(),
                other => other.user_message(),
            });
            return Err(e);
        }

        let session = match self.sessions.current_session().await? {
            Some(session) if !session.is_expired() => session,
            _ => {
                let message = "Your session may have expired. Please sign out and sign in again.";
                self.message = Some(message.to_string());
                return Err(AppError::Auth(message.to_string()));
            }
        };

        let image_url = match self.form.image.clone() {
            Some(attachment) => {
                let uploaded = self
                    .films
                    .upload_image(
                        &attachment.filename,
                        &attachment.content_type,
                        attachment.bytes,
                    )
                    .await;
                match uploaded {
                    Ok(url) => Some(url),
                    Err(e) => {
                        self.message = Some(e.user_message());
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        let draft = FilmDraft {
            title,
            director: non_empty(&self.form.director),
            location: non_empty(&self.form.location)
                .unwrap_or_else(|| pin.suggested_location.clone()),
            year,
            description: Some(
                non_empty(&self.form.description)
                    .unwrap_or_else(|| "No description provided".to_string()),
            ),
            coordinates: pin.coordinates,
            image_url,
            user_id: session.user_id,
        };

        let mut film = match self.films.create(draft).await {
            Ok(film) => film,
            Err(e) => {
                self.message = Some(e.user_message());
                return Err(e);
            }
        };

        // The store may echo the geometry in a form we cannot parse; the
        // client knows the exact pair it submitted.
        film.coordinates = pin.coordinates;

        tracing::info!("Film \"{}\" submitted for review", film.title);
        self.form = SubmissionForm::default();
        self.location = None;
        self.message = Some(SUBMITTED_MESSAGE.to_string());
        Ok(film)
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
