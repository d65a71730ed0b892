//! Request handlers for the generator pages.

use axum::{extract::State, http::StatusCode, response::Html, Form};
use serde::Deserialize;
use tracing::{info, warn};

use super::gate::whole_seconds;
use super::pages::{
    render_plus, render_simple, PlusPage, SimplePage, PLUS_DEFAULT_STEPS, PLUS_FAILURE_MESSAGE,
    PLUS_IMAGES, PLUS_STEPS, SIMPLE_DEFAULT_STEPS, SIMPLE_STEPS,
};
use super::AppState;
use crate::error::PixPromptError;
use crate::image::GenerationRequest;

type PageResponse = (StatusCode, Html<String>);

/// Form posted by the simple page.
///
/// Numeric fields arrive as raw text so a cleared or garbled input still
/// reaches validation and gets the page back.
#[derive(Debug, Deserialize)]
pub struct SimpleForm {
    /// Prompt text.
    #[serde(default)]
    pub prompt: String,
    /// Steps slider value.
    #[serde(default)]
    pub steps: Option<String>,
}

/// Form posted by the plus page.
#[derive(Debug, Deserialize)]
pub struct PlusForm {
    /// Prompt text.
    #[serde(default)]
    pub prompt: String,
    /// Steps input value.
    #[serde(default)]
    pub steps: Option<String>,
    /// Number of images input value.
    #[serde(default)]
    pub num_images: Option<String>,
}

/// Maps a generation failure to the page's HTTP status.
pub fn status_for(err: &PixPromptError) -> StatusCode {
    match err {
        PixPromptError::RateLimited { .. }
        | PixPromptError::Busy
        | PixPromptError::CoolingDown(_) => StatusCode::TOO_MANY_REQUESTS,
        PixPromptError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn range_message(name: &str, (min, max): (u32, u32)) -> String {
    format!("{name} must be between {min} and {max}.")
}

fn check_range(name: &str, value: u32, range: (u32, u32)) -> Result<(), String> {
    if value < range.0 || value > range.1 {
        return Err(range_message(name, range));
    }
    Ok(())
}

/// Reads a numeric field, using `default` when the field was not sent.
///
/// Returns the value to show on the page, clamped into `range`, and the
/// validation message when the input was unusable.
fn number_field(
    name: &str,
    raw: Option<&str>,
    default: u32,
    range: (u32, u32),
) -> (u32, Option<String>) {
    let Some(raw) = raw else {
        return (default, None);
    };
    match raw.trim().parse::<u32>() {
        Ok(value) => match check_range(name, value, range) {
            Ok(()) => (value, None),
            Err(message) => (value.clamp(range.0, range.1), Some(message)),
        },
        Err(_) => (default, Some(range_message(name, range))),
    }
}

fn check_prompt(prompt: &str) -> Result<(), String> {
    if prompt.trim().is_empty() {
        return Err("Please enter a prompt.".to_string());
    }
    Ok(())
}

/// GET / - the simple generator.
pub async fn simple_page(State(state): State<AppState>) -> PageResponse {
    let page = SimplePage {
        cooldown_secs: state.gate.cooldown_remaining().map_or(0, whole_seconds),
        ..SimplePage::initial()
    };
    (StatusCode::OK, Html(render_simple(&page)))
}

/// POST / - generate one image, then start the cooldown.
pub async fn simple_submit(
    State(state): State<AppState>,
    Form(form): Form<SimpleForm>,
) -> PageResponse {
    let (steps, steps_error) = number_field(
        "Steps",
        form.steps.as_deref(),
        SIMPLE_DEFAULT_STEPS,
        SIMPLE_STEPS,
    );
    let mut page = SimplePage {
        prompt: form.prompt,
        steps,
        ..SimplePage::default()
    };

    if let Some(message) = check_prompt(&page.prompt).err().or(steps_error) {
        warn!(steps = ?form.steps, "simple page validation failed: {}", message);
        page.error = Some(message);
        return (StatusCode::BAD_REQUEST, Html(render_simple(&page)));
    }

    let permit = match state.gate.try_begin(true) {
        Ok(permit) => permit,
        Err(e) => {
            page.cooldown_secs = e.retry_after().map_or(0, whole_seconds);
            page.error = Some(e.to_string());
            return (status_for(&e), Html(render_simple(&page)));
        }
    };

    let request = GenerationRequest::new(page.prompt.clone()).with_steps(page.steps);
    let result = state.provider.generate(&request).await;

    let hint = result.as_ref().err().and_then(PixPromptError::retry_after);
    let cooldown = state.gate.start_cooldown(hint);
    drop(permit);
    page.cooldown_secs = whole_seconds(cooldown);

    match result {
        Ok(image) => {
            info!(
                steps = page.steps,
                bytes = image.size(),
                duration_ms = image.metadata.duration_ms,
                "simple page image generated"
            );
            page.image = Some(image.to_data_url());
            (StatusCode::OK, Html(render_simple(&page)))
        }
        Err(e) => {
            warn!(error = %e, "simple page generation failed");
            page.error = Some(e.to_string());
            (status_for(&e), Html(render_simple(&page)))
        }
    }
}

/// GET /generate - the plus generator.
pub async fn plus_page() -> PageResponse {
    (StatusCode::OK, Html(render_plus(&PlusPage::initial())))
}

/// POST /generate - generate up to four images.
pub async fn plus_submit(
    State(state): State<AppState>,
    Form(form): Form<PlusForm>,
) -> PageResponse {
    let (steps, steps_error) =
        number_field("Steps", form.steps.as_deref(), PLUS_DEFAULT_STEPS, PLUS_STEPS);
    let (num_images, images_error) = number_field(
        "Number of images",
        form.num_images.as_deref(),
        PLUS_IMAGES.0,
        PLUS_IMAGES,
    );
    let mut page = PlusPage {
        prompt: form.prompt,
        steps,
        num_images,
        ..PlusPage::default()
    };

    if let Some(message) = check_prompt(&page.prompt)
        .err()
        .or(steps_error)
        .or(images_error)
    {
        warn!(
            steps = ?form.steps,
            num_images = ?form.num_images,
            "plus page validation failed: {}",
            message
        );
        page.error = Some(message);
        return (StatusCode::BAD_REQUEST, Html(render_plus(&page)));
    }

    let permit = match state.gate.try_begin(false) {
        Ok(permit) => permit,
        Err(e) => {
            page.error = Some(e.to_string());
            return (status_for(&e), Html(render_plus(&page)));
        }
    };

    let request = GenerationRequest::new(page.prompt.clone())
        .with_steps(page.steps)
        .with_count(page.num_images);
    let result = state.provider.generate_batch(&request).await;
    drop(permit);

    match result {
        Ok(images) => {
            info!(
                steps = page.steps,
                count = images.len(),
                "plus page images generated"
            );
            page.images = images.iter().map(|image| image.to_data_url()).collect();
            (StatusCode::OK, Html(render_plus(&page)))
        }
        Err(e) => {
            warn!(error = %e, "plus page generation failed");
            page.error = Some(PLUS_FAILURE_MESSAGE.to_string());
            (status_for(&e), Html(render_plus(&page)))
        }
    }
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}
