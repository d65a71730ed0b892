//! Route tests for the generator pages, using an in-process provider.
#![cfg(feature = "web")]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pixprompt::web::{create_app, AppState};
use pixprompt::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat, ImageProvider,
    PixPromptError, Result,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::util::ServiceExt;

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    RateLimited,
    Invalid,
    Hang,
}

/// Records requests and answers according to `behavior`.
struct FakeProvider {
    behavior: Behavior,
    calls: AtomicU32,
    last: Mutex<Option<GenerationRequest>>,
}

impl FakeProvider {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicU32::new(0),
            last: Mutex::new(None),
        })
    }
}

#[async_trait]
impl ImageProvider for FakeProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request.clone());
        match self.behavior {
            Behavior::Succeed => Ok(GeneratedImage::new(
                vec![1, 2, 3],
                ImageFormat::Png,
                GenerationMetadata::default(),
            )),
            Behavior::RateLimited => Err(PixPromptError::RateLimited { retry_after: None }),
            Behavior::Invalid => Err(PixPromptError::InvalidResponse("no data".into())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(PixPromptError::InvalidResponse("late".into()))
            }
        }
    }

    fn name(&self) -> &str {
        "fake"
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

fn app(provider: Arc<FakeProvider>, cooldown: Duration) -> (Router, AppState) {
    let state = AppState::with_cooldown(provider, cooldown);
    (create_app(state.clone()), state)
}

fn post(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_pages_are_registered() {
    let (app, _) = app(FakeProvider::new(Behavior::Succeed), Duration::ZERO);

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("🎨 AI Image Generator"));

    let (status, body) = send(&app, get("/generate")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Generate an Image with AI"));

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _) = send(&app, get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_simple_success_renders_image_and_cooldown() {
    let provider = FakeProvider::new(Behavior::Succeed);
    let (app, _) = app(provider.clone(), Duration::from_secs(8));

    let (status, body) = send(&app, post("/", "prompt=a+cute+cat&steps=2")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<img src=\"data:image/png;base64,AQID\""));
    assert!(body.contains("⏳ Wait 8s"));
    assert!(body.contains("value=\"a cute cat\""));

    let last = provider.last.lock().unwrap().clone().unwrap();
    assert_eq!(last.prompt, "a cute cat");
    assert_eq!(last.steps, 2);
    assert_eq!(last.count, 1);
}

#[tokio::test]
async fn test_simple_cooldown_rejects_second_submission() {
    let provider = FakeProvider::new(Behavior::Succeed);
    let (app, _) = app(provider.clone(), Duration::from_secs(8));

    let (status, _) = send(&app, post("/", "prompt=cat&steps=1")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post("/", "prompt=cat&steps=1")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body.contains("before generating again"));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    // A fresh GET still shows the countdown.
    let (_, body) = send(&app, get("/")).await;
    assert!(body.contains("⏳ Wait"));
}

#[tokio::test]
async fn test_simple_rate_limit_message() {
    let (app, _) = app(FakeProvider::new(Behavior::RateLimited), Duration::ZERO);

    let (status, body) = send(&app, post("/", "prompt=cat&steps=1")).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body.contains(
        "<p class=\"error\">Rate limit exceeded. Please try again in a few seconds.</p>"
    ));
}

#[tokio::test]
async fn test_simple_invalid_response_message() {
    let (app, _) = app(FakeProvider::new(Behavior::Invalid), Duration::ZERO);

    let (status, body) = send(&app, post("/", "prompt=cat&steps=1")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("<p class=\"error\">Invalid response format</p>"));
}

#[tokio::test]
async fn test_simple_validation() {
    let provider = FakeProvider::new(Behavior::Succeed);
    let (app, _) = app(provider.clone(), Duration::ZERO);

    let (status, body) = send(&app, post("/", "prompt=cat&steps=9")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Steps must be between 1 and 4."));

    let (status, body) = send(&app, post("/", "prompt=+++&steps=1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Please enter a prompt."));

    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_simple_unparseable_steps_rerenders_page() {
    let provider = FakeProvider::new(Behavior::Succeed);
    let (app, _) = app(provider.clone(), Duration::ZERO);

    for form in ["prompt=cat&steps=", "prompt=cat&steps=-1", "prompt=cat&steps=abc"] {
        let (status, body) = send(&app, post("/", form)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "status for {form}");
        assert!(body.contains("<html"), "page for {form}");
        assert!(body.contains("Steps must be between 1 and 4."));
        assert!(body.contains("value=\"cat\""));
    }

    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_prompt_is_escaped() {
    let (app, _) = app(FakeProvider::new(Behavior::Succeed), Duration::ZERO);

    let (_, body) = send(&app, post("/", "prompt=%3Cscript%3Ealert(1)%3C%2Fscript%3E&steps=1")).await;

    assert!(!body.contains("<script>alert(1)</script>"));
    assert!(body.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
}

#[tokio::test]
async fn test_plus_generates_requested_count() {
    let provider = FakeProvider::new(Behavior::Succeed);
    let (app, _) = app(provider.clone(), Duration::from_secs(8));

    let (status, body) = send(&app, post("/generate", "prompt=dogs&steps=10&num_images=3")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Generated Image:"));
    assert_eq!(body.matches("alt=\"Generated\"").count(), 3);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);

    // No cooldown on the plus page.
    let (status, _) = send(&app, post("/generate", "prompt=dogs&steps=10&num_images=1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_plus_failure_uses_fixed_message() {
    let (app, _) = app(FakeProvider::new(Behavior::RateLimited), Duration::ZERO);

    let (status, body) = send(&app, post("/generate", "prompt=dogs&steps=4&num_images=1")).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body.contains("Failed to generate image. Please try again."));
    assert!(!body.contains("Rate limit exceeded"));
}

#[tokio::test]
async fn test_plus_validation() {
    let provider = FakeProvider::new(Behavior::Succeed);
    let (app, _) = app(provider.clone(), Duration::ZERO);

    let (status, body) = send(&app, post("/generate", "prompt=dogs&steps=51&num_images=1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Steps must be between 1 and 50."));

    let (status, body) = send(&app, post("/generate", "prompt=dogs&steps=4&num_images=5")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Number of images must be between 1 and 4."));

    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_plus_unparseable_fields_rerender_page() {
    let provider = FakeProvider::new(Behavior::Succeed);
    let (app, _) = app(provider.clone(), Duration::ZERO);

    for form in [
        "prompt=dogs&steps=&num_images=1",
        "prompt=dogs&steps=-1&num_images=1",
        "prompt=dogs&steps=abc&num_images=1",
    ] {
        let (status, body) = send(&app, post("/generate", form)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "status for {form}");
        assert!(body.contains("<html"), "page for {form}");
        assert!(body.contains("Steps must be between 1 and 50."));
        assert!(body.contains("id=\"steps\" value=\"4\""));
    }

    let (status, body) = send(&app, post("/generate", "prompt=dogs&steps=4&num_images=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Number of images must be between 1 and 4."));

    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_plus_defaults_when_fields_missing() {
    let provider = FakeProvider::new(Behavior::Succeed);
    let (app, _) = app(provider.clone(), Duration::ZERO);

    let (status, _) = send(&app, post("/generate", "prompt=dogs")).await;

    assert_eq!(status, StatusCode::OK);
    let last = provider.last.lock().unwrap().clone().unwrap();
    assert_eq!(last.steps, 4);
    assert_eq!(last.count, 1);
}

#[tokio::test]
async fn test_one_request_in_flight() {
    let provider = FakeProvider::new(Behavior::Hang);
    let (app, state) = app(provider.clone(), Duration::ZERO);

    let first = tokio::spawn({
        let app = app.clone();
        async move { send(&app, post("/generate", "prompt=slow&steps=1&num_images=1")).await }
    });

    // Wait until the first request holds the slot.
    for _ in 0..100 {
        if provider.calls.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(state.gate().try_begin(false).is_err());

    let (status, body) = send(&app, post("/", "prompt=fast&steps=1")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body.contains("Another image is still being generated. Please wait."));

    first.abort();
}
