#![warn(missing_docs)]
//! pixprompt - type a prompt, get a FLUX image.
//!
//! A thin front-end over a hosted image-generation API. One helper posts the
//! prompt to `{api_url}/images/generations` with bearer authentication and
//! decodes the `b64_json` payload; two server-rendered pages drive it.
//!
//! # Quick Start
//!
//! ```no_run
//! use pixprompt::{GenerationRequest, ImageProvider, TogetherProvider};
//!
//! #[tokio::main]
//! async fn main() -> pixprompt::Result<()> {
//!     let provider = TogetherProvider::builder().build()?;
//!     let request = GenerationRequest::new("A cute corgi astronaut").with_steps(4);
//!     let image = provider.generate(&request).await?;
//!     image.save("corgi.png")?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `web`: the generator pages (axum)
//! - `cli`: the `pixprompt` binary

pub mod config;
mod error;
pub mod image;

#[cfg(feature = "web")]
pub mod web;

pub use config::Settings;
pub use error::{PixPromptError, Result};
pub use image::providers::{TogetherModel, TogetherProvider, TogetherProviderBuilder};
pub use image::{
    GeneratedImage, GenerationMetadata, GenerationRequest, ImageFormat, ImageProvider,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{PixPromptError, Result};
    pub use crate::image::providers::TogetherProvider;
    pub use crate::image::{GeneratedImage, GenerationRequest, ImageProvider};
}
