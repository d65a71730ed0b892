//! Image generation providers.

mod together;

pub use together::{
    TogetherModel, TogetherProvider, TogetherProviderBuilder, API_KEY_ENV, API_URL_ENV,
    DEFAULT_API_URL,
};
