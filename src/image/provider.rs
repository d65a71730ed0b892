//! Image provider trait.

use crate::error::Result;
use crate::image::types::{GeneratedImage, GenerationRequest};
use async_trait::async_trait;

/// Trait for image generation backends.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates a single image. `request.count` is ignored.
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage>;

    /// Generates `request.count` images.
    ///
    /// The default runs one request per image, one after another.
    async fn generate_batch(&self, request: &GenerationRequest) -> Result<Vec<GeneratedImage>> {
        let mut images = Vec::with_capacity(request.count as usize);
        for _ in 0..request.count.max(1) {
            images.push(self.generate(request).await?);
        }
        Ok(images)
    }

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;

    /// Checks that the provider is configured well enough to be called.
    async fn health_check(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::types::{GenerationMetadata, ImageFormat};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Counting {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ImageProvider for Counting {
        async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedImage> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GeneratedImage::new(
                vec![n as u8],
                ImageFormat::Png,
                GenerationMetadata::default(),
            ))
        }

        fn name(&self) -> &str {
            "counting"
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_default_batch_calls_generate_per_image() {
        let provider = Counting {
            calls: AtomicU32::new(0),
        };
        let request = GenerationRequest::new("a fox").with_count(3);
        let images = provider.generate_batch(&request).await.unwrap();

        assert_eq!(images.len(), 3);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(images[2].data, vec![2]);
    }
}
