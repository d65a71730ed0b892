//! Generate a single image with FLUX.1 [schnell].
//!
//! Run with: IMAGE_API_KEY=... cargo run --example generate_image

use pixprompt::{GenerationRequest, ImageProvider, TogetherProvider};

#[tokio::main]
async fn main() -> pixprompt::Result<()> {
    let provider = TogetherProvider::builder().build()?;

    let request = GenerationRequest::new("A cozy cabin in snowy mountains at sunset").with_steps(4);

    println!("Generating image with {}...", provider.name());
    let image = provider.generate(&request).await?;

    image.save("cabin.png")?;
    println!("Saved to cabin.png ({} bytes)", image.size());

    Ok(())
}
