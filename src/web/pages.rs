//! HTML for the simple and plus generator pages.
//!
//! Pages are rendered server-side from a small view model. The only
//! client-side behavior is the loading state: a short inline script disables
//! the button, swaps its label, shows the spinner or progress bar, and runs
//! the cooldown countdown.

use std::fmt::Write;

/// Text shown on the plus page whenever generation fails.
pub const PLUS_FAILURE_MESSAGE: &str = "Failed to generate image. Please try again.";

/// Simple page steps slider bounds and default.
pub const SIMPLE_STEPS: (u32, u32) = (1, 4);
/// Default steps on the simple page.
pub const SIMPLE_DEFAULT_STEPS: u32 = 1;

/// Plus page steps bounds.
pub const PLUS_STEPS: (u32, u32) = (1, 50);
/// Default steps on the plus page.
pub const PLUS_DEFAULT_STEPS: u32 = 4;
/// Plus page image count bounds.
pub const PLUS_IMAGES: (u32, u32) = (1, 4);

/// Progress added per tick while the plus page is loading.
pub const PROGRESS_INCREMENT: u32 = 10;
/// Tick interval per step; ten ticks take `steps` seconds.
pub const PROGRESS_MS_PER_STEP: u32 = 100;

/// State of the simple generator page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimplePage {
    /// Prompt echoed back into the input.
    pub prompt: String,
    /// Selected steps.
    pub steps: u32,
    /// Error text, if the last submission failed.
    pub error: Option<String>,
    /// Data URL of the generated image.
    pub image: Option<String>,
    /// Seconds left before another submission is accepted.
    pub cooldown_secs: u64,
}

impl SimplePage {
    /// The page as first served.
    pub fn initial() -> Self {
        Self {
            steps: SIMPLE_DEFAULT_STEPS,
            ..Self::default()
        }
    }

    /// Label of the submit button in the server-rendered state.
    pub fn button_label(&self) -> String {
        if self.cooldown_secs > 0 {
            format!("⏳ Wait {}s", self.cooldown_secs)
        } else {
            "✨ Generate Cute Image".to_string()
        }
    }
}

/// State of the plus generator page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlusPage {
    /// Prompt echoed back into the input.
    pub prompt: String,
    /// Selected steps.
    pub steps: u32,
    /// Selected image count.
    pub num_images: u32,
    /// Error text, if the last submission failed.
    pub error: Option<String>,
    /// Data URLs of the generated images.
    pub images: Vec<String>,
}

impl PlusPage {
    /// The page as first served.
    pub fn initial() -> Self {
        Self {
            steps: PLUS_DEFAULT_STEPS,
            num_images: PLUS_IMAGES.0,
            ..Self::default()
        }
    }
}

/// Escapes text for HTML element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the simple generator page.
pub fn render_simple(page: &SimplePage) -> String {
    let mut html = String::new();
    push_head(
        &mut html,
        "AI Image Generator",
        "Generate cute images using AI",
        SIMPLE_CSS,
    );

    html.push_str("<div class=\"container\">\n<h1>🎨 AI Image Generator</h1>\n");
    html.push_str("<form id=\"generate-form\" method=\"post\" action=\"/\">\n");
    let _ = writeln!(
        html,
        "<input type=\"text\" name=\"prompt\" value=\"{}\" placeholder=\"Describe your cute image...\" required>",
        escape_html(&page.prompt)
    );
    let _ = writeln!(
        html,
        "<div class=\"controls\"><label>Steps: <span id=\"steps-value\">{steps}</span>\
         <input type=\"range\" name=\"steps\" value=\"{steps}\" min=\"{min}\" max=\"{max}\" \
         oninput=\"document.getElementById('steps-value').textContent = this.value\"></label></div>",
        steps = page.steps,
        min = SIMPLE_STEPS.0,
        max = SIMPLE_STEPS.1,
    );
    let _ = writeln!(
        html,
        "<button type=\"submit\" id=\"generate-button\" data-cooldown=\"{}\"{}>{}</button>",
        page.cooldown_secs,
        if page.cooldown_secs > 0 { " disabled" } else { "" },
        escape_html(&page.button_label())
    );
    html.push_str("</form>\n<div class=\"loader\" id=\"loader\" hidden></div>\n");

    push_error(&mut html, page.error.as_deref());

    if let Some(src) = &page.image {
        let _ = writeln!(
            html,
            "<div class=\"result\"><img src=\"{}\" alt=\"Generated cute image\"></div>",
            escape_html(src)
        );
    }

    html.push_str("</div>\n<script>\n");
    html.push_str(SIMPLE_SCRIPT);
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

/// Renders the plus generator page.
pub fn render_plus(page: &PlusPage) -> String {
    let mut html = String::new();
    push_head(
        &mut html,
        "Generate an Image with AI",
        "Generate images using AI",
        PLUS_CSS,
    );

    html.push_str("<div class=\"container\">\n<h1>Generate an Image with AI</h1>\n");
    html.push_str("<form id=\"generate-form\" method=\"post\" action=\"/generate\">\n");
    let _ = writeln!(
        html,
        "<input type=\"text\" name=\"prompt\" value=\"{}\" placeholder=\"Enter a text prompt\" required>",
        escape_html(&page.prompt)
    );
    let _ = writeln!(
        html,
        "<div class=\"controls\">\
         <label>Steps:<input type=\"number\" name=\"steps\" id=\"steps\" value=\"{}\" min=\"{}\" max=\"{}\"></label>\
         <label>Number of Images:<input type=\"number\" name=\"num_images\" value=\"{}\" min=\"{}\" max=\"{}\"></label>\
         </div>",
        page.steps, PLUS_STEPS.0, PLUS_STEPS.1, page.num_images, PLUS_IMAGES.0, PLUS_IMAGES.1,
    );
    html.push_str("<button type=\"submit\" id=\"generate-button\">Generate Image</button>\n</form>\n");
    html.push_str(
        "<div class=\"progress-bar\" id=\"progress-bar\" hidden><div class=\"progress\" id=\"progress\" style=\"width: 0%\"></div></div>\n",
    );

    push_error(&mut html, page.error.as_deref());

    if !page.images.is_empty() {
        html.push_str("<div class=\"result\">\n<h2>Generated Image:</h2>\n");
        for src in &page.images {
            let _ = writeln!(html, "<img src=\"{}\" alt=\"Generated\">", escape_html(src));
        }
        html.push_str("</div>\n");
    }

    html.push_str("</div>\n<script>\n");
    let _ = writeln!(
        html,
        "const PROGRESS_INCREMENT = {PROGRESS_INCREMENT};\nconst PROGRESS_MS_PER_STEP = {PROGRESS_MS_PER_STEP};"
    );
    html.push_str(PLUS_SCRIPT);
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

fn push_head(html: &mut String, title: &str, description: &str, css: &str) {
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<meta name=\"description\" content=\"{description}\">\n<style>\n"
    );
    html.push_str(css);
    html.push_str("</style>\n</head>\n<body>\n");
}

fn push_error(html: &mut String, error: Option<&str>) {
    if let Some(error) = error {
        let _ = writeln!(html, "<p class=\"error\">{}</p>", escape_html(error));
    }
}

const SIMPLE_SCRIPT: &str = r#"(function () {
  const form = document.getElementById('generate-form');
  const button = document.getElementById('generate-button');
  const loader = document.getElementById('loader');
  let cooldown = Number(button.dataset.cooldown || 0);
  function tick() {
    if (cooldown > 0) {
      button.disabled = true;
      button.textContent = '⏳ Wait ' + cooldown + 's';
      cooldown -= 1;
      setTimeout(tick, 1000);
    } else {
      button.disabled = false;
      button.textContent = '✨ Generate Cute Image';
    }
  }
  tick();
  form.addEventListener('submit', function (e) {
    if (button.disabled) { e.preventDefault(); return; }
    button.disabled = true;
    button.textContent = '🌟 Creating...';
    loader.hidden = false;
  });
})();
"#;

const PLUS_SCRIPT: &str = r#"(function () {
  const form = document.getElementById('generate-form');
  const button = document.getElementById('generate-button');
  const bar = document.getElementById('progress-bar');
  const progress = document.getElementById('progress');
  form.addEventListener('submit', function (e) {
    if (button.disabled) { e.preventDefault(); return; }
    button.disabled = true;
    button.textContent = 'Generating...';
    bar.hidden = false;
    const steps = Number(document.getElementById('steps').value) || 1;
    let value = 0;
    progress.style.width = '0%';
    setInterval(function () {
      value = Math.min(value + PROGRESS_INCREMENT, 100);
      progress.style.width = value + '%';
    }, steps * PROGRESS_MS_PER_STEP);
  });
})();
"#;

const SIMPLE_CSS: &str = r#"body { font-family: Arial, sans-serif; background-color: #fafafa; }
.container { max-width: 500px; margin: 2rem auto; padding: 1rem; background-color: #fff; border-radius: 15px; box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1); }
h1 { color: #e91e63; font-size: 1.8rem; margin-bottom: 1rem; text-align: center; }
form { display: flex; flex-direction: column; }
input[type="text"] { padding: 0.5rem; font-size: 1rem; border: 2px solid #ffb6c1; border-radius: 5px; margin-bottom: 1rem; }
.controls { display: flex; justify-content: center; margin-bottom: 1rem; }
.controls label { display: flex; flex-direction: column; align-items: center; font-size: 0.9rem; }
input[type="range"] { width: 200px; margin-top: 0.5rem; }
button { background-color: #e91e63; color: white; border: none; padding: 0.7rem; font-size: 1rem; border-radius: 5px; cursor: pointer; transition: background-color 0.3s ease; }
button:hover:not(:disabled) { background-color: #c2185b; }
button:disabled { background-color: #ffb6c1; cursor: not-allowed; }
.error { color: #ff4040; text-align: center; margin-top: 1rem; }
.result { margin-top: 1rem; text-align: center; }
img { max-width: 100%; border-radius: 10px; box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1); }
.loader { border: 5px solid #f3f3f3; border-top: 5px solid #e91e63; border-radius: 50%; width: 50px; height: 50px; animation: spin 1s linear infinite; margin: 20px auto; }
.loader[hidden] { display: none; }
@keyframes spin { 0% { transform: rotate(0deg); } 100% { transform: rotate(360deg); } }
"#;

const PLUS_CSS: &str = r#"body { background-color: #1a1a1a; color: #ffffff; font-family: Arial, sans-serif; }
.container { padding: 2rem; text-align: center; max-width: 800px; margin: 0 auto; }
h1 { color: #0070f3; }
form { display: flex; flex-direction: column; margin-bottom: 2rem; }
input, button { margin-bottom: 1rem; padding: 0.5rem; font-size: 1rem; background-color: #333; color: white; border: none; border-radius: 4px; }
.controls { display: flex; justify-content: space-between; margin-bottom: 1rem; }
.controls label { display: flex; flex-direction: column; align-items: flex-start; }
.controls input { width: 60px; }
button { background-color: #0070f3; cursor: pointer; transition: background-color 0.3s ease; }
button:hover { background-color: #0051a2; }
button:disabled { background-color: #666; }
.error { color: #ff4040; }
.result { margin-top: 2rem; }
img { max-width: 100%; height: auto; border-radius: 8px; box-shadow: 0 4px 8px rgba(0, 0, 0, 0.5); }
.progress-bar { width: 100%; height: 10px; background-color: #333; border-radius: 5px; overflow: hidden; margin-bottom: 1rem; }
.progress-bar[hidden] { display: none; }
.progress { height: 100%; background-color: #0070f3; transition: width 0.5s ease; }
"#;
