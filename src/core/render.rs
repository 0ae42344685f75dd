//! Extension-keyed content renderers
//!
//! Each document extension maps to exactly one renderer. New formats are
//! added with [`RendererRegistry::register`]; nothing else has to change,
//! since name validation reads the accepted extensions from the registry.

use pulldown_cmark::{html, Options, Parser};

use super::document::{DocumentName, MediaType, RenderedDocument};

/// Pure transform from raw document bytes to a response body
pub type RenderFn = fn(&[u8]) -> Vec<u8>;

#[derive(Debug, Clone)]
struct Renderer {
    extension: String,
    media_type: MediaType,
    transform: RenderFn,
}

/// Ordered table of `extension -> renderer` entries
#[derive(Debug, Clone)]
pub struct RendererRegistry {
    renderers: Vec<Renderer>,
}

impl Default for RendererRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("txt", MediaType::TEXT_PLAIN, render_plain);
        registry.register("md", MediaType::TEXT_HTML, render_markdown);
        registry
    }
}

impl RendererRegistry {
    /// A registry with no renderers
    pub fn empty() -> Self {
        Self {
            renderers: Vec::new(),
        }
    }

    /// Register a renderer, replacing any existing entry for the extension.
    /// The extension is given without its leading dot.
    pub fn register(&mut self, extension: &str, media_type: MediaType, transform: RenderFn) {
        let extension = extension.trim_start_matches('.').to_string();
        let renderer = Renderer {
            extension,
            media_type,
            transform,
        };

        match self
            .renderers
            .iter_mut()
            .find(|r| r.extension == renderer.extension)
        {
            Some(existing) => *existing = renderer,
            None => self.renderers.push(renderer),
        }
    }

    /// Registered extensions in registration order, without dots
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.renderers.iter().map(|r| r.extension.as_str())
    }

    /// Whether `name` ends in a registered extension (case-sensitive suffix test)
    pub fn accepts(&self, name: &str) -> bool {
        self.renderers.iter().any(|r| {
            name.strip_suffix(r.extension.as_str())
                .is_some_and(|stem| stem.ends_with('.'))
        })
    }

    /// Render `content` using the renderer registered for the name's extension
    pub fn render(&self, name: &DocumentName, content: &[u8]) -> Option<RenderedDocument> {
        let extension = name.extension()?;
        let renderer = self.renderers.iter().find(|r| r.extension == extension)?;

        tracing::debug!("Rendering {} as {}", name, renderer.media_type);
        Some(RenderedDocument {
            media_type: renderer.media_type,
            body: (renderer.transform)(content),
        })
    }
}

/// Plain text passes through unchanged
pub fn render_plain(content: &[u8]) -> Vec<u8> {
    content.to_vec()
}

/// CommonMark to HTML, no extensions
pub fn render_markdown(content: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(content);
    let parser = Parser::new_ext(&text, Options::empty());

    let mut output = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output.into_bytes()
}
