//! Rendering surface abstraction

use crate::error::RenderError;
use async_trait::async_trait;
use marquee_core::{infer_media_type, CreativeRef};
use tracing::info;

/// Platform display surface.
///
/// Implementors show one creative and return once it is on screen; the
/// scheduler owns how long it stays there.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, creative: &CreativeRef) -> Result<(), RenderError>;
}

/// Headless surface that only logs what would be shown
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRenderer;

#[async_trait]
impl Renderer for LogRenderer {
    async fn render(&self, creative: &CreativeRef) -> Result<(), RenderError> {
        let source = creative
            .local_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| creative.url.clone());

        let media_type = creative
            .media_type
            .unwrap_or_else(|| infer_media_type(&creative.url));

        info!(
            creative_id = %creative.creative_id,
            media_type = %media_type,
            duration = creative.duration,
            source = %source,
            "Displaying creative"
        );
        Ok(())
    }
}
