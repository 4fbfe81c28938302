use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::RgbaImage;
use settings_model::SettingsSnapshot;
use tracing::{debug, info};

use crate::assets::SourceImage;
use crate::config::RenderConfig;
use crate::error::Result;
use crate::events::{ExportedImage, PreviewFrame};
use crate::render::compositor::{RenderInputs, RenderMode, render};
use crate::render::generative::{GenerativeBackground, MeshGradient};
use crate::render::surface::{Surface, encode_png};
use crate::render::transform::host_css_transform;

const PREVIEW_PIXEL_RATIO: f64 = 1.0;

#[derive(Debug, Default)]
struct Shared {
    surface: Option<Surface>,
    generation: u64,
}

/// Keeps the interactive preview and the flattened export consistent while sharing one
/// display surface.
pub struct DualModeRenderer {
    config: RenderConfig,
    generator: Arc<dyn GenerativeBackground>,
    latest_preview: AtomicU64,
    shared: Mutex<Shared>,
}

impl std::fmt::Debug for DualModeRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualModeRenderer")
            .field("config", &self.config)
            .field("generator", &self.generator.name())
            .field("latest_preview", &self.latest_preview.load(Ordering::Relaxed))
            .finish()
    }
}

impl DualModeRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self::with_generator(config, Arc::new(MeshGradient))
    }

    pub fn with_generator(config: RenderConfig, generator: Arc<dyn GenerativeBackground>) -> Self {
        Self {
            config,
            generator,
            latest_preview: AtomicU64::new(0),
            shared: Mutex::new(Shared::default()),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn lock_shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve a generation for a new preview request; any earlier request becomes stale.
    pub fn begin_preview(&self) -> u64 {
        self.latest_preview.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.latest_preview.load(Ordering::SeqCst) == generation
    }

    /// Render the preview layer for `generation` and publish it if nothing newer was
    /// requested meanwhile. `Ok(None)` means the result was stale and dropped.
    pub fn render_preview(
        &self,
        generation: u64,
        snapshot: Arc<SettingsSnapshot>,
        source: &SourceImage,
    ) -> Result<Option<PreviewFrame>> {
        let inputs = RenderInputs {
            settings: &snapshot,
            source: Some(source),
            wallpaper: None,
            generator: self.generator.as_ref(),
        };
        let (surface, layout) =
            render(inputs, RenderMode::PREVIEW, PREVIEW_PIXEL_RATIO, &self.config)?;
        let image = Arc::new(surface.read_back()?);

        let mut shared = self.lock_shared();
        if !self.is_current(generation) || shared.generation > generation {
            debug!(generation, "discarding stale preview");
            return Ok(None);
        }
        shared.surface = Some(surface);
        shared.generation = generation;
        drop(shared);

        debug!(generation, width = image.width(), height = image.height(), "preview published");
        Ok(Some(PreviewFrame {
            generation,
            host_transform: host_css_transform(&snapshot),
            snapshot,
            layout,
            image,
        }))
    }

    /// Convenience for callers without concurrent previews.
    pub fn preview(
        &self,
        snapshot: Arc<SettingsSnapshot>,
        source: &SourceImage,
    ) -> Result<Option<PreviewFrame>> {
        let generation = self.begin_preview();
        self.render_preview(generation, snapshot, source)
    }

    /// Flatten everything into the shared surface, read it back, then put the preview
    /// pixels back. The lock is held for the whole sequence.
    pub fn export(
        &self,
        snapshot: &SettingsSnapshot,
        source: &SourceImage,
        wallpaper: Option<&RgbaImage>,
    ) -> Result<ExportedImage> {
        let inputs = RenderInputs {
            settings: snapshot,
            source: Some(source),
            wallpaper,
            generator: self.generator.as_ref(),
        };
        let mut shared = self.lock_shared();
        let preview = shared.surface.take();
        let outcome = self.flatten(&mut shared, inputs);
        shared.surface = preview;
        drop(shared);

        let exported = outcome?;
        info!(
            width = exported.image.width(),
            height = exported.image.height(),
            bytes = exported.png.len(),
            "export complete"
        );
        Ok(exported)
    }

    fn flatten(&self, shared: &mut Shared, inputs: RenderInputs<'_>) -> Result<ExportedImage> {
        let (surface, layout) = render(
            inputs,
            RenderMode::EXPORT,
            self.config.export_pixel_ratio,
            &self.config,
        )?;
        let surface = shared.surface.insert(surface);
        let image = surface.read_back()?;
        let png = encode_png(&image)?;
        Ok(ExportedImage { image, png, layout })
    }

    /// Pixels currently on the shared surface (the last published preview).
    pub fn current_preview(&self) -> Result<Option<RgbaImage>> {
        self.lock_shared()
            .surface
            .as_ref()
            .map(Surface::read_back)
            .transpose()
    }

    pub fn published_generation(&self) -> u64 {
        self.lock_shared().generation
    }
}
