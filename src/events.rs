use std::sync::Arc;

use image::RgbaImage;
use settings_model::SettingsSnapshot;
use tokio::sync::oneshot;

use crate::error::Result;
use crate::processing::layout::LayoutResult;

/// A published preview: the flat frame layer plus what the host needs to finish it natively.
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub generation: u64,
    pub snapshot: Arc<SettingsSnapshot>,
    pub layout: LayoutResult,
    pub image: Arc<RgbaImage>,
    /// CSS transform for the host's native 3D display.
    pub host_transform: String,
}

#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub image: RgbaImage,
    pub png: Vec<u8>,
    pub layout: LayoutResult,
}

#[derive(Debug)]
pub struct ExportRequest {
    pub snapshot: Arc<SettingsSnapshot>,
    pub reply: oneshot::Sender<Result<ExportedImage>>,
}
