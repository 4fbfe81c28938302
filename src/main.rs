use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use framesnap::assets::{FileWallpaperProvider, load_source_image_async};
use framesnap::config::Configuration;
use framesnap::events::ExportRequest;
use framesnap::palette::PaletteSuggestion;
use framesnap::render::dual::DualModeRenderer;
use framesnap::render::surface::encode_png;
use framesnap::settings_model::{
    GRADIENT_PRESETS, PERSPECTIVE_PRESETS, SOLID_COLOR_PRESETS, SettingsSnapshot, gradient_preset,
    perspective_preset, solid_color_preset,
};
use framesnap::tasks::session::{self, Session};

/// Frame a screenshot and export it as PNG
#[derive(Debug, Parser)]
#[command(name = "framesnap", about = "Screenshot beautifier compositor")]
struct Cli {
    /// Path to YAML config file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Screenshot to frame
    #[arg(short, long, value_name = "IMAGE")]
    input: PathBuf,

    /// Where to write the PNG
    #[arg(short, long, value_name = "PNG")]
    output: PathBuf,

    /// Write the preview layer (no background, no tilt) instead of the export
    #[arg(long)]
    preview: bool,

    /// Apply a named perspective preset
    #[arg(long, value_name = "PRESET")]
    perspective: Option<String>,

    /// Replace the background with a named gradient preset
    #[arg(long, value_name = "PRESET", conflicts_with = "solid")]
    gradient: Option<String>,

    /// Replace the background with a named solid color preset
    #[arg(long, value_name = "PRESET")]
    solid: Option<String>,

    /// Apply palette suggestions from a JSON file
    #[arg(long, value_name = "JSON")]
    palette: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("framesnap={level},settings_model={level}")))
        .context("building log filter")?;
    fmt().with_env_filter(filter).with_target(true).compact().init();
    Ok(())
}

fn unknown_preset(
    kind: &str,
    name: &str,
    known: impl Iterator<Item = &'static str>,
) -> anyhow::Error {
    let known: Vec<_> = known.collect();
    anyhow!("unknown {kind} preset '{name}' (known: {})", known.join(", "))
}

/// Apply the preset flags on top of the configured settings.
fn apply_presets(mut settings: SettingsSnapshot, cli: &Cli) -> Result<SettingsSnapshot> {
    if let Some(name) = cli.perspective.as_deref() {
        let preset = perspective_preset(name).ok_or_else(|| {
            unknown_preset("perspective", name, PERSPECTIVE_PRESETS.iter().map(|p| p.name))
        })?;
        settings = settings.with_perspective_preset(preset);
    }
    if let Some(name) = cli.gradient.as_deref() {
        let preset = gradient_preset(name).ok_or_else(|| {
            unknown_preset("gradient", name, GRADIENT_PRESETS.iter().map(|p| p.name))
        })?;
        settings = settings.with_background(preset.background());
    }
    if let Some(name) = cli.solid.as_deref() {
        let preset = solid_color_preset(name).ok_or_else(|| {
            unknown_preset("solid color", name, SOLID_COLOR_PRESETS.iter().map(|p| p.name))
        })?;
        settings = settings.with_background(preset.background());
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let cfg = Configuration::from_yaml_file(&cli.config)?
        .validated()
        .context("validating configuration")?;
    let mut settings = apply_presets(cfg.settings.clone(), &cli)?;
    if let Some(path) = &cli.palette {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading palette {}", path.display()))?;
        settings = PaletteSuggestion::from_response_text(&text)?.apply_to(&settings);
    }
    let settings = Arc::new(settings);

    let source = load_source_image_async(cli.input.clone()).await?;
    info!(
        width = source.width(),
        height = source.height(),
        background = settings.background.kind(),
        "source loaded"
    );

    let session = Session {
        renderer: Arc::new(DualModeRenderer::new(cfg.render.clone())),
        source: Arc::new(source),
        wallpapers: Arc::new(FileWallpaperProvider::new()),
    };
    let (_snapshot_tx, snapshot_rx) = watch::channel(Arc::clone(&settings));
    let (export_tx, export_rx) = mpsc::channel(1);
    let (preview_tx, mut preview_rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    let worker = tokio::spawn(session::run(
        session,
        snapshot_rx,
        export_rx,
        preview_tx,
        cancel.clone(),
    ));

    let png = if cli.preview {
        let frame = preview_rx
            .recv()
            .await
            .context("session ended before producing a preview")?;
        info!(transform = %frame.host_transform, "preview ready");
        encode_png(&frame.image)?
    } else {
        let (reply, response) = oneshot::channel();
        export_tx
            .send(ExportRequest {
                snapshot: Arc::clone(&settings),
                reply,
            })
            .await
            .map_err(|_| anyhow!("render session is not running"))?;
        response.await.context("render session dropped the export")??.png
    };

    cancel.cancel();
    worker.await.context("render session panicked")??;

    tokio::fs::write(&cli.output, &png)
        .await
        .with_context(|| format!("writing {}", cli.output.display()))?;
    info!(path = %cli.output.display(), bytes = png.len(), "wrote image");
    Ok(())
}
