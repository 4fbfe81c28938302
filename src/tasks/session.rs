use std::sync::Arc;

use anyhow::Result;
use settings_model::SettingsSnapshot;
use tokio::select;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinSet, spawn_blocking};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::assets::{SourceImage, WallpaperProvider};
use crate::events::{ExportRequest, ExportedImage, PreviewFrame};
use crate::render::dual::DualModeRenderer;

/// Long-lived state one editing session renders against.
#[derive(Clone)]
pub struct Session {
    pub renderer: Arc<DualModeRenderer>,
    pub source: Arc<SourceImage>,
    pub wallpapers: Arc<dyn WallpaperProvider>,
}

type PreviewOutcome = crate::error::Result<Option<PreviewFrame>>;

/// Drive previews from snapshot changes and serve export requests until cancelled or
/// both inputs close. The current snapshot is previewed immediately.
pub async fn run(
    session: Session,
    mut snapshots: watch::Receiver<Arc<SettingsSnapshot>>,
    mut exports: mpsc::Receiver<ExportRequest>,
    to_ui: mpsc::Sender<PreviewFrame>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut previews: JoinSet<PreviewOutcome> = JoinSet::new();
    let mut watching = true;
    let mut accepting = true;

    let initial = Arc::clone(&snapshots.borrow_and_update());
    spawn_preview(&mut previews, &session, initial);

    loop {
        if !watching && !accepting && previews.is_empty() {
            debug!("inputs closed and previews drained");
            break;
        }
        select! {
            _ = cancel.cancelled() => break,

            changed = snapshots.changed(), if watching => {
                if changed.is_err() {
                    debug!("snapshot sender closed");
                    watching = false;
                    continue;
                }
                let snapshot = Arc::clone(&snapshots.borrow_and_update());
                spawn_preview(&mut previews, &session, snapshot);
            }

            request = exports.recv(), if accepting => {
                let Some(ExportRequest { snapshot, reply }) = request else {
                    accepting = false;
                    continue;
                };
                let outcome = export(&session, snapshot).await;
                if let Err(err) = &outcome {
                    warn!(error = %err, "export failed");
                }
                if reply.send(outcome).is_err() {
                    debug!("export requester went away");
                }
            }

            Some(joined) = previews.join_next() => {
                if !forward_preview(joined, &to_ui).await {
                    break;
                }
            }

            else => break,
        }
    }

    if !cancel.is_cancelled() {
        while let Some(joined) = previews.join_next().await {
            if !forward_preview(joined, &to_ui).await {
                break;
            }
        }
    }
    previews.abort_all();
    Ok(())
}

fn spawn_preview(
    previews: &mut JoinSet<PreviewOutcome>,
    session: &Session,
    snapshot: Arc<SettingsSnapshot>,
) {
    let generation = session.renderer.begin_preview();
    let renderer = Arc::clone(&session.renderer);
    let source = Arc::clone(&session.source);
    debug!(generation, "preview requested");
    previews.spawn_blocking(move || renderer.render_preview(generation, snapshot, &source));
}

/// Returns false once the UI side has hung up.
async fn forward_preview(
    joined: std::result::Result<PreviewOutcome, tokio::task::JoinError>,
    to_ui: &mpsc::Sender<PreviewFrame>,
) -> bool {
    match joined {
        Ok(Ok(Some(frame))) => to_ui.send(frame).await.is_ok(),
        Ok(Ok(None)) => true,
        Ok(Err(err)) => {
            warn!(error = %err, "preview render failed; keeping last frame");
            true
        }
        Err(err) => {
            warn!(error = %err, "preview task aborted");
            true
        }
    }
}

async fn export(
    session: &Session,
    snapshot: Arc<SettingsSnapshot>,
) -> crate::error::Result<ExportedImage> {
    let wallpaper = match snapshot.background.wallpaper_path() {
        Some(path) => {
            let provider = Arc::clone(&session.wallpapers);
            let path = path.clone();
            Some(spawn_blocking(move || provider.load(&path)).await??)
        }
        None => None,
    };
    let renderer = Arc::clone(&session.renderer);
    let source = Arc::clone(&session.source);
    spawn_blocking(move || renderer.export(&snapshot, &source, wallpaper.as_deref())).await?
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use super::*;
    use crate::assets::FileWallpaperProvider;
    use crate::config::RenderConfig;
    use crate::error::Error;
    use image::RgbaImage;
    use tokio::sync::oneshot;

    struct PanickingWallpapers;

    impl WallpaperProvider for PanickingWallpapers {
        fn load(&self, _path: &Path) -> crate::error::Result<Arc<RgbaImage>> {
            panic!("wallpaper decoder crashed")
        }
    }

    fn session() -> Session {
        Session {
            renderer: Arc::new(DualModeRenderer::new(RenderConfig::default())),
            source: Arc::new(SourceImage::new(RgbaImage::from_pixel(
                12,
                8,
                image::Rgba([255, 0, 0, 255]),
            ))),
            wallpapers: Arc::new(FileWallpaperProvider::new()),
        }
    }

    fn small() -> Arc<SettingsSnapshot> {
        Arc::new(SettingsSnapshot {
            padding: 4.0,
            scale: 1.0,
            shadow: 0.0,
            ..SettingsSnapshot::default()
        })
    }

    #[tokio::test]
    async fn previews_initial_snapshot_and_serves_exports() {
        let (_snap_tx, snap_rx) = watch::channel(small());
        let (export_tx, export_rx) = mpsc::channel(1);
        let (ui_tx, mut ui_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(session(), snap_rx, export_rx, ui_tx, cancel.clone()));

        let frame = ui_rx.recv().await.expect("initial preview");
        assert_eq!(frame.image.dimensions(), (20, 16));

        let (reply, response) = oneshot::channel();
        export_tx
            .send(ExportRequest {
                snapshot: small(),
                reply,
            })
            .await
            .unwrap();
        let exported = response.await.unwrap().unwrap();
        assert_eq!(exported.image.dimensions(), (20, 16));

        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn missing_wallpaper_fails_export_only() {
        let (_snap_tx, snap_rx) = watch::channel(small());
        let (export_tx, export_rx) = mpsc::channel(1);
        let (ui_tx, mut ui_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(session(), snap_rx, export_rx, ui_tx, cancel.clone()));
        ui_rx.recv().await.expect("initial preview");

        let snapshot = Arc::new(small().with_background(settings_model::Background::Wallpaper {
            path: "/no/such/wallpaper.png".into(),
        }));
        let (reply, response) = oneshot::channel();
        export_tx.send(ExportRequest { snapshot, reply }).await.unwrap();
        let err = response.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Asset { .. }));

        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn stops_when_inputs_close() {
        let (snap_tx, snap_rx) = watch::channel(small());
        let (export_tx, export_rx) = mpsc::channel::<ExportRequest>(1);
        let (ui_tx, mut ui_rx) = mpsc::channel(4);
        drop(snap_tx);
        drop(export_tx);
        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            run(session(), snap_rx, export_rx, ui_tx, CancellationToken::new()),
        )
        .await
        .expect("session returns once both inputs close");
        finished.unwrap();
        assert!(ui_rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn panicked_wallpaper_task_is_a_task_error() {
        let session = Session {
            wallpapers: Arc::new(PanickingWallpapers),
            ..session()
        };
        let (_snap_tx, snap_rx) = watch::channel(small());
        let (export_tx, export_rx) = mpsc::channel(1);
        let (ui_tx, mut ui_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(session, snap_rx, export_rx, ui_tx, cancel.clone()));
        ui_rx.recv().await.expect("initial preview");

        let snapshot = Arc::new(small().with_background(settings_model::Background::Wallpaper {
            path: "crash.png".into(),
        }));
        let (reply, response) = oneshot::channel();
        export_tx.send(ExportRequest { snapshot, reply }).await.unwrap();
        let err = response.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Task(_)), "{err}");
        assert!(!err.is_recoverable());

        // the session survives and keeps serving
        let (reply, response) = oneshot::channel();
        export_tx
            .send(ExportRequest {
                snapshot: small(),
                reply,
            })
            .await
            .unwrap();
        assert!(response.await.unwrap().is_ok());

        cancel.cancel();
        task.await.unwrap().unwrap();
    }
}
