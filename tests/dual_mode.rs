use std::sync::Arc;
use std::time::Duration;

use framesnap::Error;
use framesnap::assets::{FileWallpaperProvider, SourceImage};
use framesnap::config::RenderConfig;
use framesnap::render::dual::DualModeRenderer;
use framesnap::settings_model::{Background, BrowserStyle, Rgba8, SettingsSnapshot};
use framesnap::tasks::session::{self, Session};
use image::{Rgba, RgbaImage};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

fn source() -> SourceImage {
    SourceImage::new(RgbaImage::from_fn(30, 20, |x, y| {
        Rgba([x as u8 * 8, y as u8 * 12, 200, 255])
    }))
}

fn snapshot(padding: f64) -> Arc<SettingsSnapshot> {
    Arc::new(SettingsSnapshot {
        scale: 1.0,
        padding,
        shadow: 6.0,
        browser_style: BrowserStyle::Chrome,
        background: Background::Gradient {
            start: Rgba8::rgb(0x66, 0x7e, 0xea),
            end: Rgba8::rgb(0x76, 0x4b, 0xa2),
        },
        ..SettingsSnapshot::default()
    }
    .with_rotation(10.0, 20.0, -5.0, 15.0))
}

#[test]
fn export_is_idempotent_and_restores_preview() {
    let renderer = DualModeRenderer::new(RenderConfig {
        export_pixel_ratio: 2.0,
        ..RenderConfig::default()
    });
    let source = source();
    let frame = renderer.preview(snapshot(10.0), &source).unwrap().unwrap();

    let first = renderer.export(&snapshot(10.0), &source, None).unwrap();
    let second = renderer.export(&snapshot(10.0), &source, None).unwrap();
    assert_eq!(first.png, second.png);
    assert_eq!(first.image.dimensions(), (100, 200));
    assert_eq!(first.layout, frame.layout);

    let restored = renderer.current_preview().unwrap().unwrap();
    assert_eq!(restored, *frame.image);
}

#[test]
fn export_differs_from_preview_layer() {
    let renderer = DualModeRenderer::new(RenderConfig::default());
    let source = source();
    let frame = renderer.preview(snapshot(40.0), &source).unwrap().unwrap();
    let exported = renderer.export(&snapshot(40.0), &source, None).unwrap();
    assert_eq!(frame.image.dimensions(), exported.image.dimensions());
    // preview leaves the padding for the host; export paints it
    assert_eq!(frame.image.get_pixel(55, 4).0[3], 0);
    assert_eq!(exported.image.get_pixel(55, 4).0[3], 255);
    assert!(frame.host_transform.contains("rotateY(20deg)"));
}

#[test]
fn failed_export_keeps_last_preview() {
    let renderer = DualModeRenderer::new(RenderConfig::default());
    let source = source();
    let frame = renderer.preview(snapshot(10.0), &source).unwrap().unwrap();

    let wallpaper = snapshot(10.0).with_background(Background::Wallpaper {
        path: "missing.png".into(),
    });
    let err = renderer.export(&wallpaper, &source, None).unwrap_err();
    assert!(matches!(err, Error::Asset { .. }));
    assert_eq!(renderer.current_preview().unwrap().unwrap(), *frame.image);
}

#[test]
fn later_request_wins_regardless_of_finish_order() {
    let renderer = DualModeRenderer::new(RenderConfig::default());
    let source = source();
    let older = renderer.begin_preview();
    let newer = renderer.begin_preview();

    let published = renderer
        .render_preview(newer, snapshot(30.0), &source)
        .unwrap()
        .expect("newest preview is published");
    assert!(
        renderer
            .render_preview(older, snapshot(5.0), &source)
            .unwrap()
            .is_none()
    );
    assert_eq!(renderer.published_generation(), newer);
    assert_eq!(renderer.current_preview().unwrap().unwrap(), *published.image);
}

#[tokio::test]
async fn session_settles_on_latest_snapshot() {
    let renderer = Arc::new(DualModeRenderer::new(RenderConfig::default()));
    let session = Session {
        renderer: Arc::clone(&renderer),
        source: Arc::new(source()),
        wallpapers: Arc::new(FileWallpaperProvider::new()),
    };
    let (snap_tx, snap_rx) = watch::channel(snapshot(5.0));
    let (_export_tx, export_rx) = mpsc::channel(1);
    let (ui_tx, mut ui_rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let task = tokio::spawn(session::run(
        session,
        snap_rx,
        export_rx,
        ui_tx,
        cancel.clone(),
    ));

    for padding in [10.0, 15.0, 20.0] {
        snap_tx.send(snapshot(padding)).unwrap();
    }

    let settled = tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let frame = ui_rx.recv().await.expect("session alive");
            if frame.snapshot.padding == 20.0 {
                return frame;
            }
        }
    })
    .await
    .expect("latest snapshot previewed");
    assert_eq!(renderer.published_generation(), settled.generation);
    assert_eq!(settled.image.dimensions(), (70, 120));

    cancel.cancel();
    task.await.unwrap().unwrap();
}
