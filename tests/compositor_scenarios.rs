use framesnap::Error;
use framesnap::assets::SourceImage;
use framesnap::config::RenderConfig;
use framesnap::processing::layout::compute_layout;
use framesnap::render::background::{BackgroundAssets, fill_variant, paint_background};
use framesnap::render::compositor::{RenderInputs, RenderMode, composite, render};
use framesnap::render::frame::{draw_chrome, draw_image};
use framesnap::render::generative::MeshGradient;
use framesnap::render::surface::Surface;
use framesnap::render::transform::compose_frame_transform;
use framesnap::settings_model::{
    Background, BrowserStyle, GenerativeParams, PatternId, Rgba8, SettingsSnapshot,
};
use image::{Rgba, RgbaImage};
use kurbo::Point;

fn source(w: u32, h: u32) -> SourceImage {
    SourceImage::new(RgbaImage::from_fn(w, h, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 90, 255])
    }))
}

fn flat(background: Background) -> SettingsSnapshot {
    SettingsSnapshot {
        scale: 1.0,
        padding: 60.0,
        shadow: 0.0,
        background,
        ..SettingsSnapshot::default()
    }
}

fn inputs<'a>(
    settings: &'a SettingsSnapshot,
    source: &'a SourceImage,
    wallpaper: Option<&'a RgbaImage>,
) -> RenderInputs<'a> {
    RenderInputs {
        settings,
        source: Some(source),
        wallpaper,
        generator: &MeshGradient,
    }
}

fn within(a: u8, b: u8, tol: u8) -> bool {
    a.abs_diff(b) <= tol
}

#[test]
fn gradient_runs_corner_to_corner_and_corners_are_clipped() {
    let settings = flat(Background::Gradient {
        start: Rgba8::BLACK,
        end: Rgba8::WHITE,
    });
    let layout = compute_layout(&settings, 80, 40);
    let assets = BackgroundAssets {
        wallpaper: None,
        generator: &MeshGradient,
    };

    let mut unclipped = Surface::for_layout(&layout, 1.0).unwrap();
    fill_variant(&mut unclipped, &settings.background, &layout, assets, None).unwrap();
    let (w, h) = (unclipped.width(), unclipped.height());
    let top_left = unclipped.pixel_rgba(0, 0).unwrap();
    let bottom_right = unclipped.pixel_rgba(w - 1, h - 1).unwrap();
    assert!(top_left[..3].iter().all(|&c| within(c, 0, 3)), "{top_left:?}");
    assert!(bottom_right[..3].iter().all(|&c| within(c, 255, 3)), "{bottom_right:?}");

    let mut clipped = Surface::for_layout(&layout, 1.0).unwrap();
    paint_background(&mut clipped, &settings.background, &layout, assets).unwrap();
    assert_eq!(clipped.pixel_rgba(0, 0).unwrap()[3], 0);
    assert_eq!(clipped.pixel_rgba(w - 1, h - 1).unwrap()[3], 0);
}

#[test]
fn flat_export_is_background_plus_clipped_image() {
    let settings = flat(Background::Solid {
        color: Rgba8::rgb(0x20, 0x40, 0x80),
    });
    let source = source(120, 90);
    let config = RenderConfig::default();
    let (exported, layout) = render(
        inputs(&settings, &source, None),
        RenderMode::EXPORT,
        1.0,
        &config,
    )
    .unwrap();

    let mut manual = Surface::for_layout(&layout, 1.0).unwrap();
    let assets = BackgroundAssets {
        wallpaper: None,
        generator: &MeshGradient,
    };
    paint_background(&mut manual, &settings.background, &layout, assets).unwrap();
    let device = manual.base_transform();
    draw_image(&mut manual, &settings, &layout, &source, device).unwrap();

    assert_eq!(exported.read_back().unwrap(), manual.read_back().unwrap());
}

#[test]
fn zero_shadow_matches_skipping_the_shadow_layer() {
    let settings = flat(Background::default()).with_browser_style(BrowserStyle::Safari);
    let source = source(64, 48);
    let config = RenderConfig::default();
    let (exported, layout) = render(
        inputs(&settings, &source, None),
        RenderMode::EXPORT,
        1.0,
        &config,
    )
    .unwrap();

    let mut manual = Surface::for_layout(&layout, 1.0).unwrap();
    let assets = BackgroundAssets {
        wallpaper: None,
        generator: &MeshGradient,
    };
    paint_background(&mut manual, &settings.background, &layout, assets).unwrap();
    let device = manual.base_transform();
    draw_chrome(&mut manual, &settings, &layout, device).unwrap();
    draw_image(&mut manual, &settings, &layout, &source, device).unwrap();
    assert_eq!(exported.read_back().unwrap(), manual.read_back().unwrap());

    let shadowed = settings.with_shadow(20.0);
    let (with_shadow, _) = render(
        inputs(&shadowed, &source, None),
        RenderMode::EXPORT,
        1.0,
        &config,
    )
    .unwrap();
    // just below the frame, where only the shadow can land
    let y = (layout.image_y + layout.scaled_height + 4.0) as u32;
    let x = (layout.image_x + layout.scaled_width / 2.0) as u32;
    assert_ne!(
        with_shadow.pixel_rgba(x, y).unwrap(),
        exported.pixel_rgba(x, y).unwrap()
    );
}

#[test]
fn export_rotates_the_frame_about_its_center() {
    let settings = SettingsSnapshot {
        border_radius: 0.0,
        ..flat(Background::Solid {
            color: Rgba8::rgb(0, 0, 255),
        })
    }
    .with_rotation(0.0, 0.0, 30.0, 0.0);
    let source = SourceImage::new(RgbaImage::from_pixel(100, 60, Rgba([255, 0, 0, 255])));
    let config = RenderConfig::default();
    let (exported, layout) = render(
        inputs(&settings, &source, None),
        RenderMode::EXPORT,
        1.0,
        &config,
    )
    .unwrap();
    let (preview, _) = render(
        inputs(&settings, &source, None),
        RenderMode::PREVIEW,
        1.0,
        &config,
    )
    .unwrap();
    assert_eq!((layout.image_x, layout.image_y), (60.0, 60.0));

    // inside the untilted image near its top-left corner; the rotation swings it out
    let untilted = preview.pixel_rgba(61, 61).unwrap();
    assert!(within(untilted[0], 255, 2) && untilted[3] == 255, "{untilted:?}");
    assert_eq!(exported.pixel_rgba(61, 61).unwrap(), [0, 0, 255, 255]);

    // the same image point lands where the frame transform sends it
    let moved = compose_frame_transform(&settings, &layout) * Point::new(65.0, 65.0);
    assert!(moved.x > 80.0 && moved.y < 50.0, "{moved:?}");
    let is_red = |px: [u8; 4]| within(px[0], 255, 2) && px[2] <= 2 && px[3] == 255;
    let px = exported.pixel_rgba(moved.x as u32, moved.y as u32).unwrap();
    assert!(is_red(px), "{px:?}");
    // the pivot stays put
    let center = exported.pixel_rgba(110, 90).unwrap();
    assert!(is_red(center), "{center:?}");
}

#[test]
fn exports_are_byte_identical() {
    let settings = flat(Background::Generative(GenerativeParams {
        seed: 11,
        time: 2.5,
        distortion: 0.6,
        ..GenerativeParams::default()
    }))
    .with_rotation(10.0, -20.0, 5.0, -15.0)
    .with_shadow(16.0)
    .with_browser_style(BrowserStyle::Chrome);
    let source = source(50, 40);
    let config = RenderConfig::default();
    let (a, _) = render(
        inputs(&settings, &source, None),
        RenderMode::EXPORT,
        2.0,
        &config,
    )
    .unwrap();
    let (b, _) = render(
        inputs(&settings, &source, None),
        RenderMode::EXPORT,
        2.0,
        &config,
    )
    .unwrap();
    assert_eq!(a.pixmap().data(), b.pixmap().data());
    assert_eq!((a.width(), a.height()), (340, 440));
}

#[test]
fn wallpaper_covers_the_clipped_canvas() {
    let settings = flat(Background::Wallpaper {
        path: "wide.png".into(),
    });
    let source = source(100, 100);
    let wallpaper = RgbaImage::from_pixel(60, 20, Rgba([250, 10, 10, 255]));
    let config = RenderConfig::default();
    let (surface, layout) = render(
        inputs(&settings, &source, Some(&wallpaper)),
        RenderMode::EXPORT,
        1.0,
        &config,
    )
    .unwrap();
    let (cw, ch) = (layout.canvas_width as u32, layout.canvas_height as u32);
    for &(x, y) in &[(cw / 2, 0), (cw / 2, ch - 1), (0, ch / 2), (cw - 1, ch / 2), (50, 50)] {
        let px = surface.pixel_rgba(x, y).unwrap();
        assert_eq!(px[3], 255, "gap at ({x},{y})");
        assert!(within(px[0], 250, 2), "({x},{y}) = {px:?}");
    }
}

#[test]
fn legacy_pattern_color_still_resolves() {
    let settings = flat(Background::Pattern {
        pattern: None,
        color: Some(PatternId::Dots.preset_color()),
    });
    let source = source(40, 40);
    let (surface, layout) = render(
        inputs(&settings, &source, None),
        RenderMode::EXPORT,
        1.0,
        &RenderConfig::default(),
    )
    .unwrap();
    let mid_padding = surface
        .pixel_rgba((layout.canvas_width / 2.0) as u32, 20)
        .unwrap();
    assert_eq!(mid_padding[3], 255);
}

#[test]
fn missing_source_is_a_precondition_and_draws_nothing() {
    let settings = flat(Background::default());
    let mut surface = Surface::new(10, 10, 1.0).unwrap();
    surface.pixmap_mut().fill(tiny_skia::Color::from_rgba8(1, 2, 3, 255));
    let before = surface.pixmap().data().to_vec();
    let err = composite(
        &mut surface,
        RenderInputs {
            settings: &settings,
            source: None,
            wallpaper: None,
            generator: &MeshGradient,
        },
        RenderMode::EXPORT,
        &RenderConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Precondition(_)));
    assert_eq!(surface.pixmap().data(), &before[..]);
}

#[test]
fn invalid_settings_are_rejected_before_drawing() {
    let settings = SettingsSnapshot {
        scale: -1.0,
        ..SettingsSnapshot::default()
    };
    let source = source(4, 4);
    let err = render(
        inputs(&settings, &source, None),
        RenderMode::PREVIEW,
        1.0,
        &RenderConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidSettings(_)));
}
