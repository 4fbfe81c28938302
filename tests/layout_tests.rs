use framesnap::processing::layout::{compute_layout, cover_fit};
use framesnap::render::transform::compose_frame_transform;
use framesnap::settings_model::{BrowserStyle, SettingsSnapshot};

fn scenario(browser_style: BrowserStyle) -> SettingsSnapshot {
    SettingsSnapshot {
        scale: 1.0,
        padding: 100.0,
        browser_style,
        ..SettingsSnapshot::default()
    }
}

#[test]
fn plain_frame_geometry() {
    let layout = compute_layout(&scenario(BrowserStyle::None), 800, 600);
    assert_eq!((layout.canvas_width, layout.canvas_height), (1000.0, 800.0));
    assert_eq!((layout.image_x, layout.image_y), (100.0, 100.0));
    assert_eq!(layout.chrome_height, 0.0);
}

#[test]
fn chrome_frame_geometry() {
    let layout = compute_layout(&scenario(BrowserStyle::Chrome), 800, 600);
    assert_eq!(layout.canvas_height, 860.0);
    assert_eq!((layout.image_x, layout.image_y), (100.0, 160.0));
    // band spans (100,100) to (900,160)
    assert_eq!(layout.frame_top(), 100.0);
    assert_eq!(layout.image_x + layout.scaled_width, 900.0);
    assert_eq!(layout.frame_top() + layout.chrome_height, 160.0);
}

#[test]
fn canvas_invariant_holds_across_inputs() {
    for &(w, h) in &[(1u32, 1u32), (37, 91), (1920, 1080)] {
        for &scale in &[0.25, 1.0, 1.4, 3.0] {
            for &padding in &[0.0, 12.5, 140.0] {
                for style in [BrowserStyle::None, BrowserStyle::Safari] {
                    let settings = SettingsSnapshot {
                        scale,
                        padding,
                        browser_style: style,
                        ..SettingsSnapshot::default()
                    };
                    let l = compute_layout(&settings, w, h);
                    assert!(l.chrome_height == 0.0 || l.chrome_height == 60.0);
                    assert_eq!(l.canvas_width, scale * w as f64 + 2.0 * padding);
                    assert_eq!(
                        l.canvas_height,
                        scale * h as f64 + l.chrome_height + 2.0 * padding
                    );
                }
            }
        }
    }
}

#[test]
fn zero_angles_compose_to_identity() {
    let settings = scenario(BrowserStyle::Chrome);
    let layout = compute_layout(&settings, 800, 600);
    let coeffs = compose_frame_transform(&settings, &layout).as_coeffs();
    let identity = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    for (got, want) in coeffs.iter().zip(identity) {
        assert!((got - want).abs() <= 1e-9, "{coeffs:?}");
    }
}

#[test]
fn cover_fit_crops_evenly_without_gaps() {
    for &(cw, ch, sw, sh) in &[
        (1000.0, 800.0, 1920u32, 1080u32),
        (300.0, 900.0, 640, 640),
        (500.0, 500.0, 10, 3000),
    ] {
        let fit = cover_fit(cw, ch, sw, sh);
        assert!(fit.width >= cw - 1e-9 && fit.height >= ch - 1e-9);
        assert!(fit.offset_x <= 0.0 && fit.offset_y <= 0.0);
        let right_overflow = fit.width + fit.offset_x - cw;
        let bottom_overflow = fit.height + fit.offset_y - ch;
        assert!((right_overflow + fit.offset_x).abs() < 1e-9);
        assert!((bottom_overflow + fit.offset_y).abs() < 1e-9);
    }
}
