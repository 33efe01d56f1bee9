use super::*;
use crate::raster::buffer::PixelAccess;

fn base() -> Arc<ImageBuffer> {
    Arc::new(ImageBuffer::filled(100, 100, [0, 0, 0, 255]).unwrap())
}

fn patch(w: u32, h: u32, px: [u8; 4]) -> Arc<ImageBuffer> {
    Arc::new(ImageBuffer::filled(w, h, px).unwrap())
}

fn blend_default(base: &Arc<ImageBuffer>, p: &Arc<ImageBuffer>) -> Arc<ImageBuffer> {
    RegionCompositor::default().blend_region(
        &mut SmartCropper::default(),
        base,
        p,
        &FaceRegion::default(),
        None,
        true,
    )
}

#[test]
fn centre_takes_patch_colour() {
    let out = blend_default(&base(), &patch(40, 30, [250, 120, 10, 255]));
    assert_eq!(out.get_pixel(50, 35).unwrap(), [250, 120, 10, 255]);
}

#[test]
fn edge_keeps_base_colour() {
    let out = blend_default(&base(), &patch(40, 30, [250, 120, 10, 255]));
    assert_eq!(out.get_pixel(30, 35).unwrap(), [0, 0, 0, 255]);
    assert_eq!(out.get_pixel(50, 20).unwrap(), [0, 0, 0, 255]);
    assert_eq!(out.get_pixel(5, 5).unwrap(), [0, 0, 0, 255]);
    let near = out.get_pixel(31, 35).unwrap();
    assert!(near[0] > 0 && near[0] < 250, "{near:?}");
}

#[test]
fn feather_weight_shape() {
    assert_eq!(feather_weight(0.5, 0.5, 0.05), 1.0);
    assert_eq!(feather_weight(0.0, 0.5, 0.05), 0.0);
    assert!((feather_weight(0.025, 0.5, 0.05) - 0.5).abs() < 1e-9);
    assert_eq!(feather_weight(0.0, 0.5, 0.0), 1.0);
}

#[test]
fn transparent_patch_pixels_are_skipped() {
    let out = blend_default(&base(), &patch(40, 30, [255, 255, 255, 1]));
    assert_eq!(out.get_pixel(50, 35).unwrap(), [0, 0, 0, 255]);
}

#[test]
fn full_portrait_patch_is_cropped_first() {
    // Face band of the portrait (Expression crop rows 45..95) is red, the rest blue.
    let mut portrait = ImageBuffer::filled(100, 100, [0, 0, 255, 255]).unwrap();
    for y in 45..95 {
        for x in 15..85 {
            portrait.set_pixel(x, y, [255, 0, 0, 255]).unwrap();
        }
    }
    let out = blend_default(&base(), &Arc::new(portrait));
    assert_eq!(out.get_pixel(50, 35).unwrap(), [255, 0, 0, 255]);
}

#[test]
fn failure_returns_base() {
    let b = base();
    let degenerate = FaceRegion {
        width: 0.0,
        ..FaceRegion::default()
    };
    let out = RegionCompositor::default().blend_region(
        &mut SmartCropper::default(),
        &b,
        &patch(10, 10, [255, 255, 255, 255]),
        &degenerate,
        None,
        false,
    );
    assert!(Arc::ptr_eq(&out, &b));
}

#[test]
fn gpu_only_inputs_are_read_back() {
    let b = Arc::new(
        ImageBuffer::filled(100, 100, [0, 0, 0, 255])
            .unwrap()
            .with_access(PixelAccess::GpuOnly),
    );
    let out = blend_default(&b, &patch(40, 30, [9, 9, 9, 255]));
    assert!(out.is_readable());
    assert_eq!(out.get_pixel(50, 35).unwrap(), [9, 9, 9, 255]);
}

#[test]
fn keyed_results_are_cached() {
    let mut rc = RegionCompositor::default();
    let mut cropper = SmartCropper::default();
    let b = base();
    let p = patch(40, 30, [1, 1, 1, 255]);
    let r = FaceRegion::default();
    let a = rc.blend_region(&mut cropper, &b, &p, &r, Some("Echo|happy"), true);
    let c = rc.blend_region(&mut cropper, &b, &p, &r, Some("Echo|happy"), true);
    assert!(Arc::ptr_eq(&a, &c));
    assert!(rc.invalidate("Echo|happy"));
    assert_eq!(rc.cache_stats().entries, 0);
}

#[test]
fn region_validation_and_table_fallback() {
    assert!(FaceRegion::default().validate().is_ok());
    let bad = FaceRegion {
        feather_radius: 0.2,
        ..FaceRegion::default()
    };
    assert!(bad.validate().is_err());

    let mut t = FaceRegionTable::default();
    assert_eq!(t.get("Echo"), FaceRegion::default());
    let custom = FaceRegion {
        center_y: 0.3,
        ..FaceRegion::default()
    };
    t.set("Echo", custom).unwrap();
    assert_eq!(t.get("Echo"), custom);
    assert_eq!(t.get("Nova"), FaceRegion::default());
    assert!(t.set("Nova", bad).is_err());
    assert_eq!(t.len(), 2);
}

#[test]
fn table_deserializes_from_map() {
    let t: FaceRegionTable = serde_json::from_str(
        r#"{"Default": {}, "Echo": {"center_x": 0.45, "feather_radius": 0.02}}"#,
    )
    .unwrap();
    assert_eq!(t.get("Echo").center_x, 0.45);
    assert_eq!(t.get("Echo").width, 0.4);
    t.validate().unwrap();
}
