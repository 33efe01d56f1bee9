use super::*;

#[test]
fn over_transparent_layer_is_noop() {
    let base = [10, 20, 30, 200];
    assert_eq!(over(base, [255, 255, 255, 0]), base);
}

#[test]
fn over_opaque_layer_replaces_base() {
    let base = [0, 0, 0, 255];
    let layer = [255, 0, 0, 255];
    assert_eq!(over(base, layer), layer);
}

#[test]
fn over_transparent_base_takes_layer_unchanged() {
    let layer = [100, 110, 120, 128];
    assert_eq!(over([0, 0, 0, 0], layer), layer);
}

#[test]
fn over_half_alpha_mixes_and_keeps_max_alpha() {
    let base = [0, 0, 0, 255];
    let layer = [255, 255, 255, 128];
    let out = over(base, layer);
    assert_eq!(out, [128, 128, 128, 255]);

    let out = over([200, 0, 0, 50], [0, 0, 200, 100]);
    assert_eq!(out[3], 100);
}

#[test]
fn crossfade_endpoints() {
    let a = [10, 20, 30, 40];
    let b = [200, 210, 220, 230];
    assert_eq!(crossfade(a, b, 0.0), a);
    assert_eq!(crossfade(a, b, 1.0), b);
    assert_eq!(crossfade(a, b, f32::NAN), a);
}

#[test]
fn lerp_px_full_weight_is_patch() {
    let base = [1, 2, 3, 4];
    let patch = [200, 150, 100, 255];
    assert_eq!(lerp_px(base, patch, 1.0), patch);
    assert_eq!(lerp_px(base, patch, 0.0), base);
}

#[test]
fn over_in_place_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], false).is_err());
}

#[test]
fn over_in_place_parallel_matches_serial() {
    let n = 128 * 128 * 4;
    let src: Vec<u8> = (0..n).map(|i| (i * 7 % 256) as u8).collect();
    let base: Vec<u8> = (0..n).map(|i| (i * 13 % 256) as u8).collect();

    let mut serial = base.clone();
    over_in_place(&mut serial, &src, false).unwrap();
    let mut parallel = base;
    over_in_place(&mut parallel, &src, true).unwrap();
    assert_eq!(serial, parallel);
}
