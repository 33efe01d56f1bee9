use super::*;

#[test]
fn pixel_rect_edges_and_fit() {
    let r = PixelRect::new(150, 450, 700, 500);
    assert_eq!(r.right(), 850);
    assert_eq!(r.bottom(), 950);
    assert_eq!(r.area(), 350_000);
    assert!(r.fits_within(1000, 1000));
    assert!(!r.fits_within(800, 1000));
}

#[test]
fn rgb_scaled_saturates() {
    let c = Rgb8::new(100, 200, 250);
    assert_eq!(c.scaled(0.3), Rgb8::new(30, 60, 75));
    assert_eq!(c.scaled(1.2), Rgb8::new(120, 240, 255));
}

#[test]
fn rgb_parses_triplets() {
    assert_eq!("10, 20,30".parse::<Rgb8>().unwrap(), Rgb8::new(10, 20, 30));
    assert!("10,20".parse::<Rgb8>().is_err());
    assert!("10,20,300".parse::<Rgb8>().is_err());
}

#[test]
fn rgb_serde_is_an_array() {
    let json = serde_json::to_string(&Rgb8::new(1, 2, 3)).unwrap();
    assert_eq!(json, "[1,2,3]");
    let back: Rgb8 = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Rgb8::new(1, 2, 3));
}

#[test]
fn norm_rect_degeneracy() {
    assert!(is_non_degenerate(norm_rect(0.1, 0.6, 0.8, 0.4)));
    assert!(!is_non_degenerate(norm_rect(0.1, 0.6, 0.0, 0.4)));
    assert!(!is_non_degenerate(norm_rect(f64::NAN, 0.0, 1.0, 1.0)));
    assert!(!is_non_degenerate(norm_rect(0.5, 0.5, -0.2, 0.2)));
}
