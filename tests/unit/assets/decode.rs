use super::*;

#[test]
fn png_round_trip_keeps_straight_alpha() {
    let img = ImageBuffer::from_rgba8(1, 1, vec![100, 50, 200, 128]).unwrap();
    let bytes = encode_png(&img).unwrap();
    let back = decode_image(&bytes).unwrap();
    assert_eq!(back.width(), 1);
    assert_eq!(back.get_pixel(0, 0).unwrap(), [100, 50, 200, 128]);
}

#[test]
fn garbage_bytes_are_a_decode_error() {
    let err = decode_image(b"not an image").unwrap_err();
    assert!(matches!(err, VisageError::Decode(_)));
}
