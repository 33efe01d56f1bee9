use super::*;

#[test]
fn allocation_matches_dimensions() {
    let img = ImageBuffer::new_transparent(3, 2).unwrap();
    assert_eq!(img.byte_len(), 3 * 2 * 4);
    assert_eq!(img.get_pixel(2, 1).unwrap(), TRANSPARENT);
    assert!(ImageBuffer::new_transparent(0, 4).is_err());
    assert!(ImageBuffer::from_rgba8(2, 2, vec![0; 15]).is_err());
}

#[test]
fn pixel_round_trip_and_bounds() {
    let mut img = ImageBuffer::new_transparent(4, 4).unwrap();
    img.set_pixel(3, 0, [1, 2, 3, 4]).unwrap();
    assert_eq!(img.get_pixel(3, 0).unwrap(), [1, 2, 3, 4]);
    assert!(matches!(
        img.get_pixel(4, 0),
        Err(VisageError::Geometry(_))
    ));
}

#[test]
fn gpu_only_buffers_refuse_direct_access() {
    let img = ImageBuffer::filled(2, 2, [9, 9, 9, 255])
        .unwrap()
        .with_access(PixelAccess::GpuOnly);
    assert!(!img.is_readable());
    assert!(matches!(img.get_pixel(0, 0), Err(VisageError::Unreadable(_))));
    assert!(img.as_bytes().is_err());
    assert!(img.read_block(PixelRect::new(0, 0, 1, 1)).is_err());
}

#[test]
fn block_copy_preserves_layout() {
    let mut img = ImageBuffer::new_transparent(4, 3).unwrap();
    for y in 0..3 {
        for x in 0..4 {
            img.set_pixel(x, y, [x as u8, y as u8, 0, 255]).unwrap();
        }
    }
    let block = img.read_block(PixelRect::new(1, 1, 2, 2)).unwrap();
    assert_eq!(block.width(), 2);
    assert_eq!(block.get_pixel(0, 0).unwrap(), [1, 1, 0, 255]);
    assert_eq!(block.get_pixel(1, 1).unwrap(), [2, 2, 0, 255]);

    let mut target = ImageBuffer::new_transparent(4, 3).unwrap();
    target.write_block(2, 1, &block).unwrap();
    assert_eq!(target.get_pixel(2, 1).unwrap(), [1, 1, 0, 255]);
    assert_eq!(target.get_pixel(3, 2).unwrap(), [2, 2, 0, 255]);
    assert!(target.write_block(3, 2, &block).is_err());
    assert!(img.read_block(PixelRect::new(3, 0, 2, 1)).is_err());
}

#[test]
fn fingerprint_tracks_content() {
    let a = ImageBuffer::filled(2, 2, [1, 2, 3, 4]).unwrap();
    let b = ImageBuffer::filled(2, 2, [1, 2, 3, 4]).unwrap();
    let c = ImageBuffer::filled(2, 2, [1, 2, 3, 5]).unwrap();
    let d = ImageBuffer::filled(1, 4, [1, 2, 3, 4]).unwrap();
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_ne!(a.fingerprint(), c.fingerprint());
    assert_ne!(a.fingerprint(), d.fingerprint());
}

#[test]
fn rgba_image_conversion_round_trips() {
    let img = ImageBuffer::filled(2, 1, [10, 20, 30, 40]).unwrap();
    let rgba = img.to_rgba_image().unwrap();
    assert_eq!(rgba.get_pixel(1, 0).0, [10, 20, 30, 40]);
    let back = ImageBuffer::from_rgba_image(rgba).unwrap();
    assert_eq!(back, img);
}
