use super::*;
use crate::foundation::core::norm_rect;
use crate::raster::buffer::PixelAccess;

#[test]
fn full_blit_copies_pixels_exactly() {
    let mut src = ImageBuffer::new_transparent(3, 2).unwrap();
    src.set_pixel(0, 0, [1, 2, 3, 255]).unwrap();
    src.set_pixel(2, 1, [7, 8, 9, 100]).unwrap();

    let mut rt = RenderTarget::new(3, 2).unwrap();
    let full = rt.full_rect();
    rt.blit(&src, full).unwrap();
    assert_eq!(rt.read_back().unwrap(), src);
}

#[test]
fn blit_scales_into_sub_rect() {
    let src = ImageBuffer::filled(1, 1, [50, 60, 70, 255]).unwrap();
    let mut rt = RenderTarget::new(4, 4).unwrap();
    rt.blit(&src, norm_rect(1.0, 1.0, 2.0, 2.0)).unwrap();
    let out = rt.read_back().unwrap();
    assert_eq!(out.get_pixel(0, 0).unwrap(), [0, 0, 0, 0]);
    assert_eq!(out.get_pixel(1, 1).unwrap(), [50, 60, 70, 255]);
    assert_eq!(out.get_pixel(2, 2).unwrap(), [50, 60, 70, 255]);
    assert_eq!(out.get_pixel(3, 3).unwrap(), [0, 0, 0, 0]);
}

#[test]
fn blit_reads_gpu_only_sources() {
    let src = ImageBuffer::filled(2, 2, [1, 1, 1, 255])
        .unwrap()
        .with_access(PixelAccess::GpuOnly);
    let mut rt = RenderTarget::new(2, 2).unwrap();
    let full = rt.full_rect();
    rt.blit(&src, full).unwrap();
    let out = rt.into_image().unwrap();
    assert!(out.is_readable());
    assert_eq!(out.get_pixel(1, 1).unwrap(), [1, 1, 1, 255]);
}

#[test]
fn blend_then_replace() {
    let base = ImageBuffer::filled(2, 2, [0, 0, 0, 255]).unwrap();
    let top = ImageBuffer::filled(2, 2, [255, 255, 255, 128]).unwrap();
    let mut rt = RenderTarget::new(2, 2).unwrap();
    let full = rt.full_rect();
    rt.blit(&base, full).unwrap();
    rt.blit(&top, full).unwrap();
    assert_eq!(rt.read_back().unwrap().get_pixel(0, 0).unwrap(), [128, 128, 128, 255]);

    rt.blit_replace(&top, full).unwrap();
    assert_eq!(rt.read_back().unwrap().get_pixel(0, 0).unwrap(), [255, 255, 255, 128]);

    rt.clear();
    assert_eq!(rt.read_back().unwrap().get_pixel(1, 1).unwrap(), [0, 0, 0, 0]);
}

#[test]
fn degenerate_destination_is_rejected() {
    let src = ImageBuffer::filled(1, 1, [1, 1, 1, 255]).unwrap();
    let mut rt = RenderTarget::new(2, 2).unwrap();
    assert!(rt.blit(&src, norm_rect(0.0, 0.0, 0.0, 1.0)).is_err());
}
