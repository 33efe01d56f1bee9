use super::*;
use crate::assets::lookup::MemoryAssetStore;
use crate::raster::buffer::PixelAccess;

fn solid(px: [u8; 4]) -> ImageBuffer {
    ImageBuffer::filled(4, 4, px).unwrap()
}

fn compositor(path: CompositePath) -> LayerCompositor {
    LayerCompositor::new("layered", path, false, CacheBudget::default())
}

#[test]
fn names_follow_fixed_order() {
    let names = layer_names(Expression::Happy, "default", &LayerSelection::default());
    assert_eq!(
        names.as_slice(),
        [
            "background",
            "body",
            "hair_back",
            "happy_eyes",
            "happy_mouth",
            "hair_front"
        ]
    );
    let names = layer_names(Expression::Sad, "maid", &LayerSelection::eyes("closed_eyes"));
    assert_eq!(names[3], "closed_eyes");
    assert_eq!(names[4], "sad_mouth");
    assert_eq!(names.last().unwrap(), "outfit_maid");
}

#[test]
fn missing_everything_is_none() {
    let store = MemoryAssetStore::new();
    let mut c = compositor(CompositePath::Cpu);
    assert!(c.composite(&store, "Echo", Expression::Neutral, "default").is_none());
}

#[test]
fn later_opaque_layer_wins() {
    let mut store = MemoryAssetStore::new();
    store.insert("layered/Echo/body", solid([200, 0, 0, 255]));
    let mut mouth = ImageBuffer::new_transparent(4, 4).unwrap();
    mouth.set_pixel(1, 1, [0, 0, 255, 255]).unwrap();
    store.insert("layered/Echo/neutral_mouth", mouth);

    for path in [CompositePath::Cpu, CompositePath::Gpu] {
        let mut c = compositor(path);
        let out = c
            .composite(&store, "Echo", Expression::Neutral, "default")
            .unwrap();
        assert_eq!(out.get_pixel(1, 1).unwrap(), [0, 0, 255, 255]);
        assert_eq!(out.get_pixel(0, 0).unwrap(), [200, 0, 0, 255]);
    }
}

#[test]
fn cpu_and_blit_paths_agree() {
    let mut store = MemoryAssetStore::new();
    let mut bg = ImageBuffer::new_transparent(8, 8).unwrap();
    let mut hair = ImageBuffer::new_transparent(8, 8).unwrap();
    for y in 0..8 {
        for x in 0..8 {
            bg.set_pixel(x, y, [(x * 30) as u8, (y * 30) as u8, 90, 255])
                .unwrap();
            hair.set_pixel(x, y, [10, 220, (x * y) as u8, (x * 32) as u8])
                .unwrap();
        }
    }
    store.insert("layered/Echo/background", bg);
    store.insert(
        "layered/Echo/hair_front",
        hair.with_access(PixelAccess::GpuOnly),
    );

    let a = compositor(CompositePath::Cpu)
        .composite(&store, "Echo", Expression::Neutral, "default")
        .unwrap();
    let b = compositor(CompositePath::Gpu)
        .composite(&store, "Echo", Expression::Neutral, "default")
        .unwrap();
    assert_eq!(a.as_bytes().unwrap(), b.as_bytes().unwrap());
}

#[test]
fn mismatched_layer_is_skipped() {
    let mut store = MemoryAssetStore::new();
    store.insert("layered/Echo/body", solid([10, 10, 10, 255]));
    store.insert(
        "layered/Echo/hair_front",
        ImageBuffer::filled(2, 2, [255, 255, 255, 255]).unwrap(),
    );
    let out = compositor(CompositePath::Cpu)
        .composite(&store, "Echo", Expression::Neutral, "default")
        .unwrap();
    assert_eq!((out.width(), out.height()), (4, 4));
    assert_eq!(out.get_pixel(0, 0).unwrap(), [10, 10, 10, 255]);
}

#[test]
fn cache_hits_and_invalidation() {
    let mut store = MemoryAssetStore::new();
    store.insert("layered/Echo/body", solid([1, 2, 3, 255]));
    let mut c = compositor(CompositePath::Cpu);

    let a = c.composite(&store, "Echo", Expression::Neutral, "default").unwrap();
    let b = c.composite(&store, "Echo", Expression::Neutral, "default").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(c.cache_stats().hits, 1);

    c.composite_with(
        &store,
        "Echo",
        Expression::Neutral,
        "default",
        &LayerSelection::mouth("A_mouth"),
    )
    .unwrap();
    assert_eq!(c.cache_stats().entries, 2);
    assert_eq!(c.clear_cache("Echo", Expression::Neutral), 2);

    let d = c.composite(&store, "Echo", Expression::Neutral, "default").unwrap();
    assert!(!Arc::ptr_eq(&a, &d));
    assert_eq!(a.as_bytes().unwrap(), d.as_bytes().unwrap());

    c.clear_all();
    assert_eq!(c.cache_stats().entries, 0);
}

#[test]
fn preload_composes_each_expression() {
    let mut store = MemoryAssetStore::new();
    store.insert("layered/Echo/body", solid([1, 2, 3, 255]));
    let mut c = compositor(CompositePath::Cpu);
    assert_eq!(c.preload_all(&store, "Echo", "default"), Expression::ALL.len());
    assert_eq!(c.release_persona("Echo"), Expression::ALL.len());
    assert_eq!(c.preload_all(&store, "Nova", "default"), 0);
}
