use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "visage_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn normalize_path_slash_normalization() {
    assert_eq!(normalize_rel_path("a/b").unwrap(), "a/b");
    assert_eq!(normalize_rel_path("a\\./b").unwrap(), "a/b");
    assert!(normalize_rel_path("../x").is_err());
    assert!(normalize_rel_path("/abs").is_err());
    assert!(normalize_rel_path("").is_err());
}

#[test]
fn asset_path_joins_segments() {
    assert_eq!(asset_path("layered", "Echo", "body"), "layered/Echo/body");
    assert_eq!(asset_path("layered/", "Echo", "body"), "layered/Echo/body");
    assert_eq!(asset_path("", "Echo", "base"), "Echo/base");
}

#[test]
fn memory_store_is_exact_match() {
    let mut store = MemoryAssetStore::new();
    store.insert("layered/Echo/body", ImageBuffer::new_transparent(1, 1).unwrap());
    assert!(store.lookup("layered/Echo/body").is_some());
    assert!(store.lookup("layered/Echo/Body").is_none());
    assert!(store.lookup("layered/Echo/").is_none());
    assert!(store.remove("layered/Echo/body"));
    assert!(store.is_empty());
}

#[test]
fn dir_store_decodes_once_and_memoizes_misses() {
    let tmp = temp_dir("dir_store");
    std::fs::create_dir_all(tmp.join("layered/Echo")).unwrap();

    let img = ImageBuffer::filled(2, 2, [1, 2, 3, 255]).unwrap();
    let bytes = crate::assets::decode::encode_png(&img).unwrap();
    std::fs::write(tmp.join("layered/Echo/body.png"), bytes).unwrap();

    let store = DirAssetStore::new(&tmp);
    let a = store.lookup("layered/Echo/body").unwrap();
    let b = store.lookup("layered\\Echo\\body").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.get_pixel(1, 1).unwrap(), [1, 2, 3, 255]);
    assert_eq!(store.decode_count("layered/Echo/body"), 1);

    assert!(store.lookup("layered/Echo/hair_front").is_none());
    assert!(store.lookup("../escape").is_none());

    store.reload();
    store.lookup("layered/Echo/body").unwrap();
    assert_eq!(store.decode_count("layered/Echo/body"), 2);

    std::fs::remove_dir_all(&tmp).ok();
}
