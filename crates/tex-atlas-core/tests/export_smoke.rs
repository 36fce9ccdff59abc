use tex_atlas_core::prelude::*;

#[test]
fn export_json_array_and_hash_smoke() {
    let cfg = PackSettings::builder()
        .with_max_dimensions(256, 256)
        .allow_rotation(true)
        .build();
    let items = vec![("a", 32, 16), ("b", 10, 10)];
    let layout = tex_atlas_core::pack_layout(items, cfg).expect("pack");

    // json-array
    let ja = tex_atlas_core::to_json_array(&layout);
    let obj = ja.as_object().expect("object");
    assert!(obj.contains_key("pages"));
    assert!(obj.contains_key("meta"));
    let pages = obj["pages"].as_array().expect("pages");
    assert_eq!(pages.len(), layout.pages.len());
    let frames = pages[0]["frames"].as_array().expect("frames");
    assert_eq!(frames.len(), 2);
    assert!(frames.iter().any(|f| f["name"] == "a"));

    // json-hash
    let jh = tex_atlas_core::to_json_hash(&layout);
    let obj = jh.as_object().expect("object");
    assert!(obj.contains_key("frames"));
    assert!(obj.contains_key("meta"));
    let b = &obj["frames"]["b"];
    let frame = layout.frame("b").expect("frame");
    assert_eq!(b["frame"]["x"], frame.rect.x);
    assert_eq!(b["sourceSize"]["w"], 10);
    assert_eq!(b["page"], 0);
}

#[test]
fn meta_reflects_settings() {
    let cfg = PackSettings::builder()
        .padding(3, 1)
        .duplicate_padding(true)
        .format(PixelFormat::Rgb8)
        .arrayed(true)
        .build();
    let layout = pack_layout(vec![("x", 8, 8)], cfg).expect("pack");
    let json = tex_atlas_core::to_json_hash(&layout);
    let meta = &json["meta"];
    assert_eq!(meta["app"], "tex-atlas");
    assert_eq!(meta["schema_version"], "1");
    assert_eq!(meta["format"], "RGB888");
    assert_eq!(meta["padding"][0], 3);
    assert_eq!(meta["padding"][1], 1);
    assert_eq!(meta["duplicate_padding"], true);
    assert_eq!(meta["arrayed"], true);
    assert_eq!(meta["power_of_two"], true);
}
