use image::RgbaImage;
use tex_atlas_core::error::AtlasError;
use tex_atlas_core::prelude::*;

#[test]
fn ids_follow_insertion_order() {
    let a = NameRegistry::from_names(["hero", "tree", "rock"]).expect("registry");
    let b = NameRegistry::from_names(vec!["hero".to_string(), "tree".into(), "rock".into()])
        .expect("registry");
    for (id, name) in a.iter() {
        assert_eq!(b.id(name), Some(id));
        assert_eq!(b.name(id), Some(name));
    }
    assert_eq!(a.id("rock"), Some(2));
    assert_eq!(a.id("missing"), None);
    assert_eq!(a.name(7), None);
}

#[test]
fn duplicate_names_are_rejected() {
    let err = NameRegistry::from_names(["a", "b", "a"]).unwrap_err();
    assert!(matches!(err, AtlasError::DuplicateName(ref n) if n == "a"));

    let mut assembly = TextureAssembly::new();
    assembly.insert("x", (4u32, 4u32)).expect("first");
    assert!(matches!(
        assembly.insert("x", (8, 8)),
        Err(AtlasError::DuplicateName(_))
    ));
    assert_eq!(assembly.get("x"), Some(&(4, 4)));

    let items = vec![("dup", 4, 4), ("dup", 8, 8)];
    assert!(matches!(
        pack_layout(items, PackSettings::default()),
        Err(AtlasError::DuplicateName(_))
    ));
}

#[test]
fn collected_assembly_keeps_last_duplicate() {
    let assembly: TextureAssembly<(u32, u32)> =
        vec![("a", (1, 1)), ("b", (2, 2)), ("a", (3, 3))].into_iter().collect();
    assert_eq!(assembly.len(), 2);
    assert_eq!(assembly.get_index(0), Some(("a", &(3, 3))));
    assert_eq!(assembly.names().collect::<Vec<_>>(), vec!["a", "b"]);

    let strict =
        TextureAssembly::try_from_entries(vec![("a", (1, 1)), ("b", (2, 2)), ("a", (3, 3))]);
    assert!(matches!(strict, Err(AtlasError::DuplicateName(ref n)) if n == "a"));
    let ok = TextureAssembly::try_from_entries(vec![("a", (1u32, 1u32)), ("b", (2, 2))])
        .expect("unique names");
    assert_eq!(ok.get_index(1), Some(("b", &(2, 2))));
}

#[test]
fn placements_are_recorded_per_name() {
    let items = vec![("wide", 40, 10), ("tall", 10, 40), ("dot", 2, 2)];
    let layout = pack_layout(items, PackSettings::default()).expect("layout");
    for name in ["wide", "tall", "dot"] {
        let placement = layout.registry.placement_by_name(name).expect("placement");
        let frame = layout.frame(name).expect("frame");
        assert_eq!(placement.rect, frame.rect);
        assert_eq!(placement.page, 0);
        // edge padding offsets content from the page border
        assert!(frame.rect.x >= 2 && frame.rect.y >= 2);
    }
    assert!(layout.frame("nope").is_none());
}

#[test]
fn unknown_names_get_a_blank_region() {
    let assembly = TextureAssembly::new()
        .with("only", RgbaImage::new(8, 8))
        .expect("assembly");
    let atlas = pack_images_raster(&assembly, PackSettings::default()).expect("pack");
    let missing = atlas.texture_region("not-there");
    assert!(missing.is_blank());
    assert_eq!(missing, TextureRegion::blank());

    let region = atlas.texture_region("only");
    assert!(!region.is_blank());
    assert_eq!((region.rect.w, region.rect.h), (8, 8));
    let texture = atlas.texture(region.texture).expect("texture");
    assert!((region.u0 - region.rect.x as f32 / texture.width as f32).abs() < 1e-6);
    assert!((region.v1 - region.rect.bottom() as f32 / texture.height as f32).abs() < 1e-6);
    assert!(atlas.texture(5).is_none());
}

#[test]
fn regions_point_at_their_page_texture() {
    let assembly: TextureAssembly<RgbaImage> = (0..6)
        .map(|i| (format!("p{i}"), RgbaImage::new(24, 24)))
        .collect();
    let settings = PackSettings::builder()
        .with_max_dimensions(32, 32)
        .padding(0, 0)
        .build();
    let atlas = pack_images_raster(&assembly, settings).expect("pack");
    assert_eq!(atlas.textures().len(), 6);
    for (name, region) in atlas.regions() {
        let frame = atlas.layout().frame(name).expect("frame");
        let placement = atlas.layout().registry.placement_by_name(name).expect("placement");
        assert_eq!(region.texture, placement.page);
        assert_eq!(region.layer, 0);
        assert_eq!(region.rect, frame.rect);
    }
    let stats = atlas.stats();
    assert_eq!(stats.num_pages, 6);
    let (textures, layout) = atlas.into_parts();
    assert_eq!(textures.len(), layout.pages.len());
}
