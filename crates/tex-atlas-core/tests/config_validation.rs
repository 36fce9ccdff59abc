use tex_atlas_core::error::AtlasError;
use tex_atlas_core::prelude::*;

#[test]
fn defaults_are_valid() {
    let cfg = PackSettings::default();
    assert!(cfg.validate().is_ok());
    assert_eq!((cfg.padding_x, cfg.padding_y), (2, 2));
    assert_eq!((cfg.max_width, cfg.max_height), (1024, 1024));
    assert_eq!((cfg.min_width, cfg.min_height), (16, 16));
    assert!(cfg.power_of_two && cfg.edge_padding);
    assert!(!cfg.allow_rotation && !cfg.duplicate_padding && !cfg.square);
    assert_eq!(cfg.heuristics, FreeRectChoiceHeuristic::ALL.to_vec());
}

#[test]
fn test_zero_width() {
    let cfg = PackSettings {
        max_width: 0,
        max_height: 1024,
        ..Default::default()
    };
    match cfg.validate() {
        Err(AtlasError::InvalidDimensions { width, height }) => {
            assert_eq!(width, 0);
            assert_eq!(height, 1024);
        }
        other => panic!("Expected InvalidDimensions error, got {other:?}"),
    }
}

#[test]
fn test_min_above_max() {
    let cfg = PackSettings::builder()
        .with_max_dimensions(64, 64)
        .with_min_dimensions(128, 16)
        .build();
    assert!(matches!(cfg.validate(), Err(AtlasError::InvalidConfig(_))));
}

#[test]
fn test_padding_leaves_no_space() {
    let cfg = PackSettings::builder()
        .with_max_dimensions(64, 64)
        .with_min_dimensions(0, 0)
        .padding(32, 0)
        .build();
    match cfg.validate() {
        Err(AtlasError::InvalidConfig(msg)) => assert!(msg.contains("edge padding")),
        other => panic!("Expected InvalidConfig error, got {other:?}"),
    }
    // without edge padding the same padding is fine
    let cfg = PackSettings {
        edge_padding: false,
        ..cfg
    };
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_pow2_requires_pow2_max() {
    let cfg = PackSettings::builder().with_max_dimensions(1000, 1024).build();
    assert!(matches!(cfg.validate(), Err(AtlasError::InvalidConfig(_))));
    let cfg = PackSettings { power_of_two: false, ..cfg };
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_square_min_above_smaller_side() {
    let cfg = PackSettings::builder()
        .with_max_dimensions(256, 128)
        .with_min_dimensions(200, 16)
        .build();
    assert!(cfg.validate().is_ok());
    let cfg = PackSettings { square: true, ..cfg };
    match cfg.validate() {
        Err(AtlasError::InvalidConfig(msg)) => assert!(msg.contains("square side 128")),
        other => panic!("Expected InvalidConfig error, got {other:?}"),
    }
}

#[test]
fn test_empty_heuristics() {
    let cfg = PackSettings::builder().heuristics(Vec::new()).build();
    assert!(matches!(cfg.validate(), Err(AtlasError::InvalidConfig(_))));
    assert!(pack_rects(vec![RectSize::new(4, 4, 0)], &cfg).is_err());
}

#[test]
fn usable_space_and_offsets() {
    let cfg = PackSettings::builder().padding(4, 2).build();
    assert_eq!(cfg.usable_dimensions(), (1016, 1020));
    assert_eq!(cfg.edge_offset(), (4, 2));
    assert_eq!(cfg.bleed(), (0, 0));

    let dup = PackSettings { duplicate_padding: true, ..cfg.clone() };
    assert_eq!(dup.usable_dimensions(), (1020, 1022));
    assert_eq!(dup.edge_offset(), (2, 1));
    assert_eq!(dup.bleed(), (2, 1));

    let bare = PackSettings { edge_padding: false, ..cfg };
    assert_eq!(bare.usable_dimensions(), (1024, 1024));
    assert_eq!(bare.edge_offset(), (0, 0));
}

#[test]
fn names_parse() {
    assert_eq!("bssf".parse::<FreeRectChoiceHeuristic>(), Ok(FreeRectChoiceHeuristic::BestShortSideFit));
    assert_eq!("ContactPoint".parse::<FreeRectChoiceHeuristic>(), Ok(FreeRectChoiceHeuristic::ContactPoint));
    assert_eq!("bottom_left".parse::<FreeRectChoiceHeuristic>(), Ok(FreeRectChoiceHeuristic::BottomLeft));
    assert!("worst_fit".parse::<FreeRectChoiceHeuristic>().is_err());
    assert_eq!("la8".parse::<PixelFormat>(), Ok(PixelFormat::LumaAlpha8));
    assert_eq!("RGBA8888".parse::<PixelFormat>(), Ok(PixelFormat::Rgba8));
    assert_eq!(PixelFormat::Rgb8.channels(), 3);
}

#[test]
fn settings_round_trip_through_json() {
    let cfg = PackSettings::builder()
        .allow_rotation(true)
        .square(true)
        .heuristics(vec![FreeRectChoiceHeuristic::BestAreaFit])
        .build();
    let text = serde_json::to_string(&cfg).expect("serialize");
    assert!(text.contains("best_area_fit"));
    let back: PackSettings = serde_json::from_str(&text).expect("deserialize");
    assert!(back.allow_rotation && back.square);
    assert_eq!(back.heuristics, vec![FreeRectChoiceHeuristic::BestAreaFit]);

    // omitted optional fields fall back to defaults
    let partial: PackSettings = serde_json::from_str(
        r#"{"padding_x":1,"padding_y":1,"edge_padding":true,"duplicate_padding":false,
            "allow_rotation":false,"min_width":16,"min_height":16,"max_width":512,
            "max_height":512,"square":false,"power_of_two":true}"#,
    )
    .expect("partial");
    assert_eq!(partial.format, PixelFormat::Rgba8);
    assert_eq!(partial.heuristics.len(), 5);
    assert!(!partial.fast && !partial.arrayed);
}
