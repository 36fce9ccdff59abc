use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tex_atlas_core::error::AtlasError;
use tex_atlas_core::prelude::*;
use tex_atlas_core::sort_for_fast;

fn sixty_fours(n: usize) -> Vec<RectSize> {
    (0..n).map(|i| RectSize::new(64, 64, i)).collect()
}

fn unpadded(max: u32) -> PackSettingsBuilder {
    PackSettings::builder()
        .with_max_dimensions(max, max)
        .padding(0, 0)
}

#[test]
fn ten_tiles_spill_over_three_pages() {
    let settings = unpadded(128).pow2(true).build();
    let pages = pack_rects(sixty_fours(10), &settings).expect("pack");
    assert_eq!(pages.len(), 3);
    assert_eq!((pages[0].width, pages[0].height), (128, 128));
    assert_eq!(pages[0].placed.len(), 4);
    assert_eq!(pages[1].placed.len(), 4);
    assert_eq!(pages[2].placed.len(), 2);
    // width is searched first, so the last two tiles stack vertically
    assert_eq!((pages[2].width, pages[2].height), (64, 128));

    let mut ids: Vec<usize> = pages
        .iter()
        .flat_map(|p| p.placed.iter().map(|r| r.id))
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..10).collect::<Vec<_>>());
    assert!(pages.iter().all(|p| p.unplaced.is_empty()));
}

#[test]
fn layout_pages_are_power_of_two() {
    let items: Vec<(String, u32, u32)> = (0..10).map(|i| (format!("t{i}"), 64, 64)).collect();
    let layout = pack_layout(items, unpadded(128).pow2(true).build()).expect("layout");
    assert_eq!(layout.pages.len(), 3);
    for page in &layout.pages {
        assert!(page.width.is_power_of_two() && page.height.is_power_of_two());
        assert!(page.width <= 128 && page.height <= 128);
    }
    assert_eq!(layout.registry.len(), 10);
    for i in 0..10 {
        let name = format!("t{i}");
        let frame = layout.frame(&name).expect("frame");
        assert_eq!(frame.source_size, (64, 64));
        assert!(layout.registry.placement_by_name(&name).is_some());
    }
}

#[test]
fn empty_input_yields_no_pages() {
    let settings = PackSettings::default();
    assert!(pack_rects(Vec::new(), &settings).expect("pack").is_empty());
    let layout = pack_layout(Vec::<(String, u32, u32)>::new(), settings).expect("layout");
    assert!(layout.pages.is_empty());
    assert!(layout.registry.is_empty());
}

#[test]
fn zero_sized_input_is_rejected() {
    let settings = PackSettings::default();
    let err = pack_rects(vec![RectSize::new(0, 10, 0)], &settings).unwrap_err();
    assert!(matches!(err, AtlasError::InvalidDimensions { width: 0, height: 10 }));
}

#[test]
fn random_sets_cover_every_input_once() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(2024);
    for round in 0..4 {
        let n = rng.gen_range(10..=40);
        let rects: Vec<RectSize> = (0..n)
            .map(|i| RectSize::new(rng.gen_range(1..=90), rng.gen_range(1..=90), i))
            .collect();
        let settings = PackSettings::builder()
            .with_max_dimensions(128, 128)
            .with_min_dimensions(0, 0)
            .padding(1, 1)
            .allow_rotation(round % 2 == 0)
            .build();
        let pages = pack_rects(rects.clone(), &settings).expect("pack");
        assert!(pages.len() <= n);

        let mut seen = HashSet::new();
        for page in &pages {
            assert!(!page.placed.is_empty());
            assert!(page.unplaced.is_empty());
            let bounds = Rect::new(0, 0, page.width, page.height);
            for (i, a) in page.placed.iter().enumerate() {
                assert!(bounds.contains(&a.rect));
                assert!(seen.insert(a.id), "id {} placed twice", a.id);
                let input = rects[a.id];
                let expect = if a.rotated {
                    (input.h, input.w)
                } else {
                    (input.w, input.h)
                };
                assert_eq!((a.rect.w, a.rect.h), expect);
                for b in &page.placed[i + 1..] {
                    assert!(!a.rect.intersects(&b.rect));
                }
            }
        }
        assert_eq!(seen.len(), n);
    }
}

#[test]
fn fast_mode_sorts_by_longest_side() {
    let rects = vec![
        RectSize::new(8, 8, 0),
        RectSize::new(30, 4, 1),
        RectSize::new(16, 16, 2),
        RectSize::new(4, 30, 3),
    ];
    let mut sorted = rects.clone();
    sort_for_fast(&mut sorted);
    let order: Vec<usize> = sorted.iter().map(|r| r.id).collect();
    // ties keep input order
    assert_eq!(order, vec![1, 3, 2, 0]);

    let settings = unpadded(64)
        .pow2(false)
        .with_min_dimensions(0, 0)
        .fast(true)
        .heuristics(vec![FreeRectChoiceHeuristic::BottomLeft])
        .build();
    let pages = pack_rects(rects, &settings).expect("pack");
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].placed.len(), 4);
    // the longest input goes in first and takes the origin
    let first = pages[0].placed.iter().find(|p| p.id == 1).expect("id 1");
    assert_eq!((first.rect.x, first.rect.y), (0, 0));
}

#[test]
fn identical_runs_produce_identical_layouts() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(99);
    let items: Vec<(String, u32, u32)> = (0..30)
        .map(|i| (format!("img{i}"), rng.gen_range(4..=50), rng.gen_range(4..=50)))
        .collect();
    let settings = PackSettings::builder()
        .with_max_dimensions(128, 128)
        .allow_rotation(true)
        .build();
    let a = pack_layout(items.clone(), settings.clone()).expect("a");
    let b = pack_layout(items, settings).expect("b");
    assert_eq!(a.pages.len(), b.pages.len());
    for (pa, pb) in a.pages.iter().zip(&b.pages) {
        assert_eq!((pa.width, pa.height), (pb.width, pb.height));
        assert_eq!(pa.frames, pb.frames);
    }
}

#[test]
fn stats_account_for_every_frame() {
    let items: Vec<(String, u32, u32)> = (0..6).map(|i| (format!("s{i}"), 32, 16)).collect();
    let layout = pack_layout(items, PackSettings::default()).expect("layout");
    let stats = layout.stats();
    assert_eq!(stats.num_frames, 6);
    assert_eq!(stats.num_pages, layout.pages.len());
    assert_eq!(stats.used_frame_area, 6 * 32 * 16);
    assert!(stats.occupancy > 0.0 && stats.occupancy <= 1.0);
    assert_eq!(stats.wasted_area(), stats.total_page_area - stats.used_frame_area);
    assert!(stats.summary().contains("Frames: 6"));
}
