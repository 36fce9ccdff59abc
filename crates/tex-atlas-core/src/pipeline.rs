use crate::assembly::{SourceImage, TextureAssembly};
use crate::atlas::{AtlasLayout, LayoutFrame, LayoutPage, TextureAtlas};
use crate::compositing::{AtlasTexture, CompositeBackend, RasterBackend, RasterSource, compose};
use crate::config::PackSettings;
use crate::error::{AtlasError, Result};
use crate::model::{Rect, RectPage, RectSize};
use crate::registry::{NameRegistry, Placement};
use crate::search::{search_page, sort_for_fast};
use tracing::{debug, info, instrument};

#[instrument(skip_all, fields(count = rects.len()))]
/// Packs `rects` into as many pages as needed.
///
/// Notes:
/// - Empty input yields no pages.
/// - In fast mode inputs are stable-sorted by decreasing longest side first.
/// - Every page places at least one rectangle, so at most `rects.len()` pages are produced.
pub fn pack_rects(mut rects: Vec<RectSize>, settings: &PackSettings) -> Result<Vec<RectPage>> {
    settings.validate()?;
    if rects.is_empty() {
        return Ok(Vec::new());
    }
    if settings.fast {
        sort_for_fast(&mut rects);
    }

    let total = rects.len();
    let mut pages: Vec<RectPage> = Vec::new();
    let mut remaining = rects;
    while !remaining.is_empty() {
        let mut page = search_page(&remaining, settings)?;
        if page.placed.is_empty() {
            return Err(AtlasError::OutOfSpace {
                placed: total - remaining.len(),
                total,
            });
        }
        remaining = std::mem::take(&mut page.unplaced);
        debug!(
            page = pages.len(),
            width = page.width,
            height = page.height,
            placed = page.placed.len(),
            remaining = remaining.len(),
            "page packed"
        );
        pages.push(page);
    }
    Ok(pages)
}

/// Packs sizes into pages without compositing pixel data.
/// Inputs are (name, width, height); names must be unique.
pub fn pack_layout<K: Into<String>>(
    items: Vec<(K, u32, u32)>,
    settings: PackSettings,
) -> Result<AtlasLayout> {
    let assembly =
        TextureAssembly::try_from_entries(items.into_iter().map(|(k, w, h)| (k, (w, h))))?;
    layout_assembly(&assembly, settings)
}

/// Assigns ids to `assembly` in order, packs its sizes and records every placement.
#[instrument(skip_all, fields(count = assembly.len()))]
pub fn layout_assembly<S: SourceImage>(
    assembly: &TextureAssembly<S>,
    settings: PackSettings,
) -> Result<AtlasLayout> {
    settings.validate()?;
    let mut registry = NameRegistry::from_names(assembly.names())?;
    let sizes: Vec<(u32, u32)> = assembly
        .iter()
        .map(|(_, s)| SourceImage::dimensions(s))
        .collect();
    let rects: Vec<RectSize> = sizes
        .iter()
        .enumerate()
        .map(|(id, &(w, h))| RectSize::new(w, h, id))
        .collect();

    let rect_pages = pack_rects(rects, &settings)?;

    let (off_x, off_y) = settings.edge_offset();
    let mut pages = Vec::with_capacity(rect_pages.len());
    for (index, rp) in rect_pages.into_iter().enumerate() {
        let (width, height) = output_page_size(&rp, &settings);
        let mut frames = Vec::with_capacity(rp.placed.len());
        for p in &rp.placed {
            let rect = Rect::new(p.rect.x + off_x, p.rect.y + off_y, p.rect.w, p.rect.h);
            registry.record(
                p.id,
                Placement {
                    page: index,
                    rect,
                    rotated: p.rotated,
                },
            );
            let name = registry.name(p.id).unwrap_or_default().to_string();
            frames.push(LayoutFrame {
                name,
                id: p.id,
                rect,
                rotated: p.rotated,
                source_size: sizes[p.id],
            });
        }
        pages.push(LayoutPage {
            index,
            width,
            height,
            frames,
            occupancy: rp.occupancy,
        });
    }

    info!(
        inputs = assembly.len(),
        pages = pages.len(),
        "layout complete"
    );
    Ok(AtlasLayout {
        pages,
        registry,
        settings,
    })
}

/// Packs `assembly` and composites it with `backend`.
#[instrument(skip_all)]
pub fn pack_images<S, B>(
    assembly: &TextureAssembly<S>,
    settings: PackSettings,
    backend: &mut B,
) -> Result<TextureAtlas<B::Texture>>
where
    S: SourceImage,
    B: CompositeBackend<S>,
{
    let layout = layout_assembly(assembly, settings)?;
    let textures = compose(&layout, assembly, backend)?;
    Ok(TextureAtlas::new(textures, layout))
}

/// [`pack_images`] with the CPU [`RasterBackend`].
pub fn pack_images_raster<S: RasterSource>(
    assembly: &TextureAssembly<S>,
    settings: PackSettings,
) -> Result<TextureAtlas<AtlasTexture>> {
    let mut backend = RasterBackend::new();
    pack_images(assembly, settings, &mut backend)
}

/// Final output size of a searched page: content plus edge padding, raised
/// to the minimum size, squared, then rounded to a power of two.
/// For validated settings the result never exceeds the max size.
fn output_page_size(page: &RectPage, settings: &PackSettings) -> (u32, u32) {
    let (off_x, off_y) = settings.edge_offset();
    let mut w = (page.width + off_x * 2).max(settings.min_width);
    let mut h = (page.height + off_y * 2).max(settings.min_height);
    if settings.square {
        let m = w.max(h);
        w = m;
        h = m;
    }
    if settings.power_of_two {
        w = w.max(1).next_power_of_two();
        h = h.max(1).next_power_of_two();
    }
    (w, h)
}
