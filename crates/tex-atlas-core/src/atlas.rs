use crate::config::PackSettings;
use crate::model::{PackStats, Rect};
use crate::registry::NameRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named placement within a layout page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutFrame {
    pub name: String,
    /// Registry id of the source.
    pub id: usize,
    /// Content rectangle in the output page (post-rotation width/height).
    pub rect: Rect,
    /// True if the source is stored turned 90° clockwise.
    pub rotated: bool,
    /// Size of the source image.
    pub source_size: (u32, u32),
}

/// One output page of a layout (logical record, no pixels).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutPage {
    pub index: usize,
    /// Output size after edge padding, power-of-two and minimum size rules.
    pub width: u32,
    pub height: u32,
    pub frames: Vec<LayoutFrame>,
    /// Occupancy reported by the size search (used area / bin area).
    pub occupancy: f64,
}

/// Result of a packing run without pixel data.
#[derive(Debug, Clone)]
pub struct AtlasLayout {
    pub pages: Vec<LayoutPage>,
    pub registry: NameRegistry,
    pub settings: PackSettings,
}

impl AtlasLayout {
    /// Looks up the frame for `name`.
    pub fn frame(&self, name: &str) -> Option<&LayoutFrame> {
        let placement = self.registry.placement_by_name(name)?;
        self.pages
            .get(placement.page)?
            .frames
            .iter()
            .find(|f| f.name == name)
    }

    /// Largest page extent, the size of every layer when composited as an array.
    pub fn max_page_size(&self) -> (u32, u32) {
        self.pages.iter().fold((0, 0), |(w, h), p| (w.max(p.width), h.max(p.height)))
    }

    /// Computes packing statistics for this layout.
    pub fn stats(&self) -> PackStats {
        PackStats::from_pages(self.pages.iter().map(|p| {
            (
                p.width,
                p.height,
                p.frames.iter().map(|f| (&f.rect, f.rotated)).collect(),
            )
        }))
    }
}

/// Region of an output texture holding one source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TextureRegion {
    /// Index of the owning texture in [`TextureAtlas::textures`].
    pub texture: usize,
    /// Layer within the texture (non-zero only for arrayed output).
    pub layer: u32,
    /// Pixel rectangle in stored orientation.
    pub rect: Rect,
    pub rotated: bool,
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl TextureRegion {
    /// The region returned for names that are not in the atlas.
    pub fn blank() -> Self {
        Self {
            texture: 0,
            layer: 0,
            rect: Rect::default(),
            rotated: false,
            u0: 0.0,
            v0: 0.0,
            u1: 0.0,
            v1: 0.0,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.rect.is_empty()
    }

    fn new(texture: usize, layer: u32, rect: Rect, rotated: bool, tex_size: (u32, u32)) -> Self {
        let (tw, th) = (tex_size.0.max(1) as f32, tex_size.1.max(1) as f32);
        Self {
            texture,
            layer,
            rect,
            rotated,
            u0: rect.x as f32 / tw,
            v0: rect.y as f32 / th,
            u1: rect.right() as f32 / tw,
            v1: rect.bottom() as f32 / th,
        }
    }
}

/// Composited textures plus the name -> region index.
pub struct TextureAtlas<T> {
    textures: Vec<T>,
    regions: HashMap<String, TextureRegion>,
    layout: AtlasLayout,
}

impl<T> TextureAtlas<T> {
    pub(crate) fn new(textures: Vec<T>, layout: AtlasLayout) -> Self {
        let arrayed = layout.settings.arrayed;
        let array_size = layout.max_page_size();
        let mut regions = HashMap::new();
        for page in &layout.pages {
            let (texture, layer, size) = if arrayed {
                (0, page.index as u32, array_size)
            } else {
                (page.index, 0, (page.width, page.height))
            };
            for f in &page.frames {
                regions.insert(
                    f.name.clone(),
                    TextureRegion::new(texture, layer, f.rect, f.rotated, size),
                );
            }
        }
        Self {
            textures,
            regions,
            layout,
        }
    }

    pub fn texture(&self, index: usize) -> Option<&T> {
        self.textures.get(index)
    }

    pub fn textures(&self) -> &[T] {
        &self.textures
    }

    /// Region for `name`, or [`TextureRegion::blank`] if the name was never packed.
    pub fn texture_region(&self, name: &str) -> TextureRegion {
        self.regions
            .get(name)
            .copied()
            .unwrap_or_else(TextureRegion::blank)
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, &TextureRegion)> {
        self.regions.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn layout(&self) -> &AtlasLayout {
        &self.layout
    }

    pub fn stats(&self) -> PackStats {
        self.layout.stats()
    }

    /// Splits the atlas into its textures and layout.
    pub fn into_parts(self) -> (Vec<T>, AtlasLayout) {
        (self.textures, self.layout)
    }
}
