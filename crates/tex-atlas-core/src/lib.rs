//! Core library for packing textures into atlases.
//!
//! - Bin packer: MaxRects with BSSF/BLSF/BAF/BL/CP heuristics
//! - Size search: bounded binary search over page dimensions (square or free, power-of-two or arbitrary)
//! - Pipeline: `pack_rects` (ids only), `pack_layout` (names, no pixels), `pack_images` (composited textures)
//! - Compositing goes through the `CompositeBackend` trait; `RasterBackend` is the CPU implementation.
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use tex_atlas_core::{PackSettings, TextureAssembly, pack_images_raster};
//! # fn main() -> anyhow::Result<()> {
//! let mut assembly = TextureAssembly::new();
//! assembly.insert("a", ImageReader::open("a.png")?.decode()?)?;
//! assembly.insert("b", ImageReader::open("b.png")?.decode()?)?;
//! let settings = PackSettings { max_width: 1024, max_height: 1024, ..Default::default() };
//! let atlas = pack_images_raster(&assembly, settings)?;
//! let region = atlas.texture_region("a");
//! println!("a is on texture {} at {:?}", region.texture, region.rect);
//! # Ok(()) }
//! ```

pub mod assembly;
pub mod atlas;
pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod registry;
pub mod search;

pub use assembly::*;
pub use atlas::*;
pub use compositing::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;
pub use registry::*;
pub use search::{Probe, SizeSearch, search_page, search_page_with_probes, sort_for_fast};

/// Convenience prelude for common types and functions.
/// Importing `tex_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::assembly::{SourceImage, TextureAssembly};
    pub use crate::atlas::{AtlasLayout, LayoutFrame, LayoutPage, TextureAtlas, TextureRegion};
    pub use crate::compositing::{AtlasTexture, BlitOp, CompositeBackend, RasterBackend};
    pub use crate::config::{
        FreeRectChoiceHeuristic, PackSettings, PackSettingsBuilder, PixelFormat,
    };
    pub use crate::model::{PackStats, PlacedRect, Rect, RectPage, RectSize};
    pub use crate::packer::MaxRectsBin;
    pub use crate::registry::{NameRegistry, Placement};
    pub use crate::{
        pack_images, pack_images_raster, pack_layout, pack_rects, search_page,
    };
}
