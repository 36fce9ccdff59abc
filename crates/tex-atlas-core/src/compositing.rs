use crate::assembly::{SourceImage, TextureAssembly};
use crate::atlas::AtlasLayout;
use crate::config::PixelFormat;
use crate::error::{AtlasError, Result};
use crate::model::Rect;
use image::{DynamicImage, Rgba, RgbaImage};
use std::borrow::Cow;
use tracing::{debug, instrument};

/// One copy of a source into an output texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlitOp {
    /// Destination rectangle in stored orientation.
    pub dst: Rect,
    /// Rotate the source 90° clockwise.
    pub rotated: bool,
    /// Columns of edge pixels duplicated left and right of `dst`.
    pub bleed_x: u32,
    /// Rows of edge pixels duplicated above and below `dst`.
    pub bleed_y: u32,
}

/// Rendering backend that materializes a layout into textures.
///
/// Targets are referred to by the index returned from `create_target`.
/// Any caches the backend keeps live in the backend value itself.
pub trait CompositeBackend<S: ?Sized> {
    type Texture;

    /// Allocates an output of `width x height`. `layers` requests an array texture.
    fn create_target(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        layers: Option<u32>,
    ) -> Result<usize>;

    fn blit(&mut self, source: &S, target: usize, layer: u32, op: &BlitOp) -> Result<()>;

    /// Hands over every target created so far, in creation order.
    fn finalize(&mut self) -> Result<Vec<Self::Texture>>;
}

/// Source that can provide RGBA8 pixels to the raster backend.
pub trait RasterSource: SourceImage {
    fn to_rgba(&self) -> Cow<'_, RgbaImage>;
}

impl RasterSource for RgbaImage {
    fn to_rgba(&self) -> Cow<'_, RgbaImage> {
        Cow::Borrowed(self)
    }
}

impl RasterSource for DynamicImage {
    fn to_rgba(&self) -> Cow<'_, RgbaImage> {
        match self.as_rgba8() {
            Some(rgba) => Cow::Borrowed(rgba),
            None => Cow::Owned(self.to_rgba8()),
        }
    }
}

impl<S: RasterSource + ?Sized> RasterSource for &S {
    fn to_rgba(&self) -> Cow<'_, RgbaImage> {
        (**self).to_rgba()
    }
}

/// Output texture of the raster backend. Non-arrayed textures have one layer.
#[derive(Debug, Clone)]
pub struct AtlasTexture {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub layers: Vec<DynamicImage>,
}

impl AtlasTexture {
    /// First (or only) layer.
    pub fn image(&self) -> Option<&DynamicImage> {
        self.layers.first()
    }
}

struct RasterTarget {
    format: PixelFormat,
    layers: Vec<RgbaImage>,
}

/// CPU compositor built on the `image` crate.
pub struct RasterBackend {
    targets: Vec<RasterTarget>,
    background_color: Rgba<u8>,
}

impl Default for RasterBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterBackend {
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            background_color: Rgba([0, 0, 0, 0]), // Transparent by default
        }
    }

    /// Set the background color for new targets.
    pub fn with_background_color(mut self, color: Rgba<u8>) -> Self {
        self.background_color = color;
        self
    }
}

impl<S: RasterSource + ?Sized> CompositeBackend<S> for RasterBackend {
    type Texture = AtlasTexture;

    fn create_target(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
        layers: Option<u32>,
    ) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(AtlasError::InvalidDimensions { width, height });
        }
        let count = layers.unwrap_or(1).max(1);
        let layers = (0..count)
            .map(|_| RgbaImage::from_pixel(width, height, self.background_color))
            .collect();
        self.targets.push(RasterTarget { format, layers });
        Ok(self.targets.len() - 1)
    }

    fn blit(&mut self, source: &S, target: usize, layer: u32, op: &BlitOp) -> Result<()> {
        let canvas = self
            .targets
            .get_mut(target)
            .and_then(|t| t.layers.get_mut(layer as usize))
            .ok_or(AtlasError::UnknownTarget(target))?;
        let src = source.to_rgba();
        blit_rgba(&src, canvas, op);
        Ok(())
    }

    fn finalize(&mut self) -> Result<Vec<AtlasTexture>> {
        Ok(self
            .targets
            .drain(..)
            .map(|t| {
                let (width, height) = t.layers.first().map(|l| l.dimensions()).unwrap_or((0, 0));
                AtlasTexture {
                    width,
                    height,
                    format: t.format,
                    layers: t.layers.into_iter().map(|l| convert(l, t.format)).collect(),
                }
            })
            .collect())
    }
}

fn convert(rgba: RgbaImage, format: PixelFormat) -> DynamicImage {
    let img = DynamicImage::ImageRgba8(rgba);
    match format {
        PixelFormat::Rgba8 => img,
        PixelFormat::Rgb8 => DynamicImage::ImageRgb8(img.to_rgb8()),
        PixelFormat::LumaAlpha8 => DynamicImage::ImageLumaA8(img.to_luma_alpha8()),
        PixelFormat::Luma8 => DynamicImage::ImageLuma8(img.to_luma8()),
    }
}

/// Copy `src` into `canvas` at `op.dst`, optionally rotated 90° clockwise,
/// then duplicate the outermost pixels `bleed_x`/`bleed_y` outward.
/// Everything is clipped to the canvas.
pub fn blit_rgba(src: &RgbaImage, canvas: &mut RgbaImage, op: &BlitOp) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    // destination (rendered) size may differ when rotated
    let (rw, rh) = if op.rotated { (sh, sw) } else { (sw, sh) };
    let rw = rw.min(op.dst.w);
    let rh = rh.min(op.dst.h);
    let (dx, dy) = (op.dst.x, op.dst.y);

    for yy in 0..rh {
        for xx in 0..rw {
            let (ix, iy) = if op.rotated {
                (yy, sh - 1 - xx)
            } else {
                (xx, yy)
            };
            if dx + xx < cw && dy + yy < ch {
                canvas.put_pixel(dx + xx, dy + yy, *src.get_pixel(ix, iy));
            }
        }
    }

    if op.bleed_x > 0 || op.bleed_y > 0 {
        bleed_edges(canvas, Rect::new(dx, dy, rw, rh), op.bleed_x, op.bleed_y);
    }
}

fn bleed_edges(canvas: &mut RgbaImage, area: Rect, bx: u32, by: u32) {
    let (cw, ch) = canvas.dimensions();
    if area.is_empty() || area.x >= cw || area.y >= ch {
        return;
    }
    let x0 = area.x;
    let x1 = (area.right() - 1).min(cw - 1);
    let y0 = area.y;
    let y1 = (area.bottom() - 1).min(ch - 1);

    // left/right columns
    for y in y0..=y1 {
        let left = *canvas.get_pixel(x0, y);
        let right = *canvas.get_pixel(x1, y);
        for e in 1..=bx {
            if x0 >= e {
                canvas.put_pixel(x0 - e, y, left);
            }
            if x1 + e < cw {
                canvas.put_pixel(x1 + e, y, right);
            }
        }
    }
    // top/bottom rows, spanning the widened columns so corners are filled too
    let xs = x0.saturating_sub(bx);
    let xe = (x1 + bx).min(cw - 1);
    for x in xs..=xe {
        let top = *canvas.get_pixel(x, y0);
        let bottom = *canvas.get_pixel(x, y1);
        for e in 1..=by {
            if y0 >= e {
                canvas.put_pixel(x, y0 - e, top);
            }
            if y1 + e < ch {
                canvas.put_pixel(x, y1 + e, bottom);
            }
        }
    }
}

/// Materializes `layout` with `backend`: one target per page, or a single
/// layered target sized to the largest page when the layout is arrayed.
///
/// `assembly` must be the one `layout` was built from; a frame whose id and
/// name have no matching entry fails with [`AtlasError::MissingSource`].
#[instrument(skip_all, fields(pages = layout.pages.len()))]
pub fn compose<S, B>(
    layout: &AtlasLayout,
    assembly: &TextureAssembly<S>,
    backend: &mut B,
) -> Result<Vec<B::Texture>>
where
    B: CompositeBackend<S>,
{
    let settings = &layout.settings;
    let (bleed_x, bleed_y) = settings.bleed();

    let array_target = if settings.arrayed && !layout.pages.is_empty() {
        let (w, h) = layout.max_page_size();
        Some(backend.create_target(w, h, settings.format, Some(layout.pages.len() as u32))?)
    } else {
        None
    };

    for page in &layout.pages {
        let (target, layer) = match array_target {
            Some(t) => (t, page.index as u32),
            None => (
                backend.create_target(page.width, page.height, settings.format, None)?,
                0,
            ),
        };
        for f in &page.frames {
            let source = match assembly.get_index(f.id) {
                Some((name, source)) if name == f.name => source,
                _ => {
                    return Err(AtlasError::MissingSource {
                        id: f.id,
                        name: f.name.clone(),
                    });
                }
            };
            let op = BlitOp {
                dst: f.rect,
                rotated: f.rotated,
                bleed_x,
                bleed_y,
            };
            backend.blit(source, target, layer, &op)?;
        }
        debug!(page = page.index, frames = page.frames.len(), "page composited");
    }

    backend.finalize()
}
