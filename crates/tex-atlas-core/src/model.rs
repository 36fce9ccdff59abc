use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the interiors of `self` and `r` overlap.
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.x >= r.right() || r.x >= self.right() || self.y >= r.bottom() || r.y >= self.bottom())
    }
}

/// An input rectangle waiting to be placed. `id` is caller-assigned and unique per run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RectSize {
    pub w: u32,
    pub h: u32,
    pub id: usize,
}

impl RectSize {
    pub fn new(w: u32, h: u32, id: usize) -> Self {
        Self { w, h, id }
    }
    pub fn max_side(&self) -> u32 {
        self.w.max(self.h)
    }
}

/// A rectangle placed inside a bin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacedRect {
    /// Placement in stored orientation (`w`/`h` swapped when rotated).
    pub rect: Rect,
    pub id: usize,
    /// True if the input was turned 90° to fit.
    pub rotated: bool,
}

/// Result of packing one bin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RectPage {
    /// Final page width (tight bounding box of the placements).
    pub width: u32,
    /// Final page height (tight bounding box of the placements).
    pub height: u32,
    /// Size of the bin the placements were made in.
    pub bin_width: u32,
    pub bin_height: u32,
    pub placed: Vec<PlacedRect>,
    /// Inputs that did not fit; carried to the next page.
    pub unplaced: Vec<RectSize>,
    /// Used area / bin area.
    pub occupancy: f64,
}

impl RectPage {
    pub fn used_area(&self) -> u64 {
        self.placed.iter().map(|p| p.rect.area()).sum()
    }

    /// Used area relative to the final `width * height` rather than the bin.
    pub fn fill_ratio(&self) -> f64 {
        let area = (self.width as u64) * (self.height as u64);
        if area == 0 {
            0.0
        } else {
            self.used_area() as f64 / area as f64
        }
    }
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    /// Total number of pages in the atlas.
    pub num_pages: usize,
    /// Total number of frames packed.
    pub num_frames: usize,
    /// Sum of width * height over all pages.
    pub total_page_area: u64,
    /// Sum of frame width * height.
    pub used_frame_area: u64,
    /// used_frame_area / total_page_area (0.0 to 1.0).
    pub occupancy: f64,
    pub avg_page_width: f64,
    pub avg_page_height: f64,
    pub max_page_width: u32,
    pub max_page_height: u32,
    /// Number of rotated frames.
    pub num_rotated: usize,
}

impl PackStats {
    /// Builds statistics from `(page_width, page_height, frames)` triples,
    /// where frames are `(rect, rotated)`.
    pub fn from_pages<'a, I>(pages: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32, Vec<(&'a Rect, bool)>)>,
    {
        let mut num_pages = 0usize;
        let mut num_frames = 0;
        let mut total_page_area = 0u64;
        let mut used_frame_area = 0u64;
        let mut max_page_width = 0u32;
        let mut max_page_height = 0u32;
        let mut total_width = 0u64;
        let mut total_height = 0u64;
        let mut num_rotated = 0;

        for (w, h, frames) in pages {
            num_pages += 1;
            total_page_area += (w as u64) * (h as u64);
            total_width += w as u64;
            total_height += h as u64;
            max_page_width = max_page_width.max(w);
            max_page_height = max_page_height.max(h);
            for (rect, rotated) in frames {
                num_frames += 1;
                used_frame_area += rect.area();
                if rotated {
                    num_rotated += 1;
                }
            }
        }

        let occupancy = if total_page_area > 0 {
            used_frame_area as f64 / total_page_area as f64
        } else {
            0.0
        };
        let (avg_page_width, avg_page_height) = if num_pages > 0 {
            (
                total_width as f64 / num_pages as f64,
                total_height as f64 / num_pages as f64,
            )
        } else {
            (0.0, 0.0)
        };

        PackStats {
            num_pages,
            num_frames,
            total_page_area,
            used_frame_area,
            occupancy,
            avg_page_width,
            avg_page_height,
            max_page_width,
            max_page_height,
            num_rotated,
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Pages: {}, Frames: {}, Occupancy: {:.2}%, Total Area: {} px², Used Area: {} px², Rotated: {}",
            self.num_pages,
            self.num_frames,
            self.occupancy * 100.0,
            self.total_page_area,
            self.used_frame_area,
            self.num_rotated,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_page_area.saturating_sub(self.used_frame_area)
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.total_page_area > 0 {
            (self.wasted_area() as f64 / self.total_page_area as f64) * 100.0
        } else {
            0.0
        }
    }
}
