use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// MaxRects free-region choice heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FreeRectChoiceHeuristic {
    /// Minimize the shorter leftover side; tie-break on the longer one.
    BestShortSideFit,
    /// Minimize the longer leftover side; tie-break on the shorter one.
    BestLongSideFit,
    /// Minimize leftover area; tie-break on the shorter leftover side.
    BestAreaFit,
    /// Tetris-style: lowest top edge, then leftmost.
    BottomLeft,
    /// Maximize edge contact with the bin border and placed rectangles.
    ContactPoint,
}

impl FreeRectChoiceHeuristic {
    pub const ALL: [FreeRectChoiceHeuristic; 5] = [
        Self::BestShortSideFit,
        Self::BestLongSideFit,
        Self::BestAreaFit,
        Self::BottomLeft,
        Self::ContactPoint,
    ];
}

impl FromStr for FreeRectChoiceHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bssf" | "bestshortsidefit" | "best_short_side_fit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" | "best_long_side_fit" => Ok(Self::BestLongSideFit),
            "baf" | "bestareafit" | "best_area_fit" => Ok(Self::BestAreaFit),
            "bl" | "bottomleft" | "bottom_left" => Ok(Self::BottomLeft),
            "cp" | "contactpoint" | "contact_point" => Ok(Self::ContactPoint),
            _ => Err(()),
        }
    }
}

/// Pixel format of composited output textures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Rgba8,
    Rgb8,
    LumaAlpha8,
    Luma8,
}

impl PixelFormat {
    pub fn channels(&self) -> u8 {
        match self {
            PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
            PixelFormat::LumaAlpha8 => 2,
            PixelFormat::Luma8 => 1,
        }
    }

    /// Name used in exported metadata.
    pub fn label(&self) -> &'static str {
        match self {
            PixelFormat::Rgba8 => "RGBA8888",
            PixelFormat::Rgb8 => "RGB888",
            PixelFormat::LumaAlpha8 => "LA88",
            PixelFormat::Luma8 => "L8",
        }
    }
}

impl FromStr for PixelFormat {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgba8" | "rgba8888" => Ok(Self::Rgba8),
            "rgb8" | "rgb888" => Ok(Self::Rgb8),
            "luma_alpha8" | "la8" | "la88" => Ok(Self::LumaAlpha8),
            "luma8" | "l8" => Ok(Self::Luma8),
            _ => Err(()),
        }
    }
}

/// Packing configuration.
/// Key notes:
///   - `fast` trades layout quality for speed: inputs are sorted once and each heuristic makes a single greedy pass
///   - `edge_padding` + `duplicate_padding` together give page edges only half padding
///   - `arrayed` composites every page into one layered texture
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackSettings {
    /// Pixels between images horizontally.
    pub padding_x: u32,
    /// Pixels between images vertically.
    pub padding_y: u32,
    /// Pad along page edges as well.
    pub edge_padding: bool,
    /// Fill padding with each image's edge pixels instead of leaving it transparent.
    pub duplicate_padding: bool,
    /// Allow 90° rotations for placements where beneficial.
    pub allow_rotation: bool,

    /// Minimum page width in pixels.
    pub min_width: u32,
    /// Minimum page height in pixels.
    pub min_height: u32,
    /// Maximum page width in pixels.
    pub max_width: u32,
    /// Maximum page height in pixels.
    pub max_height: u32,

    /// Force square pages.
    pub square: bool,
    /// Page sizes are powers of two.
    pub power_of_two: bool,

    #[serde(default = "default_format")]
    pub format: PixelFormat,
    /// Sorted single-pass greedy packing instead of the full offline search.
    #[serde(default)]
    pub fast: bool,
    /// Composite all pages into one layered texture.
    #[serde(default)]
    pub arrayed: bool,

    /// Heuristics tried at every candidate page size.
    #[serde(default = "default_heuristics")]
    pub heuristics: Vec<FreeRectChoiceHeuristic>,
}

impl Default for PackSettings {
    fn default() -> Self {
        Self {
            padding_x: 2,
            padding_y: 2,
            edge_padding: true,
            duplicate_padding: false,
            allow_rotation: false,
            min_width: 16,
            min_height: 16,
            max_width: 1024,
            max_height: 1024,
            square: false,
            power_of_two: true,
            format: default_format(),
            fast: false,
            arrayed: false,
            heuristics: default_heuristics(),
        }
    }
}

impl PackSettings {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - A max dimension is zero
    /// - A min dimension exceeds its max
    /// - Edge padding would leave no usable space
    /// - `power_of_two` is set with a max dimension that is not a power of two
    /// - No heuristic is configured
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::AtlasError;

        if self.max_width == 0 || self.max_height == 0 {
            return Err(AtlasError::InvalidDimensions {
                width: self.max_width,
                height: self.max_height,
            });
        }

        if self.min_width > self.max_width || self.min_height > self.max_height {
            return Err(AtlasError::InvalidConfig(format!(
                "min page size {}x{} exceeds max page size {}x{}",
                self.min_width, self.min_height, self.max_width, self.max_height
            )));
        }

        let side = self.max_width.min(self.max_height);
        if self.square && self.min_width.max(self.min_height) > side {
            return Err(AtlasError::InvalidConfig(format!(
                "min page size {}x{} exceeds square side {}",
                self.min_width, self.min_height, side
            )));
        }

        let (usable_w, usable_h) = self.usable_dimensions();
        if usable_w == 0 || usable_h == 0 {
            return Err(AtlasError::InvalidConfig(format!(
                "edge padding ({}, {}) leaves no usable space in {}x{}",
                self.padding_x, self.padding_y, self.max_width, self.max_height
            )));
        }

        if self.power_of_two
            && (!self.max_width.is_power_of_two() || !self.max_height.is_power_of_two())
        {
            return Err(AtlasError::InvalidConfig(format!(
                "power_of_two requires power-of-two max dimensions, got {}x{}",
                self.max_width, self.max_height
            )));
        }

        if self.heuristics.is_empty() {
            return Err(AtlasError::InvalidConfig(
                "at least one heuristic is required".into(),
            ));
        }

        Ok(())
    }

    /// Largest image size that fits on a page once edge padding is taken out.
    pub fn usable_dimensions(&self) -> (u32, u32) {
        if !self.edge_padding {
            return (self.max_width, self.max_height);
        }
        let (ex, ey) = if self.duplicate_padding {
            (self.padding_x, self.padding_y)
        } else {
            (
                self.padding_x.saturating_mul(2),
                self.padding_y.saturating_mul(2),
            )
        };
        (
            self.max_width.saturating_sub(ex),
            self.max_height.saturating_sub(ey),
        )
    }

    /// Offset of page content from the page origin.
    pub fn edge_offset(&self) -> (u32, u32) {
        if !self.edge_padding {
            return (0, 0);
        }
        if self.duplicate_padding {
            (self.padding_x / 2, self.padding_y / 2)
        } else {
            (self.padding_x, self.padding_y)
        }
    }

    /// Pixels of duplicated edge around each image.
    pub fn bleed(&self) -> (u32, u32) {
        if self.duplicate_padding {
            (self.padding_x / 2, self.padding_y / 2)
        } else {
            (0, 0)
        }
    }

    /// Create a fluent builder for `PackSettings`.
    pub fn builder() -> PackSettingsBuilder {
        PackSettingsBuilder::new()
    }
}

fn default_format() -> PixelFormat {
    PixelFormat::Rgba8
}
fn default_heuristics() -> Vec<FreeRectChoiceHeuristic> {
    FreeRectChoiceHeuristic::ALL.to_vec()
}

/// Builder for `PackSettings` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackSettingsBuilder {
    cfg: PackSettings,
}

impl PackSettingsBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackSettings::default(),
        }
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.max_width = w;
        self.cfg.max_height = h;
        self
    }
    pub fn with_min_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.min_width = w;
        self.cfg.min_height = h;
        self
    }
    pub fn padding(mut self, x: u32, y: u32) -> Self {
        self.cfg.padding_x = x;
        self.cfg.padding_y = y;
        self
    }
    pub fn edge_padding(mut self, v: bool) -> Self {
        self.cfg.edge_padding = v;
        self
    }
    pub fn duplicate_padding(mut self, v: bool) -> Self {
        self.cfg.duplicate_padding = v;
        self
    }
    pub fn allow_rotation(mut self, v: bool) -> Self {
        self.cfg.allow_rotation = v;
        self
    }
    pub fn square(mut self, v: bool) -> Self {
        self.cfg.square = v;
        self
    }
    pub fn pow2(mut self, v: bool) -> Self {
        self.cfg.power_of_two = v;
        self
    }
    pub fn format(mut self, v: PixelFormat) -> Self {
        self.cfg.format = v;
        self
    }
    pub fn fast(mut self, v: bool) -> Self {
        self.cfg.fast = v;
        self
    }
    pub fn arrayed(mut self, v: bool) -> Self {
        self.cfg.arrayed = v;
        self
    }
    pub fn heuristics(mut self, v: Vec<FreeRectChoiceHeuristic>) -> Self {
        self.cfg.heuristics = v;
        self
    }
    pub fn build(self) -> PackSettings {
        self.cfg
    }
}
