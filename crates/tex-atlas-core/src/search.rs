use crate::config::{FreeRectChoiceHeuristic, PackSettings};
use crate::error::{AtlasError, Result};
use crate::model::{RectPage, RectSize};
use crate::packer::MaxRectsBin;
use tracing::{debug, instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Convergence fuzziness of the size search in full mode.
pub const FUZZINESS: u32 = 15;
/// Convergence fuzziness of the size search in fast mode.
pub const FAST_FUZZINESS: u32 = 25;

/// One candidate size tried during a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    /// Candidate page width (before edge/padding adjustment).
    pub width: u32,
    /// Candidate page height (before edge/padding adjustment).
    pub height: u32,
    /// Occupancy of the best layout that placed every input, if any did.
    pub occupancy: Option<f64>,
}

/// Bounded binary search over one page dimension.
///
/// In power-of-two mode the search runs over exponents and never stops early.
#[derive(Debug, Clone)]
pub struct SizeSearch {
    min: i64,
    max: i64,
    fuzziness: i64,
    pot: bool,
    low: i64,
    high: i64,
    current: i64,
}

impl SizeSearch {
    pub fn new(min: u32, max: u32, fuzziness: u32, pot: bool) -> Self {
        let (min, max) = if pot {
            (ceil_log2(min) as i64, floor_log2(max) as i64)
        } else {
            (min as i64, max as i64)
        };
        Self {
            min: min.min(max),
            max,
            fuzziness: if pot { 0 } else { fuzziness as i64 },
            pot,
            low: 0,
            high: 0,
            current: 0,
        }
    }

    /// Restarts the search and returns the first candidate.
    pub fn reset(&mut self) -> u32 {
        self.low = self.min;
        self.high = self.max;
        self.current = (self.low + self.high) / 2;
        self.value()
    }

    /// Narrows toward smaller sizes when the last candidate `fits`, larger
    /// otherwise. Returns `None` once the range is exhausted.
    pub fn next(&mut self, fits: bool) -> Option<u32> {
        if fits {
            self.high = self.current - 1;
        } else {
            self.low = self.current + 1;
        }
        if self.low > self.high || self.high - self.low < self.fuzziness {
            return None;
        }
        self.current = (self.low + self.high) / 2;
        Some(self.value())
    }

    fn value(&self) -> u32 {
        if self.pot {
            1u32 << self.current
        } else {
            self.current as u32
        }
    }
}

fn ceil_log2(v: u32) -> u32 {
    if v <= 1 { 0 } else { 32 - (v - 1).leading_zeros() }
}

fn floor_log2(v: u32) -> u32 {
    if v == 0 { 0 } else { 31 - v.leading_zeros() }
}

/// Stable sort by decreasing longest side, used by fast mode.
pub fn sort_for_fast(rects: &mut [RectSize]) {
    rects.sort_by(|a, b| b.max_side().cmp(&a.max_side()));
}

/// Checks every input against the usable page area and returns the
/// per-axis lower bounds for the search.
fn check_inputs(rects: &[RectSize], settings: &PackSettings) -> Result<(u32, u32)> {
    let (mut max_w, mut max_h) = settings.usable_dimensions();
    if settings.square {
        // square pages are capped by the smaller max side on both axes
        let side = settings.max_width.min(settings.max_height);
        max_w = max_w.saturating_sub(settings.max_width - side);
        max_h = max_h.saturating_sub(settings.max_height - side);
    }
    let mut min_w = 0u32;
    let mut min_h = 0u32;
    for r in rects {
        if r.w == 0 || r.h == 0 {
            return Err(AtlasError::InvalidDimensions {
                width: r.w,
                height: r.h,
            });
        }
        let upright = r.w <= max_w && r.h <= max_h;
        let turned = settings.allow_rotation && r.h <= max_w && r.w <= max_h;
        if !upright && !turned {
            return Err(AtlasError::OversizedInput {
                id: r.id,
                width: r.w,
                height: r.h,
                max_width: max_w,
                max_height: max_h,
            });
        }
        if settings.allow_rotation {
            let short = r.w.min(r.h);
            min_w = min_w.max(short);
            min_h = min_h.max(short);
        } else {
            min_w = min_w.max(r.w);
            min_h = min_h.max(r.h);
        }
    }
    Ok((min_w.max(settings.min_width), min_h.max(settings.min_height)))
}

/// Finds the page size at which `rects` pack best and returns that page.
///
/// If no candidate size holds every rectangle, the page is filled at the
/// maximum size and the leftovers are reported in `RectPage::unplaced`.
pub fn search_page(rects: &[RectSize], settings: &PackSettings) -> Result<RectPage> {
    search_page_with_probes(rects, settings).map(|(page, _)| page)
}

/// Same as [`search_page`], also returning every candidate size it tried.
#[instrument(skip_all, fields(count = rects.len()))]
pub fn search_page_with_probes(
    rects: &[RectSize],
    settings: &PackSettings,
) -> Result<(RectPage, Vec<Probe>)> {
    if rects.is_empty() {
        return Ok((RectPage::default(), Vec::new()));
    }
    let (min_w, min_h) = check_inputs(rects, settings)?;

    let sorted;
    let rects = if settings.fast && !rects.is_sorted_by(|a, b| a.max_side() >= b.max_side()) {
        let mut v = rects.to_vec();
        sort_for_fast(&mut v);
        sorted = v;
        &sorted[..]
    } else {
        rects
    };

    let px = settings.padding_x as i64;
    let py = settings.padding_y as i64;
    // Slots carry right/bottom padding; the bin grows by one padding and
    // shrinks by whatever the page edges take.
    let (adjust_x, adjust_y) = if !settings.edge_padding {
        (px, py)
    } else if settings.duplicate_padding {
        (0, 0)
    } else {
        (-px, -py)
    };
    let bin = |size: u32, adjust: i64| {
        u32::try_from((size as i64 + adjust).max(0)).unwrap_or(u32::MAX)
    };
    let fuzziness = if settings.fast { FAST_FUZZINESS } else { FUZZINESS };

    let mut probes: Vec<Probe> = Vec::new();
    let mut probe = |w: u32, h: u32| -> Option<RectPage> {
        let result = pack_at_size(rects, settings, bin(w, adjust_x), bin(h, adjust_y), true);
        trace!(
            width = w,
            height = h,
            fits = result.is_some(),
            occupancy = result.as_ref().map(|p| p.occupancy),
            "probe"
        );
        probes.push(Probe {
            width: w,
            height: h,
            occupancy: result.as_ref().map(|p| p.occupancy),
        });
        result
    };

    let mut best: Option<RectPage> = None;
    let (max_w, max_h) = if settings.square {
        let side = settings.max_width.min(settings.max_height);
        let mut search = SizeSearch::new(
            min_w.max(min_h),
            side,
            fuzziness,
            settings.power_of_two,
        );
        let mut size = Some(search.reset());
        while let Some(s) = size {
            let result = probe(s, s);
            let fits = result.is_some();
            best = better(best, result);
            size = search.next(fits);
        }
        (side, side)
    } else {
        let mut width_search =
            SizeSearch::new(min_w, settings.max_width, fuzziness, settings.power_of_two);
        let mut height_search =
            SizeSearch::new(min_h, settings.max_height, fuzziness, settings.power_of_two);
        let mut width = Some(width_search.reset());
        while let Some(w) = width {
            let mut best_for_width: Option<RectPage> = None;
            let mut height = Some(height_search.reset());
            while let Some(h) = height {
                let result = probe(w, h);
                let fits = result.is_some();
                best_for_width = better(best_for_width, result);
                height = height_search.next(fits);
            }
            let fits = best_for_width.is_some();
            best = better(best, best_for_width);
            width = width_search.next(fits);
        }
        (settings.max_width, settings.max_height)
    };

    let mut page = match best {
        Some(page) => page,
        None => {
            debug!(count = rects.len(), "no size fits every input; filling a max-size page");
            pack_at_size(rects, settings, bin(max_w, adjust_x), bin(max_h, adjust_y), false)
                .ok_or(AtlasError::OutOfSpace {
                    placed: 0,
                    total: rects.len(),
                })?
        }
    };

    page.width = page.width.saturating_sub(settings.padding_x);
    page.height = page.height.saturating_sub(settings.padding_y);
    if settings.square {
        // square including edge offsets; both axes were probed at one side
        let (off_x, off_y) = settings.edge_offset();
        let side = (page.width + 2 * off_x).max(page.height + 2 * off_y);
        page.width = side - 2 * off_x;
        page.height = side - 2 * off_y;
    }
    page.placed.sort_by_key(|p| (p.rect.y, p.rect.x));

    debug!(
        width = page.width,
        height = page.height,
        placed = page.placed.len(),
        unplaced = page.unplaced.len(),
        occupancy = page.occupancy,
        probes = probes.len(),
        "page searched"
    );
    Ok((page, probes))
}

/// Keeps `a` unless `b` has strictly higher occupancy.
fn better(a: Option<RectPage>, b: Option<RectPage>) -> Option<RectPage> {
    match (a, b) {
        (None, b) => b,
        (a, None) => a,
        (Some(a), Some(b)) => {
            if b.occupancy > a.occupancy {
                Some(b)
            } else {
                Some(a)
            }
        }
    }
}

/// Packs `rects` into a `width x height` bin with every configured heuristic
/// and returns the best-occupancy layout. With `fully`, layouts leaving any
/// rectangle behind are discarded.
fn pack_at_size(
    rects: &[RectSize],
    settings: &PackSettings,
    width: u32,
    height: u32,
    fully: bool,
) -> Option<RectPage> {
    if width == 0 || height == 0 {
        return None;
    }
    let mut best: Option<RectPage> = None;
    for result in evaluate_heuristics(rects, settings, width, height) {
        if fully && !result.unplaced.is_empty() {
            continue;
        }
        if result.placed.is_empty() {
            continue;
        }
        best = better(best, Some(result));
    }
    best
}

#[cfg(not(feature = "parallel"))]
fn evaluate_heuristics(
    rects: &[RectSize],
    settings: &PackSettings,
    width: u32,
    height: u32,
) -> Vec<RectPage> {
    let mut bin = MaxRectsBin::new(width, height, settings.allow_rotation)
        .with_padding(settings.padding_x, settings.padding_y);
    settings
        .heuristics
        .iter()
        .map(|&heuristic| {
            bin.init(width, height);
            run_heuristic(&mut bin, rects, heuristic, settings.fast)
        })
        .collect()
}

#[cfg(feature = "parallel")]
fn evaluate_heuristics(
    rects: &[RectSize],
    settings: &PackSettings,
    width: u32,
    height: u32,
) -> Vec<RectPage> {
    settings
        .heuristics
        .par_iter()
        .map(|&heuristic| {
            let mut bin = MaxRectsBin::new(width, height, settings.allow_rotation)
                .with_padding(settings.padding_x, settings.padding_y);
            run_heuristic(&mut bin, rects, heuristic, settings.fast)
        })
        .collect()
}

fn run_heuristic(
    bin: &mut MaxRectsBin,
    rects: &[RectSize],
    heuristic: FreeRectChoiceHeuristic,
    fast: bool,
) -> RectPage {
    if !fast {
        return bin.pack(rects, heuristic);
    }
    // greedy single pass; stops at the first rectangle that does not fit
    let mut unplaced = Vec::new();
    for (i, r) in rects.iter().enumerate() {
        if bin.insert(r.w, r.h, r.id, heuristic).is_none() {
            unplaced = rects[i..].to_vec();
            break;
        }
    }
    let mut page = bin.result();
    page.unplaced = unplaced;
    page
}
