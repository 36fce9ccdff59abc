use crate::config::FreeRectChoiceHeuristic;
use crate::model::{PlacedRect, Rect, RectPage, RectSize};

/// A scored candidate position for one rectangle. Lower scores are better.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    rect: Rect,
    rotated: bool,
    score1: i64,
    score2: i64,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        self.score1 < other.score1 || (self.score1 == other.score1 && self.score2 < other.score2)
    }
}

/// MaxRects bin: tracks maximal free rectangles of a fixed-size bin.
///
/// Free rectangles may overlap each other but never overlap a used slot,
/// and after every placement no free rectangle is contained in another.
///
/// With padding set, every slot reserves `padding_x` extra columns on its
/// right and `padding_y` extra rows below, applied after rotation.
pub struct MaxRectsBin {
    bin_width: u32,
    bin_height: u32,
    allow_rotation: bool,
    padding: (u32, u32),
    used: Vec<PlacedRect>,
    free: Vec<Rect>,
}

impl MaxRectsBin {
    pub fn new(width: u32, height: u32, allow_rotation: bool) -> Self {
        let mut bin = Self {
            bin_width: 0,
            bin_height: 0,
            allow_rotation,
            padding: (0, 0),
            used: Vec::new(),
            free: Vec::new(),
        };
        bin.init(width, height);
        bin
    }

    /// Resets the bin to `width x height` with a single free region, keeping allocations.
    pub fn init(&mut self, width: u32, height: u32) {
        self.bin_width = width;
        self.bin_height = height;
        self.used.clear();
        self.free.clear();
        if width > 0 && height > 0 {
            self.free.push(Rect::new(0, 0, width, height));
        }
    }

    /// Sets right/bottom padding reserved around every subsequent placement.
    pub fn with_padding(mut self, padding_x: u32, padding_y: u32) -> Self {
        self.padding = (padding_x, padding_y);
        self
    }

    pub fn bin_width(&self) -> u32 {
        self.bin_width
    }

    pub fn bin_height(&self) -> u32 {
        self.bin_height
    }

    /// Reserved slots, padding included.
    pub fn used(&self) -> &[PlacedRect] {
        &self.used
    }

    pub fn free(&self) -> &[Rect] {
        &self.free
    }

    /// Places a single `width x height` rectangle. Returns `None` if no free
    /// region can hold it in any allowed orientation; the bin is left untouched.
    pub fn insert(
        &mut self,
        width: u32,
        height: u32,
        id: usize,
        heuristic: FreeRectChoiceHeuristic,
    ) -> Option<PlacedRect> {
        let best = self.find_position(width, height, heuristic)?;
        let slot = PlacedRect {
            rect: best.rect,
            id,
            rotated: best.rotated,
        };
        self.place_rect(slot);
        Some(self.content_of(&slot))
    }

    /// Offline batch packing: at every step the remaining rectangle with the
    /// best score is placed. Stops when nothing else fits. O(n²) in `rects`.
    pub fn pack(&mut self, rects: &[RectSize], heuristic: FreeRectChoiceHeuristic) -> RectPage {
        let mut remaining: Vec<RectSize> = rects.to_vec();
        while !remaining.is_empty() {
            let mut best: Option<(usize, Candidate)> = None;
            for (i, r) in remaining.iter().enumerate() {
                let Some(cand) = self.find_position(r.w, r.h, heuristic) else {
                    continue;
                };
                let better = match &best {
                    None => true,
                    Some((_, b)) => cand.beats(b),
                };
                if better {
                    best = Some((i, cand));
                }
            }
            let Some((idx, cand)) = best else {
                break;
            };
            let r = remaining.remove(idx);
            self.place_rect(PlacedRect {
                rect: cand.rect,
                id: r.id,
                rotated: cand.rotated,
            });
        }
        let mut page = self.result();
        page.unplaced = remaining;
        page
    }

    /// Used area divided by bin area.
    pub fn occupancy(&self) -> f64 {
        let bin_area = (self.bin_width as u64) * (self.bin_height as u64);
        if bin_area == 0 {
            return 0.0;
        }
        let used: u64 = self.used.iter().map(|u| u.rect.area()).sum();
        used as f64 / bin_area as f64
    }

    /// Snapshot of the current placements as a page sized to the bounding box
    /// of the reserved slots. Placed rects are reported without padding.
    pub fn result(&self) -> RectPage {
        let mut w = 0u32;
        let mut h = 0u32;
        for u in &self.used {
            w = w.max(u.rect.right());
            h = h.max(u.rect.bottom());
        }
        RectPage {
            width: w,
            height: h,
            bin_width: self.bin_width,
            bin_height: self.bin_height,
            placed: self.used.iter().map(|u| self.content_of(u)).collect(),
            unplaced: Vec::new(),
            occupancy: self.occupancy(),
        }
    }

    fn content_of(&self, slot: &PlacedRect) -> PlacedRect {
        let (px, py) = self.padding;
        PlacedRect {
            rect: Rect::new(slot.rect.x, slot.rect.y, slot.rect.w - px, slot.rect.h - py),
            ..*slot
        }
    }

    fn find_position(
        &self,
        w: u32,
        h: u32,
        heuristic: FreeRectChoiceHeuristic,
    ) -> Option<Candidate> {
        if w == 0 || h == 0 {
            return None;
        }
        let (px, py) = self.padding;
        let (sw, sh) = (w + px, h + py);
        let (rw, rh) = (h + px, w + py);
        let try_rotated = self.allow_rotation && w != h;
        let mut best: Option<Candidate> = None;
        for fr in &self.free {
            if fr.w >= sw && fr.h >= sh {
                let cand = self.score(fr, sw, sh, false, heuristic);
                if best.as_ref().is_none_or(|b| cand.beats(b)) {
                    best = Some(cand);
                }
            }
            if try_rotated && fr.w >= rw && fr.h >= rh {
                let cand = self.score(fr, rw, rh, true, heuristic);
                if best.as_ref().is_none_or(|b| cand.beats(b)) {
                    best = Some(cand);
                }
            }
        }
        best
    }

    fn score(
        &self,
        fr: &Rect,
        w: u32,
        h: u32,
        rotated: bool,
        heuristic: FreeRectChoiceHeuristic,
    ) -> Candidate {
        let leftover_h = (fr.w - w) as i64;
        let leftover_v = (fr.h - h) as i64;
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        let area_fit = fr.area() as i64 - (w as i64) * (h as i64);
        let (score1, score2) = match heuristic {
            FreeRectChoiceHeuristic::BestShortSideFit => (short_fit, long_fit),
            FreeRectChoiceHeuristic::BestLongSideFit => (long_fit, short_fit),
            FreeRectChoiceHeuristic::BestAreaFit => (area_fit, short_fit),
            FreeRectChoiceHeuristic::BottomLeft => (fr.y as i64 + h as i64, fr.x as i64),
            FreeRectChoiceHeuristic::ContactPoint => {
                // maximize contact: negate for minimization
                let contact = self.contact_point_score(&Rect::new(fr.x, fr.y, w, h));
                (-(contact as i64), area_fit)
            }
        };
        Candidate {
            rect: Rect::new(fr.x, fr.y, w, h),
            rotated,
            score1,
            score2,
        }
    }

    fn contact_point_score(&self, node: &Rect) -> u64 {
        let mut score = 0u64;
        if node.x == 0 || node.right() == self.bin_width {
            score += node.h as u64;
        }
        if node.y == 0 || node.bottom() == self.bin_height {
            score += node.w as u64;
        }
        for u in &self.used {
            let u = &u.rect;
            if u.x == node.right() || u.right() == node.x {
                score += overlap_1d(u.y, u.bottom(), node.y, node.bottom()) as u64;
            }
            if u.y == node.bottom() || u.bottom() == node.y {
                score += overlap_1d(u.x, u.right(), node.x, node.right()) as u64;
            }
        }
        score
    }

    fn place_rect(&mut self, node: PlacedRect) {
        let mut new_free: Vec<Rect> = Vec::new();
        let mut i = 0usize;
        while i < self.free.len() {
            let fr = self.free[i];
            if fr.intersects(&node.rect) {
                self.free.remove(i);
                split_free_node(&fr, &node.rect, &mut new_free);
            } else {
                i += 1;
            }
        }
        self.free.extend(new_free);
        self.prune_free_list();
        self.used.push(node);
    }

    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let mut j = i + 1;
            let mut remove_i = false;
            while j < self.free.len() {
                if self.free[j].contains(&self.free[i]) {
                    remove_i = true;
                    break;
                }
                if self.free[i].contains(&self.free[j]) {
                    self.free.remove(j);
                } else {
                    j += 1;
                }
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

/// Splits `fr` around `node` into up to four maximal sub-regions.
fn split_free_node(fr: &Rect, node: &Rect, out: &mut Vec<Rect>) {
    if node.x < fr.right() && node.right() > fr.x {
        // above
        if node.y > fr.y && node.y < fr.bottom() {
            out.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
        }
        // below
        if node.bottom() < fr.bottom() {
            out.push(Rect::new(fr.x, node.bottom(), fr.w, fr.bottom() - node.bottom()));
        }
    }
    if node.y < fr.bottom() && node.bottom() > fr.y {
        // left
        if node.x > fr.x && node.x < fr.right() {
            out.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
        }
        // right
        if node.right() < fr.right() {
            out.push(Rect::new(node.right(), fr.y, fr.right() - node.right(), fr.h));
        }
    }
}

fn overlap_1d(a1: u32, a2: u32, b1: u32, b2: u32) -> u32 {
    let start = a1.max(b1);
    let end = a2.min(b2);
    end.saturating_sub(start)
}
