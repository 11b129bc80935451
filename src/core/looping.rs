//! Infinite-loop position mapping.
//!
//! In loop mode the scroll position is unbounded and page indices wrap
//! modulo the page count.  For every actual page we pick the "virtual"
//! repetition closest to the visible window, so the stack cycles without a
//! seam.  When the page count does not exceed the visible depth the mapper is
//! a pass-through.

/// Pages considered on either side of the visible window when searching for
/// a repetition.
const DEFAULT_BUFFER: usize = 2;

/// Renormalise only once the position exceeds this many loops.
const DEFAULT_RENORMALIZE_LOOPS: f64 = 100.0;

/// Wrap a virtual index onto `[0, total)`.
pub fn actual_index(virtual_index: i64, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let n = total as i64;
    // rem_euclid is always non-negative for a positive modulus.
    virtual_index.rem_euclid(n) as usize
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopMapper {
    pub enabled: bool,
    /// Number of pages in the visible window.
    pub visible_depth: usize,
    pub buffer: usize,
    pub renormalize_loops: f64,
}

impl LoopMapper {
    pub fn new(enabled: bool, visible_depth: usize) -> Self {
        Self {
            enabled,
            visible_depth,
            buffer: DEFAULT_BUFFER,
            renormalize_loops: DEFAULT_RENORMALIZE_LOOPS,
        }
    }

    /// Looping only kicks in when there are more pages than fit in view.
    pub fn is_active(&self, total: usize) -> bool {
        self.enabled && total > self.visible_depth
    }

    /// The virtual index of `page` that should be rendered at `scroll`.
    pub fn virtual_position(&self, page: usize, scroll: f64, total: usize) -> i64 {
        if !self.is_active(total) || !scroll.is_finite() {
            return page as i64;
        }
        let base = scroll.floor() as i64;
        let window_end = base + self.visible_depth as i64;
        let lo = base - self.buffer as i64;
        let hi = window_end + self.buffer as i64;

        let distance = |v: i64| {
            if v < base {
                base - v
            } else if v > window_end {
                v - window_end
            } else {
                0
            }
        };

        let mut best: Option<(i64, i64)> = None;
        for v in lo..=hi {
            if actual_index(v, total) != page {
                continue;
            }
            let d = distance(v);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((v, d));
            }
        }
        if let Some((v, _)) = best {
            return v;
        }

        // No repetition inside the search range: take the nearest one on
        // either side of the window.
        let offset = (page as i64 - actual_index(base, total) as i64).rem_euclid(total as i64);
        let ahead = base + offset;
        let behind = ahead - total as i64;
        if distance(behind) < distance(ahead) {
            behind
        } else {
            ahead
        }
    }

    /// `page - scroll`, using the best virtual repetition when looping.
    pub fn relative_position(&self, page: usize, scroll: f64, total: usize) -> f64 {
        if !self.is_active(total) {
            return page as f64 - scroll;
        }
        self.virtual_position(page, scroll, total) as f64 - scroll
    }

    /// Rank of a read page inside the read pile.  In bounded mode this is the
    /// page index; in loop mode it counts back from the page in flight
    /// (`total - 1`) so the pile stays ordered across the wrap and no rank
    /// changes when the scroll leaves an integer.
    pub fn read_rank(&self, page: usize, scroll: f64, total: usize) -> f64 {
        if !self.is_active(total) {
            return page as f64;
        }
        let rel = self.relative_position(page, scroll, total);
        (total as f64 - 1.0 + rel.ceil()).max(0.0)
    }

    /// Fold a long-running position back near zero.  Small positions are left
    /// alone so in-flight animations never see a jump.
    pub fn normalize_position(&self, scroll: f64, total: usize) -> f64 {
        if total == 0 || !scroll.is_finite() {
            return scroll;
        }
        let n = total as f64;
        if scroll.abs() > self.renormalize_loops * n {
            scroll.rem_euclid(n)
        } else {
            scroll
        }
    }

    /// Nearest position congruent to `target` (mod `total`) from `position`.
    pub fn nearest_virtual_target(&self, target: i64, position: f64, total: usize) -> f64 {
        let n = total as i64;
        let here = position.round() as i64;
        let offset = (target - here).rem_euclid(n);
        let forward = here + offset;
        let backward = forward - n;
        if (forward as f64 - position).abs() <= (position - backward as f64).abs() {
            forward as f64
        } else {
            backward as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actual_index_is_never_negative() {
        assert_eq!(actual_index(-1, 10), 9);
        assert_eq!(actual_index(-21, 10), 9);
        assert_eq!(actual_index(23, 10), 3);
        assert_eq!(actual_index(0, 10), 0);
        assert_eq!(actual_index(5, 0), 0);
    }

    #[test]
    fn wraps_forward_near_the_end() {
        let mapper = LoopMapper::new(true, 5);
        // Page 0 at scroll 9.5 should be rendered as virtual 10, just ahead.
        assert_eq!(mapper.virtual_position(0, 9.5, 10), 10);
        let rel = mapper.relative_position(0, 9.5, 10);
        assert!((rel - 0.5).abs() < 1e-12);
    }

    #[test]
    fn recently_read_pages_stay_behind() {
        let mapper = LoopMapper::new(true, 5);
        assert_eq!(mapper.virtual_position(8, 9.5, 10), 8);
        assert_eq!(mapper.virtual_position(9, 0.2, 10), -1);
    }

    #[test]
    fn inactive_mapper_is_pass_through() {
        let disabled = LoopMapper::new(false, 5);
        assert_eq!(disabled.relative_position(0, 9.5, 10), -9.5);

        let too_few = LoopMapper::new(true, 5);
        assert!(!too_few.is_active(4));
        assert_eq!(too_few.relative_position(1, 3.0, 4), -2.0);
        assert_eq!(too_few.read_rank(1, 3.0, 4), 1.0);
    }

    #[test]
    fn normalizes_only_far_positions() {
        let mapper = LoopMapper::new(true, 5);
        assert_eq!(mapper.normalize_position(57.25, 10), 57.25);
        assert!((mapper.normalize_position(1_003.25, 10) - 3.25).abs() < 1e-9);
        assert!((mapper.normalize_position(-1_003.25, 10) - 6.75).abs() < 1e-9);
    }

    #[test]
    fn nearest_target_takes_the_short_way_round() {
        let mapper = LoopMapper::new(true, 5);
        assert_eq!(mapper.nearest_virtual_target(0, 9.0, 10), 10.0);
        assert_eq!(mapper.nearest_virtual_target(9, 10.0, 10), 9.0);
        assert_eq!(mapper.nearest_virtual_target(3, 21.0, 10), 23.0);
    }

    #[test]
    fn read_rank_counts_back_from_latest() {
        let mapper = LoopMapper::new(true, 5);
        // At scroll 12, page 1 (virtual 11) was just read, page 0 (10) before it.
        let latest = mapper.read_rank(1, 12.0, 10);
        let earlier = mapper.read_rank(0, 12.0, 10);
        assert_eq!(latest, 8.0);
        assert_eq!(earlier, 7.0);
    }

    #[test]
    fn read_rank_is_stable_as_a_flip_starts() {
        let mapper = LoopMapper::new(true, 5);
        for page in [0, 1, 9] {
            assert_eq!(
                mapper.read_rank(page, 12.0, 10),
                mapper.read_rank(page, 12.0001, 10),
                "page {page}"
            );
        }
        // The page lifting off lands on top of the pile.
        assert_eq!(mapper.read_rank(2, 12.0001, 10), 9.0);
        assert_eq!(mapper.read_rank(2, 12.9999, 10), 9.0);
    }
}
