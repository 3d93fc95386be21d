//! Rectangles and binary space partitioning
//!
//! The layout area is split recursively into leaf rectangles. Each accepted
//! leaf later receives exactly one room, so leaf disjointness is what keeps
//! rooms from overlapping.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::GeneratorConfig;
use crate::rng::GameRng;

use super::Pos;

/// An inclusive rectangle of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left x coordinate
    pub lx: usize,
    /// Top y coordinate
    pub ly: usize,
    /// Right x coordinate
    pub hx: usize,
    /// Bottom y coordinate
    pub hy: usize,
}

impl Rect {
    /// Create a new rectangle
    pub fn new(lx: usize, ly: usize, hx: usize, hy: usize) -> Self {
        Self { lx, ly, hx, hy }
    }

    /// Get the width of the rectangle
    pub fn width(&self) -> usize {
        if self.hx >= self.lx {
            self.hx - self.lx + 1
        } else {
            0
        }
    }

    /// Get the height of the rectangle
    pub fn height(&self) -> usize {
        if self.hy >= self.ly {
            self.hy - self.ly + 1
        } else {
            0
        }
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Check if this rectangle contains a cell
    pub fn contains_pos(&self, (x, y): Pos) -> bool {
        self.lx <= x && x <= self.hx && self.ly <= y && y <= self.hy
    }

    /// Check if this rectangle intersects another
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.hx < other.lx || self.lx > other.hx || self.hy < other.ly || self.ly > other.hy)
    }

    /// Middle cell (rounded towards the top-left)
    pub fn center(&self) -> Pos {
        ((self.lx + self.hx) / 2, (self.ly + self.hy) / 2)
    }

    /// Grow by `by` cells on every side, clamped to `width` x `height`
    pub fn expand(&self, by: usize, width: usize, height: usize) -> Rect {
        Rect::new(
            self.lx.saturating_sub(by),
            self.ly.saturating_sub(by),
            (self.hx + by).min(width.saturating_sub(1)),
            (self.hy + by).min(height.saturating_sub(1)),
        )
    }

    /// Smallest rectangle holding every position (None for no positions)
    pub fn bounding(positions: &[Pos]) -> Option<Rect> {
        let (&(x0, y0), rest) = positions.split_first()?;
        Some(rest.iter().fold(Rect::new(x0, y0, x0, y0), |r, &(x, y)| {
            Rect::new(r.lx.min(x), r.ly.min(y), r.hx.max(x), r.hy.max(y))
        }))
    }

    /// Cells inside the rectangle in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Pos> + use<> {
        let (lx, hx) = (self.lx, self.hx);
        (self.ly..=self.hy).flat_map(move |y| (lx..=hx).map(move |x| (x, y)))
    }
}

/// Split direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    /// Cut with a vertical line (children side by side)
    Vertical,
    /// Cut with a horizontal line (children stacked)
    Horizontal,
}

/// Output of the partitioner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Accepted leaves, depth-first, first child before second
    pub leaves: Vec<Rect>,
    /// Leaves dropped for being too small to host a room
    pub rejected: usize,
    /// Deepest split level reached
    pub depth: u32,
}

/// Recursively partition a `width` x `height` area
pub fn partition(width: usize, height: usize, config: &GeneratorConfig, rng: &mut GameRng) -> Partition {
    let root = Rect::new(0, 0, width - 1, height - 1);
    let mut out = Partition::default();
    split(root, 0, config, rng, &mut out);

    if out.leaves.is_empty() {
        // Dimension bounds guarantee the root itself fits one room
        trace!(rejected = out.rejected, "no usable leaf, falling back to the root");
        out.leaves.push(root);
    }
    out
}

fn split(rect: Rect, depth: u32, config: &GeneratorConfig, rng: &mut GameRng, out: &mut Partition) {
    out.depth = out.depth.max(depth);

    if depth < config.max_depth {
        let axes = if depth % 2 == 0 {
            [Axis::Vertical, Axis::Horizontal]
        } else {
            [Axis::Horizontal, Axis::Vertical]
        };
        for axis in axes {
            if let Some((first, second)) = try_split(rect, axis, config, rng) {
                split(first, depth + 1, config, rng, out);
                split(second, depth + 1, config, rng, out);
                return;
            }
        }
    }

    if is_usable_leaf(&rect, config) {
        out.leaves.push(rect);
    } else {
        out.rejected += 1;
    }
}

/// Range of valid first-child lengths for a side of `len` cells
fn split_bounds(len: usize, config: &GeneratorConfig) -> Option<(usize, usize)> {
    let lo = (len * config.split_min_percent).div_ceil(100).max(config.min_leaf_side);
    let hi = (len * config.split_max_percent / 100).min(len.saturating_sub(config.min_leaf_side));
    (lo <= hi && lo > 0).then_some((lo, hi))
}

fn try_split(
    rect: Rect,
    axis: Axis,
    config: &GeneratorConfig,
    rng: &mut GameRng,
) -> Option<(Rect, Rect)> {
    match axis {
        Axis::Vertical => {
            let (lo, hi) = split_bounds(rect.width(), config)?;
            let at = rng.between(lo, hi);
            Some((
                Rect::new(rect.lx, rect.ly, rect.lx + at - 1, rect.hy),
                Rect::new(rect.lx + at, rect.ly, rect.hx, rect.hy),
            ))
        }
        Axis::Horizontal => {
            let (lo, hi) = split_bounds(rect.height(), config)?;
            let at = rng.between(lo, hi);
            Some((
                Rect::new(rect.lx, rect.ly, rect.hx, rect.ly + at - 1),
                Rect::new(rect.lx, rect.ly + at, rect.hx, rect.hy),
            ))
        }
    }
}

/// Check if a leaf is large enough for a room plus its margins
pub fn is_usable_leaf(rect: &Rect, config: &GeneratorConfig) -> bool {
    let min_side = config.min_usable_side();
    rect.width() >= min_side && rect.height() >= min_side && rect.area() >= config.min_leaf_area
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_dimensions() {
        let r = Rect::new(10, 20, 15, 25);
        assert_eq!(r.width(), 6);
        assert_eq!(r.height(), 6);
        assert_eq!(r.area(), 36);
        assert_eq!(r.center(), (12, 22));
    }

    #[test]
    fn test_rect_intersects() {
        let r1 = Rect::new(0, 0, 10, 10);
        let r2 = Rect::new(5, 5, 15, 15);
        let r3 = Rect::new(20, 20, 30, 30);

        assert!(r1.intersects(&r2));
        assert!(r2.intersects(&r1));
        assert!(!r1.intersects(&r3));
    }

    #[test]
    fn test_bounding_and_expand() {
        let r = Rect::bounding(&[(4, 7), (2, 9), (6, 8)]).unwrap();
        assert_eq!(r, Rect::new(2, 7, 6, 9));
        assert_eq!(r.expand(1, 7, 10), Rect::new(1, 6, 6, 9));
        assert!(Rect::bounding(&[]).is_none());
    }

    #[test]
    fn test_positions_row_major() {
        let cells: Vec<_> = Rect::new(1, 1, 2, 2).positions().collect();
        assert_eq!(cells, vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
    }

    #[test]
    fn test_partition_leaves_are_disjoint_and_inside() {
        let config = GeneratorConfig::default();
        let mut rng = GameRng::new(42);
        let part = partition(60, 40, &config, &mut rng);

        assert!(part.leaves.len() > 1);
        let bounds = Rect::new(0, 0, 59, 39);
        for (i, a) in part.leaves.iter().enumerate() {
            assert!(bounds.contains_pos((a.lx, a.ly)) && bounds.contains_pos((a.hx, a.hy)));
            assert!(is_usable_leaf(a, &config));
            for b in &part.leaves[i + 1..] {
                assert!(!a.intersects(b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_partition_respects_depth() {
        let config = GeneratorConfig {
            max_depth: 2,
            ..Default::default()
        };
        let mut rng = GameRng::new(9);
        let part = partition(200, 200, &config, &mut rng);
        assert!(part.leaves.len() <= 4);
        assert!(part.depth <= 2);
    }

    #[test]
    fn test_partition_is_deterministic() {
        let config = GeneratorConfig::default();
        let a = partition(80, 50, &config, &mut GameRng::new(77));
        let b = partition(80, 50, &config, &mut GameRng::new(77));
        assert_eq!(a, b);
    }

    #[test]
    fn test_tiny_area_falls_back_to_root() {
        let config = GeneratorConfig {
            min_leaf_area: 1000,
            ..Default::default()
        };
        let mut rng = GameRng::new(1);
        let part = partition(8, 8, &config, &mut rng);
        assert_eq!(part.leaves, vec![Rect::new(0, 0, 7, 7)]);
        assert_eq!(part.rejected, 1);
    }

    #[test]
    fn test_split_bounds_band() {
        let config = GeneratorConfig::default();
        assert_eq!(split_bounds(10, &config), None);
        let (lo, hi) = split_bounds(40, &config).unwrap();
        assert_eq!((lo, hi), (14, 26));
    }
}
