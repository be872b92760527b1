//! PixelBoundingBox - Rectangle on a pixel grid
//!
//! The box stores its left/top corner and the exclusive right/bottom ends,
//! so an empty box is simply one with no columns or rows. Accessors expose
//! both the inclusive (`right`, `bottom`) and the exclusive ends.

/// Axis-aligned pixel rectangle, possibly empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelBoundingBox {
    left: u32,
    top: u32,
    right_end: u32,
    bottom_end: u32,
}

impl PixelBoundingBox {
    /// Create a box from inclusive corners.
    ///
    /// An inverted rectangle (`right < left` or `bottom < top`) yields the
    /// empty box.
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        if right < left || bottom < top {
            return Self::empty();
        }
        Self {
            left,
            top,
            right_end: right + 1,
            bottom_end: bottom + 1,
        }
    }

    /// Create a box from its top-left corner and size.
    pub fn from_size(left: u32, top: u32, width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return Self::empty();
        }
        Self {
            left,
            top,
            right_end: left + width,
            bottom_end: top + height,
        }
    }

    /// The box containing no pixel.
    pub const fn empty() -> Self {
        Self {
            left: 0,
            top: 0,
            right_end: 0,
            bottom_end: 0,
        }
    }

    /// True if the box holds at least one pixel.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.right_end > self.left && self.bottom_end > self.top
    }

    #[inline]
    pub fn left(&self) -> u32 {
        self.left
    }

    #[inline]
    pub fn top(&self) -> u32 {
        self.top
    }

    /// Inclusive right column. Meaningless for an empty box.
    #[inline]
    pub fn right(&self) -> u32 {
        self.right_end.saturating_sub(1)
    }

    /// Inclusive bottom row. Meaningless for an empty box.
    #[inline]
    pub fn bottom(&self) -> u32 {
        self.bottom_end.saturating_sub(1)
    }

    /// Exclusive right end.
    #[inline]
    pub fn right_end(&self) -> u32 {
        self.right_end
    }

    /// Exclusive bottom end.
    #[inline]
    pub fn bottom_end(&self) -> u32 {
        self.bottom_end
    }

    #[inline]
    pub fn width(&self) -> u32 {
        if self.is_valid() {
            self.right_end - self.left
        } else {
            0
        }
    }

    #[inline]
    pub fn height(&self) -> u32 {
        if self.is_valid() {
            self.bottom_end - self.top
        } else {
            0
        }
    }

    #[inline]
    pub fn pixels(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    #[inline]
    pub fn contains_point(&self, x: u32, y: u32) -> bool {
        x >= self.left && x < self.right_end && y >= self.top && y < self.bottom_end
    }

    /// True if every pixel of `other` lies inside this box.
    ///
    /// The empty box is contained in every box.
    pub fn contains_box(&self, other: &PixelBoundingBox) -> bool {
        if !other.is_valid() {
            return true;
        }
        self.is_valid()
            && other.left >= self.left
            && other.top >= self.top
            && other.right_end <= self.right_end
            && other.bottom_end <= self.bottom_end
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &PixelBoundingBox) -> PixelBoundingBox {
        match (self.is_valid(), other.is_valid()) {
            (false, _) => *other,
            (_, false) => *self,
            _ => PixelBoundingBox {
                left: self.left.min(other.left),
                top: self.top.min(other.top),
                right_end: self.right_end.max(other.right_end),
                bottom_end: self.bottom_end.max(other.bottom_end),
            },
        }
    }

    /// Overlapping part of both boxes, empty if they do not overlap.
    pub fn intersection(&self, other: &PixelBoundingBox) -> PixelBoundingBox {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right_end = self.right_end.min(other.right_end);
        let bottom_end = self.bottom_end.min(other.bottom_end);
        if left < right_end && top < bottom_end {
            PixelBoundingBox {
                left,
                top,
                right_end,
                bottom_end,
            }
        } else {
            Self::empty()
        }
    }

    /// The area this box covers on a grid with twice the resolution.
    ///
    /// Inclusive corners map to `(left*2, top*2, right*2+1, bottom*2+1)`.
    pub fn upscaled_by_two(&self) -> PixelBoundingBox {
        if !self.is_valid() {
            return Self::empty();
        }
        PixelBoundingBox {
            left: self.left * 2,
            top: self.top * 2,
            right_end: self.right_end * 2,
            bottom_end: self.bottom_end * 2,
        }
    }

    /// Restrict the box to a `width x height` grid.
    pub fn clipped(&self, width: u32, height: u32) -> PixelBoundingBox {
        self.intersection(&PixelBoundingBox::from_size(0, 0, width, height))
    }

    /// Grow the box by `margin` pixels on every side, clipped to the grid.
    pub fn extended(&self, margin: u32, width: u32, height: u32) -> PixelBoundingBox {
        if !self.is_valid() {
            return Self::empty();
        }
        PixelBoundingBox {
            left: self.left.saturating_sub(margin),
            top: self.top.saturating_sub(margin),
            right_end: self.right_end.saturating_add(margin).min(width),
            bottom_end: self.bottom_end.saturating_add(margin).min(height),
        }
    }
}

impl std::fmt::Display for PixelBoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(
                f,
                "[{}, {}]x[{}, {}]",
                self.left,
                self.right(),
                self.top,
                self.bottom()
            )
        } else {
            write!(f, "[empty]")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_inclusive_corners() {
        let b = PixelBoundingBox::new(2, 3, 5, 4);
        assert!(b.is_valid());
        assert_eq!(b.width(), 4);
        assert_eq!(b.height(), 2);
        assert_eq!(b.right(), 5);
        assert_eq!(b.bottom_end(), 5);
        assert!(b.contains_point(5, 4));
        assert!(!b.contains_point(6, 4));
    }

    #[test]
    fn test_box_empty() {
        let b = PixelBoundingBox::new(5, 0, 4, 0);
        assert!(!b.is_valid());
        assert_eq!(b, PixelBoundingBox::default());
        assert_eq!(b.width(), 0);
        assert!(!b.contains_point(0, 0));
        assert_eq!(b.to_string(), "[empty]");
    }

    #[test]
    fn test_box_union_and_intersection() {
        let a = PixelBoundingBox::new(0, 0, 3, 3);
        let b = PixelBoundingBox::new(2, 2, 6, 5);
        let u = a.union(&b);
        assert_eq!(u, PixelBoundingBox::new(0, 0, 6, 5));
        assert_eq!(a.intersection(&b), PixelBoundingBox::new(2, 2, 3, 3));
        let far = PixelBoundingBox::new(10, 10, 11, 11);
        assert!(!a.intersection(&far).is_valid());
        assert_eq!(PixelBoundingBox::empty().union(&a), a);
    }

    #[test]
    fn test_box_upscaled_contains_children() {
        let coarse = PixelBoundingBox::new(1, 2, 3, 2);
        let fine = coarse.upscaled_by_two();
        assert_eq!(fine, PixelBoundingBox::new(2, 4, 7, 5));
        assert!(fine.contains_box(&PixelBoundingBox::new(3, 4, 6, 5)));
        assert!(fine.contains_box(&PixelBoundingBox::empty()));
    }

    #[test]
    fn test_box_clip_and_extend() {
        let b = PixelBoundingBox::new(1, 1, 8, 8);
        assert_eq!(b.clipped(5, 4), PixelBoundingBox::new(1, 1, 4, 3));
        assert_eq!(b.extended(2, 10, 9), PixelBoundingBox::new(0, 0, 9, 8));
    }
}
