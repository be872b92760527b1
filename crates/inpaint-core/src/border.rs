//! Mirrored border locations
//!
//! Kernels reaching outside a frame read the pixel mirrored at the border,
//! the border pixel itself being repeated:
//!
//! ```text
//! position: -3 -2 -1 | 0 1 ... s-1 | s   s+1 s+2
//! mirrored:  2  1  0 | 0 1 ... s-1 | s-1 s-2 s-3
//! ```

/// Location of `position` inside `[0, size)`, mirrored at both borders.
///
/// `position` must lie in `[-size, 2 * size)`.
///
/// # Examples
///
/// ```
/// use inpaint_core::mirrored_index;
///
/// assert_eq!(mirrored_index(-2, 5), 1);
/// assert_eq!(mirrored_index(3, 5), 3);
/// assert_eq!(mirrored_index(6, 5), 3);
/// ```
#[inline]
pub fn mirrored_index(position: isize, size: usize) -> usize {
    debug_assert!(position >= -(size as isize) && position < 2 * size as isize);
    if position < 0 {
        (-position - 1) as usize
    } else if position as usize >= size {
        2 * size - position as usize - 1
    } else {
        position as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirrored_index_left() {
        assert_eq!(mirrored_index(-1, 4), 0);
        assert_eq!(mirrored_index(-3, 4), 2);
        assert_eq!(mirrored_index(-4, 4), 3);
    }

    #[test]
    fn test_mirrored_index_right() {
        assert_eq!(mirrored_index(4, 4), 3);
        assert_eq!(mirrored_index(5, 4), 2);
        assert_eq!(mirrored_index(7, 4), 0);
    }

    #[test]
    fn test_mirrored_index_inside() {
        for position in 0..6 {
            assert_eq!(mirrored_index(position, 6), position as usize);
        }
        assert_eq!(mirrored_index(-1, 1), 0);
        assert_eq!(mirrored_index(1, 1), 0);
    }
}
