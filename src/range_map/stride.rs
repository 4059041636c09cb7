use std::fmt::Debug;

/// A discrete, totally ordered bound: every value has a well-defined
/// neighbor on each side (unless it sits at the edge of the type).
pub trait Strideable: Copy + Ord + Debug {
    /// `self + by`, or `None` if the result leaves the type's range.
    fn advanced(self, by: i64) -> Option<Self>;

    /// Signed number of steps from `self` to `to`.
    fn distance(self, to: Self) -> i128;

    #[inline]
    fn successor(self) -> Option<Self> {
        self.advanced(1)
    }

    #[inline]
    fn predecessor(self) -> Option<Self> {
        self.advanced(-1)
    }
}

macro_rules! impl_strideable {
    ($($t:ty),* $(,)?) => {$(
        impl Strideable for $t {
            #[inline]
            fn advanced(self, by: i64) -> Option<Self> {
                let next = i128::try_from(self).ok()?.checked_add(i128::from(by))?;
                Self::try_from(next).ok()
            }

            #[inline]
            fn distance(self, to: Self) -> i128 {
                // Every type here fits in i128; only i128 itself can overflow the difference.
                let from = i128::try_from(self).unwrap_or_default();
                let to = i128::try_from(to).unwrap_or_default();
                to.saturating_sub(from)
            }
        }
    )*};
}

impl_strideable!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

impl Strideable for u128 {
    #[inline]
    fn advanced(self, by: i64) -> Option<Self> {
        let step = u128::from(by.unsigned_abs());
        if by < 0 {
            self.checked_sub(step)
        } else {
            self.checked_add(step)
        }
    }

    /// Saturates at the `i128` limits when the gap is wider than `i128::MAX`.
    #[inline]
    fn distance(self, to: Self) -> i128 {
        if to >= self {
            i128::try_from(to - self).unwrap_or(i128::MAX)
        } else {
            i128::try_from(self - to).map_or(i128::MIN, |d| -d)
        }
    }
}

impl Strideable for char {
    fn advanced(self, by: i64) -> Option<Self> {
        // Skips the surrogate gap, which has no `char` values.
        const GAP: i64 = 0xE000 - 0xD800;
        let code = i64::from(u32::from(self));
        let mut next = code.checked_add(by)?;
        if code < 0xD800 && next >= 0xD800 {
            next = next.checked_add(GAP)?;
        } else if code >= 0xE000 && next < 0xE000 {
            next = next.checked_sub(GAP)?;
        }
        char::from_u32(u32::try_from(next).ok()?)
    }

    fn distance(self, to: Self) -> i128 {
        let index = |c: char| {
            let code = i128::from(u32::from(c));
            if code >= 0xE000 {
                code - (0xE000 - 0xD800)
            } else {
                code
            }
        };
        index(to) - index(self)
    }
}
