//! Fixed-capacity settings selector.
//!
//! A [`BoundedSelector`] stores `N` values of one settings type (interval
//! lengths, brightness steps, ...) together with a cursor naming the value
//! currently in effect. The cursor always stays inside `[0, N)`; moves past
//! an edge either fail or wrap, depending on the caller's choice.

use core::ops::{Index, IndexMut};

/// `N` homogeneous values plus a cursor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BoundedSelector<T, const N: usize> {
    values: [T; N],
    index: usize,
}

impl<T, const N: usize> BoundedSelector<T, N> {
    /// Creates a selector over the provided values with the cursor at zero.
    #[must_use]
    pub const fn from_values(values: [T; N]) -> Self {
        const { assert!(N > 0, "a selector needs at least one slot") };
        Self { values, index: 0 }
    }

    /// Number of slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Position of the cursor.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.index
    }

    /// Moves the cursor to `index`.
    ///
    /// Returns `false` and leaves the cursor untouched when `index` is out of
    /// range.
    pub fn set_index(&mut self, index: usize) -> bool {
        if index >= N {
            return false;
        }
        self.index = index;
        true
    }

    /// Value under the cursor.
    #[must_use]
    pub fn current(&self) -> &T {
        &self.values[self.index]
    }

    /// Mutable access to the value under the cursor.
    pub fn current_mut(&mut self) -> &mut T {
        &mut self.values[self.index]
    }

    /// Overwrites the value under the cursor.
    pub fn set_current(&mut self, value: T) {
        self.values[self.index] = value;
    }

    /// Advances the cursor by one slot.
    ///
    /// At the last slot the move wraps to the first one when `cyclic` is set
    /// and is refused otherwise.
    pub fn next(&mut self, cyclic: bool) -> bool {
        if self.index + 1 < N {
            self.index += 1;
            true
        } else if cyclic {
            self.index = 0;
            true
        } else {
            false
        }
    }

    /// Moves the cursor back by one slot.
    ///
    /// At the first slot the move wraps to the last one when `cyclic` is set
    /// and is refused otherwise.
    pub fn prev(&mut self, cyclic: bool) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else if cyclic {
            self.index = N - 1;
            true
        } else {
            false
        }
    }

    /// All slots in order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }
}

impl<T: Default, const N: usize> BoundedSelector<T, N> {
    /// Creates a selector with every slot default-initialized.
    #[must_use]
    pub fn new() -> Self {
        Self::from_values(core::array::from_fn(|_| T::default()))
    }
}

impl<T: Default, const N: usize> Default for BoundedSelector<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw slot access that bypasses the cursor.
///
/// No range check beyond the slice's own: an out-of-range index panics.
/// Callers that need validation go through [`BoundedSelector::set_index`].
impl<T, const N: usize> Index<usize> for BoundedSelector<T, N> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl<T, const N: usize> IndexMut<usize> for BoundedSelector<T, N> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.values[index]
    }
}
