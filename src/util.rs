// Copyright (C) 2023 setzer22 and contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use glam::Vec3;
use itertools::Itertools;
use smallvec::SmallVec;

/// Most vertex stars and face rings in a tissue mesh carry a handful of
/// entries; inline storage avoids heap churn in the hot geometry/topology
/// loops.
pub type SVec<T> = SmallVec<[T; 6]>;
pub type SVecN<T, const N: usize> = SmallVec<[T; N]>;

/// Rotates the given iterator by shifting all elements `shift` positions
/// forward. Any elements that would be out of bounds are instead put at the
/// beginning.
///
/// This method requires passing the `len` as a separate parameter. This is
/// often known beforehand or can be found by calling .size_hint() for an
/// ExactSizeIterator.
pub fn rotate_iter<T>(
    it: impl Iterator<Item = T> + Clone,
    shift: usize,
    len: usize,
) -> impl Iterator<Item = T> {
    it.cycle().dropping(shift).take(len)
}

pub trait SliceUtils<T> {
    /// Same as .iter().copied(), but doesn't trigger rustfmt line breaks
    fn iter_cpy(&self) -> std::iter::Copied<std::slice::Iter<'_, T>>;
}

impl<T: Copy> SliceUtils<T> for [T] {
    fn iter_cpy(&self) -> std::iter::Copied<std::slice::Iter<'_, T>> {
        self.iter().copied()
    }
}

/// Signed angle from `a` to `b` measured around axis `n`, in `(-pi, pi]`.
///
/// Positive when the rotation from `a` to `b` is counterclockwise as seen
/// looking down `-n`.
pub fn signed_angle(a: Vec3, b: Vec3, n: Vec3) -> f32 {
    a.cross(b).dot(n).atan2(a.dot(b))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rotate_iter_wraps_around() {
        let v = [0, 1, 2, 3, 4];
        let rotated: Vec<_> = rotate_iter(v.iter_cpy(), 2, v.len()).collect();
        assert_eq!(rotated, vec![2, 3, 4, 0, 1]);
    }

    #[test]
    fn signed_angle_quarter_turn() {
        let n = Vec3::Z;
        let a = Vec3::X;
        let b = Vec3::Y;
        assert!((signed_angle(a, b, n) - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert!((signed_angle(b, a, n) + std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }
}
