//! Elementary 2D representations that per-slice transforms operate on.
//!
//! [`Image2d`] carries continuous intensities and samples bilinearly;
//! [`Mask2d`] carries class indices, samples nearest-neighbour and ignores
//! lighting transforms so it never invents fractional classes.

use ndarray::{Array2, Array3, Axis, stack};

use crate::enums::Sampling;
use crate::interpolator::Interpolator;
use crate::tfms::{Resolved, TfmArgs, TfmList, Transform};

/// A single plane in (channels, height, width) layout, transformable by a
/// resolved [`TfmList`].
pub trait SliceItem: Sized {
    fn from_raw(px: Array3<f32>) -> Self;
    fn into_raw(self) -> Array3<f32>;
    fn sampling() -> Sampling;
    fn lighting() -> bool;

    /// Apply an already-resolved transform list, then the in-plane target
    /// size when one is present. Parameters are never re-resolved here.
    fn apply_tfms(self, tfms: &TfmList, args: &TfmArgs) -> Self {
        let mut px = self.into_raw();
        for tfm in tfms {
            px = apply_resolved(px, tfm, Self::sampling(), Self::lighting());
        }
        if let Some(size) = &args.size {
            let (height, width) = target_extent(size);
            px = map_planes(&px, |plane| {
                Interpolator::resample(&plane.view(), height, width, Self::sampling())
            });
        }
        Self::from_raw(px)
    }
}

/// Continuous-intensity plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Image2d {
    pub px: Array3<f32>,
}

impl Image2d {
    pub fn new(px: Array3<f32>) -> Self {
        Self { px }
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.px
    }
}

impl SliceItem for Image2d {
    fn from_raw(px: Array3<f32>) -> Self {
        Self { px }
    }

    fn into_raw(self) -> Array3<f32> {
        self.px
    }

    fn sampling() -> Sampling {
        Sampling::Bilinear
    }

    fn lighting() -> bool {
        true
    }
}

/// Class-index plane. Values stay integral under every transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask2d {
    pub px: Array3<f32>,
}

impl Mask2d {
    pub fn new(px: Array3<f32>) -> Self {
        Self { px }
    }

    pub fn data(&self) -> Array3<i64> {
        self.px.mapv(|v| v as i64)
    }
}

impl SliceItem for Mask2d {
    fn from_raw(px: Array3<f32>) -> Self {
        Self { px }
    }

    fn into_raw(self) -> Array3<f32> {
        self.px
    }

    fn sampling() -> Sampling {
        Sampling::Nearest
    }

    fn lighting() -> bool {
        false
    }
}

fn apply_resolved(
    px: Array3<f32>,
    tfm: &Transform,
    sampling: Sampling,
    lighting: bool,
) -> Array3<f32> {
    let resolved = tfm
        .resolved()
        .expect("transforms must be resolved before they are applied to a slice");
    match *resolved {
        Resolved::FlipLr(false) => px,
        Resolved::FlipLr(true) => map_planes(&px, |plane| Interpolator::flip_lr(&plane.view())),
        Resolved::Rotate(deg) if deg.abs() <= f32::EPSILON => px,
        Resolved::Rotate(deg) => {
            map_planes(&px, |plane| Interpolator::rotate(&plane.view(), deg, sampling))
        }
        Resolved::Zoom(scale) if (scale - 1.0).abs() <= f32::EPSILON => px,
        Resolved::Zoom(scale) => {
            map_planes(&px, |plane| Interpolator::zoom(&plane.view(), scale, sampling))
        }
        Resolved::Brightness(delta) if lighting => px.mapv(|v| (v + delta).clamp(0.0, 1.0)),
        Resolved::Brightness(_) => px,
    }
}

fn target_extent(size: &[usize]) -> (usize, usize) {
    match size {
        [] => panic!("an in-plane target size must not be empty"),
        [square] => (*square, *square),
        [.., height, width] => (*height, *width),
    }
}

fn map_planes(px: &Array3<f32>, f: impl Fn(Array2<f32>) -> Array2<f32>) -> Array3<f32> {
    let planes: Vec<Array2<f32>> = px
        .axis_iter(Axis(0))
        .map(|plane| f(plane.to_owned()))
        .collect();
    let views: Vec<_> = planes.iter().map(|p| p.view()).collect();
    stack(Axis(0), &views).expect("transformed planes must share a common extent")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array3;

    fn resolved(mut tfm: Transform) -> Transform {
        tfm.resolve();
        tfm
    }

    #[test]
    fn double_flip_restores_the_image() {
        let mut px = Array3::zeros((1, 2, 3));
        px[[0, 0, 0]] = 1.0;
        let tfms = vec![resolved(Transform::flip_lr(1.0)), resolved(Transform::flip_lr(1.0))];
        let out = Image2d::new(px.clone()).apply_tfms(&tfms, &TfmArgs::default());
        assert_abs_diff_eq!(out.px, px, epsilon = 1e-6);
    }

    #[test]
    fn brightness_shifts_images_but_not_masks() {
        let px = Array3::from_elem((1, 2, 2), 0.5);
        let tfms = vec![resolved(Transform::brightness(0.0))];
        // A zero-range draw still exercises the branch dispatch.
        let image = Image2d::new(px.clone()).apply_tfms(&tfms, &TfmArgs::default());
        let mask = Mask2d::new(px.clone()).apply_tfms(&tfms, &TfmArgs::default());
        assert_abs_diff_eq!(image.px, px, epsilon = 1e-6);
        assert_abs_diff_eq!(mask.px, px, epsilon = 1e-6);
    }

    #[test]
    fn mask_values_stay_integral_under_zoom() {
        let mut px = Array3::zeros((1, 8, 8));
        for y in 0..8 {
            for x in 0..8 {
                px[[0, y, x]] = ((y / 4) * 2 + x / 4) as f32;
            }
        }
        let mut zoom = Transform::zoom(1.7);
        zoom.resolve();
        let out = Mask2d::new(px).apply_tfms(&vec![zoom], &TfmArgs::default());
        for &v in out.px.iter() {
            assert_abs_diff_eq!(v, v.round(), epsilon = 1e-6);
        }
    }

    #[test]
    fn in_plane_size_resamples_each_channel() {
        let px = Array3::from_elem((3, 16, 16), 0.25);
        let out = Image2d::new(px).apply_tfms(&vec![], &TfmArgs::with_size(&[8, 4]));
        assert_eq!(out.px.dim(), (3, 8, 4));
        assert_abs_diff_eq!(out.px[[2, 0, 0]], 0.25, epsilon = 1e-6);
    }

    #[test]
    #[should_panic(expected = "resolved")]
    fn applying_an_unresolved_transform_panics() {
        let px = Array3::zeros((1, 2, 2));
        let tfms = vec![Transform::flip_lr(0.5)];
        let _ = Image2d::new(px).apply_tfms(&tfms, &TfmArgs::default());
    }
}
