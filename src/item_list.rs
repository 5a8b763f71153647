//! Collection adapters the training pipeline drives: lazy open, tensor
//! reconstruction after inference, and batch display.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use ndarray::{Array4, s};

use crate::enums::{ConvertMode, LossKind};
use crate::volume::{MriMask, MriVolume, ShowOptions};
use crate::volume_loader::{OpenOptions, VolumeLoader, VolumeLoaderError};

/// Item list over MRI scan files.
pub struct MriImageList {
    pub items: Vec<PathBuf>,
    pub convert_mode: ConvertMode,
    /// Whether results display as a square grid; only the non-square strip
    /// layout is supported here.
    pub square_show_res: bool,
}

impl MriImageList {
    pub fn new(items: Vec<PathBuf>) -> Self {
        Self { items, convert_mode: ConvertMode::Rgb, square_show_res: true }
    }

    /// Open the scan at `path` as an image volume.
    pub fn open(&self, path: &Path) -> Result<MriVolume, VolumeLoaderError> {
        VolumeLoader::open_mri(
            path,
            &OpenOptions { convert_mode: self.convert_mode, ..Default::default() },
            VolumeLoader::load_nifti,
        )
    }

    /// Wrap a raw batch tensor back into a displayable volume, clamping into
    /// [0, 1].
    pub fn reconstruct(&self, t: Array4<f32>) -> MriVolume {
        MriVolume::from_stacked(t.mapv(|v| v.clamp(0.0, 1.0)))
    }

    /// Render each (input, target) pair as an overlay strip.
    pub fn show_xys(
        &self,
        xs: &[MriVolume],
        ys: &[MriMask],
        opts: &ShowOptions,
    ) -> Vec<RgbaImage> {
        xs.iter().zip(ys).map(|(x, y)| x.show(opts, Some(y))).collect()
    }

    /// Render each (input, target, prediction) triple: one ground-truth strip
    /// followed by one prediction strip.
    pub fn show_xyzs(
        &self,
        xs: &[MriVolume],
        ys: &[MriMask],
        zs: &[MriMask],
        opts: &ShowOptions,
    ) -> Vec<RgbaImage> {
        assert!(!self.square_show_res, "the square display layout is not supported");
        let mut strips = Vec::with_capacity(xs.len() * 2);
        for ((x, y), z) in xs.iter().zip(ys).zip(zs) {
            strips.push(x.show(opts, Some(y)));
            strips.push(x.show(opts, Some(z)));
        }
        strips
    }
}

/// Label list for segmentation masks.
pub struct MriSegLabelList {
    pub items: Vec<PathBuf>,
    pub classes: Vec<String>,
    pub loss_func: LossKind,
}

impl MriSegLabelList {
    pub fn new(items: Vec<PathBuf>, classes: Vec<String>) -> Self {
        Self { items, classes, loss_func: LossKind::CrossEntropyFlat { axis: 2 } }
    }

    /// Open the mask at `path`: no normalization, single channel.
    pub fn open(&self, path: &Path) -> Result<MriMask, VolumeLoaderError> {
        VolumeLoader::open_mri_mask(path)
    }

    /// Reduce per-class probabilities (slices, classes, H, W) to class
    /// indices (slices, 1, H, W) by arg-max over the class axis.
    pub fn analyze_pred(&self, pred: &Array4<f32>) -> Array4<f32> {
        let (n_slices, _, height, width) = pred.dim();
        Array4::from_shape_fn((n_slices, 1, height, width), |(i, _, y, x)| {
            let mut best = 0usize;
            let mut best_value = f32::NEG_INFINITY;
            for (c, &v) in pred.slice(s![i, .., y, x]).iter().enumerate() {
                if v > best_value {
                    best_value = v;
                    best = c;
                }
            }
            best as f32
        })
    }

    pub fn reconstruct(&self, t: Array4<f32>) -> MriMask {
        MriMask::from_stacked(t)
    }
}

/// Item list preconfigured for segmentation: mask labels, non-square display.
pub struct MriSegItemList {
    pub inner: MriImageList,
}

impl MriSegItemList {
    pub fn new(items: Vec<PathBuf>) -> Self {
        let mut inner = MriImageList::new(items);
        inner.square_show_res = false;
        Self { inner }
    }

    /// Bind the mask label list for `items` with the given class names.
    pub fn label_list(&self, items: Vec<PathBuf>, classes: Vec<String>) -> MriSegLabelList {
        MriSegLabelList::new(items, classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array3, Array4};

    fn volume(n_slices: usize) -> MriVolume {
        MriVolume::new(vec![Array3::from_elem((1, 8, 8), 0.5); n_slices])
    }

    fn mask(n_slices: usize) -> MriMask {
        MriMask::new(vec![Array3::from_elem((1, 8, 8), 1.0); n_slices])
    }

    #[test]
    fn reconstruct_clamps_into_unit_interval() {
        let list = MriImageList::new(vec![]);
        let t = Array4::from_shape_fn((2, 1, 4, 4), |(i, ..)| if i == 0 { -0.5 } else { 1.5 });
        let volume = list.reconstruct(t);
        assert_abs_diff_eq!(volume.data()[[0, 0, 0, 0]], 0.0);
        assert_abs_diff_eq!(volume.data()[[1, 0, 0, 0]], 1.0);
        assert_eq!(volume.dim(), 2);
    }

    #[test]
    fn analyze_pred_arg_maxes_over_the_class_axis() {
        let labels = MriSegLabelList::new(vec![], vec!["bg".into(), "lv".into(), "myo".into()]);
        let mut pred = Array4::zeros((2, 3, 4, 4));
        pred[[0, 2, 0, 0]] = 0.9;
        pred[[1, 1, 3, 3]] = 0.8;
        let out = labels.analyze_pred(&pred);
        assert_eq!(out.dim(), (2, 1, 4, 4));
        assert_abs_diff_eq!(out[[0, 0, 0, 0]], 2.0);
        assert_abs_diff_eq!(out[[1, 0, 3, 3]], 1.0);
        // Ties resolve to the lowest class index.
        assert_abs_diff_eq!(out[[0, 0, 1, 1]], 0.0);
    }

    #[test]
    fn label_list_fixes_a_cross_entropy_loss() {
        let labels = MriSegLabelList::new(vec![], vec!["bg".into()]);
        assert_eq!(labels.loss_func, LossKind::CrossEntropyFlat { axis: 2 });
    }

    #[test]
    fn label_reconstruct_wraps_a_mask() {
        let labels = MriSegLabelList::new(vec![], vec![]);
        let mask = labels.reconstruct(Array4::from_elem((3, 1, 4, 4), 2.0));
        assert_eq!(mask.dim(), 3);
        assert_eq!(mask.data()[[0, 0, 0, 0]], 2);
    }

    #[test]
    fn seg_item_list_declares_a_non_square_layout() {
        let list = MriSegItemList::new(vec![PathBuf::from("scan.nii.gz")]);
        assert!(!list.inner.square_show_res);
    }

    #[test]
    fn show_xys_renders_one_strip_per_pair() {
        let list = MriImageList::new(vec![]);
        let xs = vec![volume(5), volume(5)];
        let ys = vec![mask(5), mask(5)];
        let strips = list.show_xys(&xs, &ys, &ShowOptions::default());
        assert_eq!(strips.len(), 2);
    }

    #[test]
    fn show_xyzs_renders_ground_truth_then_prediction() {
        let list = MriSegItemList::new(vec![]);
        let xs = vec![volume(5)];
        let ys = vec![mask(5)];
        let zs = vec![mask(5)];
        let strips = list.inner.show_xyzs(&xs, &ys, &zs, &ShowOptions::default());
        assert_eq!(strips.len(), 2);
    }

    #[test]
    #[should_panic(expected = "square display layout")]
    fn square_layout_is_rejected() {
        let list = MriImageList::new(vec![]);
        let _ = list.show_xyzs(&[volume(5)], &[mask(5)], &[mask(5)], &ShowOptions::default());
    }
}
