//! Volume containers: an ordered stack of 2D slices treated as one item.

use std::fmt;
use std::path::Path;

use image::{Rgba, RgbaImage, imageops};
use ndarray::{Array3, Array4, Axis, concatenate, s};

use crate::item::{Image2d, Mask2d};
use crate::tfms::{TfmArgs, TfmList, apply_trans};

/// Construction from an ordered list of per-slice (C, H, W) tensors. The
/// loader is generic over this so image and mask containers share one open
/// path.
pub trait FromSlices {
    fn from_slices(slices: Vec<Array3<f32>>) -> Self;
}

/// Display options for [`MriVolume::show`] and [`MriMask::show`].
#[derive(Debug, Clone)]
pub struct ShowOptions {
    /// Slice indices rendered left to right. Every index must be within the
    /// volume's slice range.
    pub slice_idxs: Vec<usize>,
    /// Blend factor for mask overlays.
    pub alpha: f32,
}

impl Default for ShowOptions {
    fn default() -> Self {
        Self { slice_idxs: (0..5).collect(), alpha: 0.5 }
    }
}

impl ShowOptions {
    pub fn with_slice_idxs(slice_idxs: Vec<usize>) -> Self {
        Self { slice_idxs, ..Self::default() }
    }
}

/// An MRI volume as an ordered stack of continuous-intensity slices.
///
/// Owns its slice list exclusively; the stacked tensor is kept in sync with
/// it and has shape (slices, channels, height, width).
#[derive(Clone, PartialEq)]
pub struct MriVolume {
    slices: Vec<Array3<f32>>,
    px: Array4<f32>,
}

impl MriVolume {
    pub fn new(slices: Vec<Array3<f32>>) -> Self {
        let px = stack_slices(&slices);
        Self { slices, px }
    }

    /// Rebuild the slice list from an already-stacked tensor.
    pub fn from_stacked(px: Array4<f32>) -> Self {
        let slices = px.axis_iter(Axis(0)).map(|s| s.to_owned()).collect();
        Self { slices, px }
    }

    /// The stacked (slices, channels, height, width) tensor.
    pub fn data(&self) -> &Array4<f32> {
        &self.px
    }

    pub fn slices(&self) -> &[Array3<f32>] {
        &self.slices
    }

    pub fn shape(&self) -> (usize, usize, usize, usize) {
        self.px.dim()
    }

    /// In-plane extent (height, width).
    pub fn size(&self) -> (usize, usize) {
        let (_, _, height, width) = self.shape();
        (height, width)
    }

    /// Number of slices.
    pub fn dim(&self) -> usize {
        self.slices.len()
    }

    /// Apply `tfms` to every slice, resampling the slice count first when the
    /// options carry a target size. See [`apply_trans`] for the shared vs.
    /// slicewise semantics.
    pub fn apply_tfms(&self, tfms: &mut TfmList, slicewise: bool, args: TfmArgs) -> Self {
        Self::new(apply_trans::<Image2d>(tfms, &self.slices, slicewise, args))
    }

    /// Concatenate all slices along the width axis into a single image.
    pub fn to_one(&self) -> Image2d {
        let views: Vec<_> = self.slices.iter().map(|s| s.view()).collect();
        Image2d::new(concatenate(Axis(2), &views).expect("slices must share a common extent"))
    }

    /// Render the selected slices as one horizontal strip, optionally
    /// overlaying the paired mask's slices.
    pub fn show(&self, opts: &ShowOptions, y: Option<&MriMask>) -> RgbaImage {
        assert_slice_idxs(&opts.slice_idxs, self.dim());
        let panels: Vec<RgbaImage> = opts
            .slice_idxs
            .iter()
            .map(|&i| {
                let mut panel = plane_to_rgba(&self.slices[i]);
                if let Some(mask) = y {
                    overlay_mask(&mut panel, &mask.slices()[i], opts.alpha);
                }
                panel
            })
            .collect();
        hstack(&panels)
    }
}

impl FromSlices for MriVolume {
    fn from_slices(slices: Vec<Array3<f32>>) -> Self {
        Self::new(slices)
    }
}

impl fmt::Debug for MriVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MriVolume {:?}", self.shape())
    }
}

/// A segmentation-mask volume. Pixel values are class indices stored as
/// floats; [`MriMask::data`] exposes the integer view.
#[derive(Clone, PartialEq)]
pub struct MriMask {
    slices: Vec<Array3<f32>>,
    px: Array4<f32>,
}

impl MriMask {
    pub fn new(slices: Vec<Array3<f32>>) -> Self {
        let px = stack_slices(&slices);
        Self { slices, px }
    }

    pub fn from_stacked(px: Array4<f32>) -> Self {
        let slices = px.axis_iter(Axis(0)).map(|s| s.to_owned()).collect();
        Self { slices, px }
    }

    /// The stacked tensor as class indices.
    pub fn data(&self) -> Array4<i64> {
        self.px.mapv(|v| v as i64)
    }

    pub fn slices(&self) -> &[Array3<f32>] {
        &self.slices
    }

    pub fn shape(&self) -> (usize, usize, usize, usize) {
        self.px.dim()
    }

    pub fn size(&self) -> (usize, usize) {
        let (_, _, height, width) = self.shape();
        (height, width)
    }

    pub fn dim(&self) -> usize {
        self.slices.len()
    }

    /// Apply `tfms` with mask semantics: nearest-neighbour sampling, no
    /// lighting transforms.
    pub fn apply_tfms(&self, tfms: &mut TfmList, slicewise: bool, args: TfmArgs) -> Self {
        Self::new(apply_trans::<Mask2d>(tfms, &self.slices, slicewise, args))
    }

    /// Wrap a raw prediction tensor back into a mask container.
    pub fn reconstruct(px: Array4<f32>) -> Self {
        Self::from_stacked(px)
    }

    /// Render the selected slices with the categorical palette.
    pub fn show(&self, opts: &ShowOptions) -> RgbaImage {
        assert_slice_idxs(&opts.slice_idxs, self.dim());
        let panels: Vec<RgbaImage> = opts
            .slice_idxs
            .iter()
            .map(|&i| mask_to_rgba(&self.slices[i]))
            .collect();
        hstack(&panels)
    }

    /// Mask persistence is intentionally unimplemented.
    pub fn save(&self, _path: &Path) {}
}

impl FromSlices for MriMask {
    fn from_slices(slices: Vec<Array3<f32>>) -> Self {
        Self::new(slices)
    }
}

impl fmt::Debug for MriMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MriMask {:?}", self.shape())
    }
}

fn stack_slices(slices: &[Array3<f32>]) -> Array4<f32> {
    assert!(!slices.is_empty(), "a volume needs at least one slice");
    let (channels, height, width) = slices[0].dim();
    let mut px = Array4::<f32>::zeros((slices.len(), channels, height, width));
    for (i, slice) in slices.iter().enumerate() {
        px.slice_mut(s![i, .., .., ..]).assign(slice);
    }
    px
}

fn assert_slice_idxs(slice_idxs: &[usize], n_slices: usize) {
    assert!(
        slice_idxs.iter().all(|&i| i < n_slices),
        "slice indices must be within [0, {n_slices})"
    );
}

#[inline]
fn normalize_to_u8(value: f32) -> u8 {
    (value * 255.0).clamp(0.0, 255.0) as u8
}

fn plane_to_rgba(slice: &Array3<f32>) -> RgbaImage {
    let (channels, height, width) = slice.dim();
    RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        let (xi, yi) = (x as usize, y as usize);
        let (r, g, b) = if channels >= 3 {
            (slice[[0, yi, xi]], slice[[1, yi, xi]], slice[[2, yi, xi]])
        } else {
            let v = slice[[0, yi, xi]];
            (v, v, v)
        };
        Rgba([normalize_to_u8(r), normalize_to_u8(g), normalize_to_u8(b), 255])
    })
}

// tab20-style categorical palette; classes beyond 20 wrap around.
const CLASS_COLORS: [[u8; 3]; 20] = [
    [31, 119, 180],
    [174, 199, 232],
    [255, 127, 14],
    [255, 187, 120],
    [44, 160, 44],
    [152, 223, 138],
    [214, 39, 40],
    [255, 152, 150],
    [148, 103, 189],
    [197, 176, 213],
    [140, 86, 75],
    [196, 156, 148],
    [227, 119, 194],
    [247, 182, 210],
    [127, 127, 127],
    [199, 199, 199],
    [188, 189, 34],
    [219, 219, 141],
    [23, 190, 207],
    [158, 218, 229],
];

fn class_color(class: usize) -> [u8; 3] {
    CLASS_COLORS[class % CLASS_COLORS.len()]
}

fn mask_to_rgba(slice: &Array3<f32>) -> RgbaImage {
    let (_, height, width) = slice.dim();
    RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        let class = slice[[0, y as usize, x as usize]].max(0.0) as usize;
        let [r, g, b] = class_color(class);
        Rgba([r, g, b, 255])
    })
}

fn overlay_mask(panel: &mut RgbaImage, mask_slice: &Array3<f32>, alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    for (x, y, pixel) in panel.enumerate_pixels_mut() {
        let class = mask_slice[[0, y as usize, x as usize]].max(0.0) as usize;
        let color = class_color(class);
        for c in 0..3 {
            pixel[c] = (pixel[c] as f32 * (1.0 - alpha) + color[c] as f32 * alpha) as u8;
        }
    }
}

fn hstack(panels: &[RgbaImage]) -> RgbaImage {
    let width: u32 = panels.iter().map(|p| p.width()).sum();
    let height = panels.iter().map(|p| p.height()).max().unwrap_or(0);
    let mut strip = RgbaImage::new(width, height);
    let mut x_offset = 0i64;
    for panel in panels {
        imageops::replace(&mut strip, panel, x_offset, 0);
        x_offset += i64::from(panel.width());
    }
    strip
}
