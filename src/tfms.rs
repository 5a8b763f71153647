//! Randomized transforms with deferred parameter resolution.
//!
//! A [`Transform`] declares a randomized operation; [`Transform::resolve`]
//! draws its concrete parameters. Resolution is kept separate from
//! application so an input volume and its label volume can share one realized
//! transform across separate calls.

use log::warn;
use ndarray::Array3;
use rand::Rng;

use crate::item::SliceItem;

/// Declared transform kinds, parameterized by their randomization range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TfmKind {
    /// Horizontal flip with probability `p`.
    FlipLr { p: f64 },
    /// Rotation by a uniform angle in `[-max_deg, max_deg]`.
    Rotate { max_deg: f32 },
    /// Center zoom by a uniform scale in `[1, max_scale]`.
    Zoom { max_scale: f32 },
    /// Additive brightness shift in `[-max_delta, max_delta]`; skipped for
    /// masks.
    Brightness { max_delta: f32 },
}

/// One realized draw of a transform's random parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved {
    FlipLr(bool),
    Rotate(f32),
    Zoom(f32),
    Brightness(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    kind: TfmKind,
    resolved: Option<Resolved>,
}

pub type TfmList = Vec<Transform>;

impl Transform {
    pub fn flip_lr(p: f64) -> Self {
        assert!((0.0..=1.0).contains(&p), "flip probability must be in [0, 1]");
        Self { kind: TfmKind::FlipLr { p }, resolved: None }
    }

    pub fn rotate(max_deg: f32) -> Self {
        assert!(max_deg >= 0.0, "rotation range must be non-negative");
        Self { kind: TfmKind::Rotate { max_deg }, resolved: None }
    }

    pub fn zoom(max_scale: f32) -> Self {
        assert!(max_scale >= 1.0, "zoom scale must be at least 1");
        Self { kind: TfmKind::Zoom { max_scale }, resolved: None }
    }

    pub fn brightness(max_delta: f32) -> Self {
        assert!(max_delta >= 0.0, "brightness range must be non-negative");
        Self { kind: TfmKind::Brightness { max_delta }, resolved: None }
    }

    pub fn kind(&self) -> TfmKind {
        self.kind
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    pub fn resolved(&self) -> Option<&Resolved> {
        self.resolved.as_ref()
    }

    /// Draw concrete parameters for this transform.
    pub fn resolve(&mut self) {
        let mut rng = rand::thread_rng();
        self.resolved = Some(match self.kind {
            TfmKind::FlipLr { p } => Resolved::FlipLr(rng.gen_bool(p)),
            TfmKind::Rotate { max_deg } => Resolved::Rotate(rng.gen_range(-max_deg..=max_deg)),
            TfmKind::Zoom { max_scale } => Resolved::Zoom(rng.gen_range(1.0..=max_scale)),
            TfmKind::Brightness { max_delta } => {
                Resolved::Brightness(rng.gen_range(-max_delta..=max_delta))
            }
        });
    }
}

/// Resolve every transform in `tfms`.
pub fn resolve_tfms(tfms: &mut TfmList) {
    for tfm in tfms.iter_mut() {
        tfm.resolve();
    }
}

/// Keyword options forwarded through a transform application.
#[derive(Debug, Clone, Default)]
pub struct TfmArgs {
    /// Target size. When present on a volume-level call, the first component
    /// is the desired slice count and the remainder the in-plane extent; a
    /// single remaining component means a square extent.
    pub size: Option<Vec<usize>>,
}

impl TfmArgs {
    pub fn with_size(size: &[usize]) -> Self {
        Self { size: Some(size.to_vec()) }
    }
}

/// Resample `slices` to exactly `n` entries.
///
/// Order-preserving and lossy: a longer sequence is truncated from the front,
/// a shorter one is padded by repeating slices from the start of the
/// sequence. No interpolation and no random sampling.
pub fn resize_slices(n: usize, slices: &[Array3<f32>]) -> Vec<Array3<f32>> {
    let m = slices.len();
    let sl: Vec<Array3<f32>> = if m >= n {
        slices[..n].to_vec()
    } else {
        slices
            .iter()
            .chain(slices.iter().take(n - m))
            .cloned()
            .collect()
    };
    assert_eq!(sl.len(), n, "resampled slice count must match the target");
    sl
}

/// Apply `tfms` to `slices`, sharing one realized transform across slices
/// unless `slicewise` is set.
///
/// When the options carry a target size, its first component resamples the
/// slice count via [`resize_slices`] and is dropped from the size forwarded
/// to each slice. With `slicewise = true` every slice draws its own
/// parameters; inputs and labels transformed through separate calls will not
/// line up, which is why that path warns. With `slicewise = false` the list
/// is resolved once (only if the caller has not already resolved it) and the
/// identical realization is applied to every slice.
pub fn apply_trans<E: SliceItem>(
    tfms: &mut TfmList,
    slices: &[Array3<f32>],
    slicewise: bool,
    mut args: TfmArgs,
) -> Vec<Array3<f32>> {
    let mut slices = slices.to_vec();
    if let Some(size) = args.size.take() {
        assert!(size.len() >= 2, "size must carry a slice count and an in-plane extent");
        slices = resize_slices(size[0], &slices);
        args.size = Some(size[1..].to_vec());
    }

    if slicewise {
        warn!("slicewise = true draws independent transform parameters per slice; inputs and their labels may be misaligned");
        slices
            .iter()
            .map(|s| {
                resolve_tfms(tfms);
                E::from_raw(s.clone()).apply_tfms(tfms, &args).into_raw()
            })
            .collect()
    } else {
        if tfms.first().is_some_and(|t| !t.is_resolved()) {
            resolve_tfms(tfms);
        }
        slices
            .iter()
            .map(|s| E::from_raw(s.clone()).apply_tfms(tfms, &args).into_raw())
            .collect()
    }
}
