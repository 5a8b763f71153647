//! Opens a volumetric scan file and slices it into per-plane tensors.

use std::path::Path;

use log::debug;
use ndarray::{Array2, Array3, Axis, Ix3, s, stack};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use thiserror::Error;

use crate::enums::ConvertMode;
use crate::volume::{FromSlices, MriMask};

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("volume contains no slices")]
    EmptyVolume,

    #[error("expected a 3-dimensional volume, got {0} dimensions")]
    NotThreeDimensional(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Nifti(#[from] nifti::NiftiError),
}

/// Hook applied to each extracted (H, W) plane before channel conversion.
pub type AfterOpen = dyn Fn(Array2<f32>) -> Array2<f32>;

pub struct OpenOptions<'a> {
    /// Divide intensities by 255 after conversion.
    pub div: bool,
    pub convert_mode: ConvertMode,
    pub after_open: Option<&'a AfterOpen>,
}

impl Default for OpenOptions<'_> {
    fn default() -> Self {
        Self { div: true, convert_mode: ConvertMode::Rgb, after_open: None }
    }
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Read a NIfTI file (`.nii` or `.nii.gz`) as a raw (H, W, slices) array.
    ///
    /// # Errors
    ///
    /// Parse failures from the format library propagate unmodified; a volume
    /// that is not 3-dimensional is rejected.
    pub fn load_nifti(path: &Path) -> Result<Array3<f32>, VolumeLoaderError> {
        let object = ReaderOptions::new().read_file(path)?;
        let data = object.into_volume().into_ndarray::<f32>()?;
        let ndim = data.ndim();
        data.into_dimensionality::<Ix3>()
            .map_err(|_| VolumeLoaderError::NotThreeDimensional(ndim))
    }

    /// Open a scan as a volume container.
    ///
    /// # Arguments
    ///
    /// * `path` - Scan file handed to `loader`
    /// * `opts` - Normalization, channel conversion and the post-open hook
    /// * `loader` - Raw-array reader; [`VolumeLoader::load_nifti`] is the
    ///   default choice
    ///
    /// # Errors
    ///
    /// Returns the loader's error unmodified, or [`VolumeLoaderError::EmptyVolume`]
    /// when the scan carries no slices.
    pub fn open_mri<C: FromSlices>(
        path: &Path,
        opts: &OpenOptions,
        loader: impl Fn(&Path) -> Result<Array3<f32>, VolumeLoaderError>,
    ) -> Result<C, VolumeLoaderError> {
        let x = loader(path)?;
        let (height, width, n_slices) = x.dim();
        if n_slices == 0 {
            return Err(VolumeLoaderError::EmptyVolume);
        }
        debug!("opened {} as {height}x{width} volume with {n_slices} slices", path.display());

        let mut res = Vec::with_capacity(n_slices);
        for i in 0..n_slices {
            let mut plane = x.slice(s![.., .., i]).to_owned();
            if let Some(hook) = opts.after_open {
                plane = hook(plane);
            }
            let mut slice = convert_plane(plane, opts.convert_mode);
            if opts.div {
                slice.mapv_inplace(|v| v / 255.0);
            }
            res.push(slice);
        }
        Ok(C::from_slices(res))
    }

    /// Open a scan as a segmentation mask: no normalization, single channel,
    /// mask container.
    pub fn open_mri_mask(path: &Path) -> Result<MriMask, VolumeLoaderError> {
        Self::open_mri(
            path,
            &OpenOptions { div: false, convert_mode: ConvertMode::Luma, after_open: None },
            Self::load_nifti,
        )
    }
}

fn convert_plane(plane: Array2<f32>, mode: ConvertMode) -> Array3<f32> {
    let views = vec![plane.view(); mode.channels()];
    stack(Axis(0), &views).expect("replicated channels share the plane's extent")
}
