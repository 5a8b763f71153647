//! # NIfTI-volume library
//!
//! This crate adapts volumetric MRI scans stored as NIfTI files into
//! slice-based items for a 2D segmentation training pipeline.

//!
//! A scan is read as a (height, width, slices) array, sliced along the last
//! axis and wrapped as an ordered stack of 2D planes. The stack behaves as
//! one logical item: it can resample its slice count to a requested target
//! length (truncating from the front or repeating from the start of the
//! sequence, never interpolating), apply randomized transforms with one
//! shared realization across all slices, and render inspection strips.
//! Segmentation masks use the same container with class-index semantics:
//! integer pixel values, nearest-neighbour sampling and a categorical
//! palette. NIfTI files are assumed to be:
//!  - 3-dimensional (height, width, slices)
//!  - Plain or gzip compressed (".nii" / ".nii.gz")
//!
//!  Applying transforms with `slicewise = true` draws independent parameters
//!  per slice; inputs and their labels are then no longer guaranteed to line
//!  up, and the call logs a warning to that effect.
//!
//!   Contributions are highly welcome!
//!
//! # Examples
//!
//! ## Opening a scan and rendering a transformed strip
//!
//! To open a NIfTI scan, resample it to 10 slices of 224x224 under a shared
//! random flip and rotation, and save the default 5-panel preview strip:
//!
//! ```no_run
//! # use std::path::{Path, PathBuf};
//! # use nifti_volume::item_list::MriSegItemList;
//! # use nifti_volume::tfms::{TfmArgs, Transform};
//! # use nifti_volume::volume::ShowOptions;
//! let list = MriSegItemList::new(vec![PathBuf::from("patient001.nii.gz")]);
//! let volume = list
//!     .inner
//!     .open(Path::new("patient001.nii.gz"))
//!     .expect("should have opened the scan");
//! let mut tfms = vec![Transform::flip_lr(0.5), Transform::rotate(10.0)];
//! let transformed = volume.apply_tfms(&mut tfms, false, TfmArgs::with_size(&[10, 224, 224]));
//! let strip = transformed.show(&ShowOptions::default(), None);
//! strip.save("preview.png").expect("should have saved the preview");
//! ```

pub mod enums;
mod interpolator;
pub mod item;
pub mod item_list;
pub mod tfms;
pub mod volume;
pub mod volume_loader;
