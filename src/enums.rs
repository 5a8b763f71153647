/// Channel layout applied to each extracted plane.
///
/// NIfTI scans are single-channel; `Rgb` replicates the plane into three
/// identical channels so models with RGB stems can consume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvertMode {
    #[default]
    Rgb,
    Luma,
}

impl ConvertMode {
    pub fn channels(self) -> usize {
        match self {
            ConvertMode::Rgb => 3,
            ConvertMode::Luma => 1,
        }
    }
}

/// Pixel sampling used when a spatial transform reads between grid points.
///
/// Continuous images interpolate, masks must not invent class indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampling {
    #[default]
    Bilinear,
    Nearest,
}

/// Loss selection carried by a label list.
///
/// This is a declaration for the training pipeline, not a loss
/// implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossKind {
    CrossEntropyFlat { axis: usize },
}
