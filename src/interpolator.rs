use ndarray::{Array2, ArrayView2};

use crate::enums::Sampling;

pub(crate) struct Interpolator;

impl Interpolator {
    #[inline]
    pub(crate) fn sample(plane: &ArrayView2<f32>, y: f32, x: f32, sampling: Sampling) -> f32 {
        match sampling {
            Sampling::Bilinear => Self::bilinear_interpolate(plane, y, x),
            Sampling::Nearest => Self::nearest_interpolate(plane, y, x),
        }
    }

    #[inline]
    pub(crate) fn bilinear_interpolate(plane: &ArrayView2<f32>, y: f32, x: f32) -> f32 {
        let (height, width) = plane.dim();

        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let y1 = (y0 + 1).min(height - 1);
        let x1 = (x0 + 1).min(width - 1);

        let dy = y - y0 as f32;
        let dx = x - x0 as f32;
        let one_minus_dx = 1.0 - dx;
        let one_minus_dy = 1.0 - dy;

        let v00 = plane[[y0, x0]];
        let v01 = plane[[y0, x1]];
        let v10 = plane[[y1, x0]];
        let v11 = plane[[y1, x1]];

        let v0 = v00.mul_add(one_minus_dx, v01 * dx);
        let v1 = v10.mul_add(one_minus_dx, v11 * dx);

        v0.mul_add(one_minus_dy, v1 * dy)
    }

    #[inline]
    pub(crate) fn nearest_interpolate(plane: &ArrayView2<f32>, y: f32, x: f32) -> f32 {
        let (height, width) = plane.dim();
        let yi = (y.round().max(0.0) as usize).min(height - 1);
        let xi = (x.round().max(0.0) as usize).min(width - 1);
        plane[[yi, xi]]
    }

    /// Resample a plane to `height` x `width`.
    ///
    /// Source coordinates use normalized coordinates with a half-pixel
    /// offset; resampling to the plane's own extent reads every pixel at its
    /// exact grid position.
    pub(crate) fn resample(
        plane: &ArrayView2<f32>,
        height: usize,
        width: usize,
        sampling: Sampling,
    ) -> Array2<f32> {
        let (src_height, src_width) = plane.dim();

        Array2::from_shape_fn((height, width), |(y, x)| {
            let norm_x = (x as f32 + 0.5) / width as f32;
            let norm_y = (y as f32 + 0.5) / height as f32;

            let src_x = (norm_x * src_width as f32 - 0.5).clamp(0.0, (src_width - 1) as f32);
            let src_y = (norm_y * src_height as f32 - 0.5).clamp(0.0, (src_height - 1) as f32);

            Self::sample(plane, src_y, src_x, sampling)
        })
    }

    /// Rotate a plane around its center, keeping the extent.
    ///
    /// Each output pixel is inverse-mapped into the source; samples falling
    /// outside the source grid read as zero.
    pub(crate) fn rotate(plane: &ArrayView2<f32>, degrees: f32, sampling: Sampling) -> Array2<f32> {
        let (height, width) = plane.dim();
        let (sin, cos) = degrees.to_radians().sin_cos();
        let cy = (height as f32 - 1.0) / 2.0;
        let cx = (width as f32 - 1.0) / 2.0;

        Array2::from_shape_fn((height, width), |(y, x)| {
            let dy = y as f32 - cy;
            let dx = x as f32 - cx;
            let src_y = cy + dy * cos - dx * sin;
            let src_x = cx + dy * sin + dx * cos;

            if src_y < 0.0
                || src_x < 0.0
                || src_y > (height - 1) as f32
                || src_x > (width - 1) as f32
            {
                0.0
            } else {
                Self::sample(plane, src_y, src_x, sampling)
            }
        })
    }

    /// Zoom into the center of a plane by `scale` (>= 1), keeping the extent.
    pub(crate) fn zoom(plane: &ArrayView2<f32>, scale: f32, sampling: Sampling) -> Array2<f32> {
        let (height, width) = plane.dim();
        let cy = (height as f32 - 1.0) / 2.0;
        let cx = (width as f32 - 1.0) / 2.0;

        Array2::from_shape_fn((height, width), |(y, x)| {
            let src_y = (cy + (y as f32 - cy) / scale).clamp(0.0, (height - 1) as f32);
            let src_x = (cx + (x as f32 - cx) / scale).clamp(0.0, (width - 1) as f32);
            Self::sample(plane, src_y, src_x, sampling)
        })
    }

    pub(crate) fn flip_lr(plane: &ArrayView2<f32>) -> Array2<f32> {
        let mut flipped = plane.to_owned();
        flipped.invert_axis(ndarray::Axis(1));
        flipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn bilinear_is_exact_on_grid_points() {
        let plane = array![[0.0, 1.0], [2.0, 3.0]];
        let view = plane.view();
        assert_abs_diff_eq!(Interpolator::bilinear_interpolate(&view, 0.0, 1.0), 1.0);
        assert_abs_diff_eq!(Interpolator::bilinear_interpolate(&view, 1.0, 0.0), 2.0);
    }

    #[test]
    fn bilinear_averages_between_grid_points() {
        let plane = array![[0.0, 1.0], [2.0, 3.0]];
        assert_abs_diff_eq!(
            Interpolator::bilinear_interpolate(&plane.view(), 0.5, 0.5),
            1.5
        );
    }

    #[test]
    fn nearest_rounds_to_closest_pixel() {
        let plane = array![[0.0, 1.0], [2.0, 3.0]];
        let view = plane.view();
        assert_abs_diff_eq!(Interpolator::nearest_interpolate(&view, 0.4, 0.6), 1.0);
        assert_abs_diff_eq!(Interpolator::nearest_interpolate(&view, 0.6, 0.4), 2.0);
    }

    #[test]
    fn resample_to_same_extent_is_identity() {
        let plane = array![[0.0, 1.0, 2.0], [3.0, 4.0, 5.0]];
        let out = Interpolator::resample(&plane.view(), 2, 3, Sampling::Bilinear);
        assert_abs_diff_eq!(out, plane, epsilon = 1e-6);
    }

    #[test]
    fn resample_changes_extent() {
        let plane = Array2::<f32>::ones((8, 8));
        let out = Interpolator::resample(&plane.view(), 4, 6, Sampling::Bilinear);
        assert_eq!(out.dim(), (4, 6));
        assert_abs_diff_eq!(out, Array2::ones((4, 6)), epsilon = 1e-6);
    }

    #[test]
    fn rotate_by_zero_is_identity() {
        let plane = array![[0.0, 1.0], [2.0, 3.0]];
        let out = Interpolator::rotate(&plane.view(), 0.0, Sampling::Bilinear);
        assert_abs_diff_eq!(out, plane, epsilon = 1e-6);
    }

    #[test]
    fn flip_lr_reverses_columns() {
        let plane = array![[0.0, 1.0, 2.0]];
        let out = Interpolator::flip_lr(&plane.view());
        assert_abs_diff_eq!(out, array![[2.0, 1.0, 0.0]]);
    }
}
