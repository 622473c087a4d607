//! Aspect-preserving resize of 2D maps.
//!
//! Each map is scaled by the limiting ratio so it fits the target canvas, resampled
//! bilinearly with half-pixel centres, and centred on a zero canvas. Nothing is cropped.

use ndarray::{s, Array2, Array3, ArrayView2, Axis};

/// Resize one grid to `(target_h, target_w)`, padding with zeros.
pub fn resize_with_pad(grid: ArrayView2<f64>, target_h: usize, target_w: usize) -> Array2<f64> {
    let mut canvas = Array2::zeros((target_h, target_w));
    let (in_h, in_w) = grid.dim();

    if in_h == 0 || in_w == 0 || target_h == 0 || target_w == 0 {
        return canvas;
    }

    let ratio = f64::max(in_w as f64 / target_w as f64, in_h as f64 / target_h as f64);
    let resized_h = ((in_h as f64 / ratio).floor() as usize).clamp(1, target_h);
    let resized_w = ((in_w as f64 / ratio).floor() as usize).clamp(1, target_w);

    let resized = bilinear(grid, resized_h, resized_w);

    let offset_h = (target_h - resized_h) / 2;
    let offset_w = (target_w - resized_w) / 2;
    canvas
        .slice_mut(s![offset_h..offset_h + resized_h, offset_w..offset_w + resized_w])
        .assign(&resized);

    canvas
}

/// Resize every map of a `[n, h, w]` stack.
pub fn resize_stack(maps: &Array3<f64>, target_h: usize, target_w: usize) -> Array3<f64> {
    let mut out = Array3::zeros((maps.len_of(Axis(0)), target_h, target_w));

    for (grid, mut dst) in maps.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))) {
        dst.assign(&resize_with_pad(grid, target_h, target_w));
    }

    out
}

fn bilinear(grid: ArrayView2<f64>, out_h: usize, out_w: usize) -> Array2<f64> {
    let (in_h, in_w) = grid.dim();
    let scale_h = in_h as f64 / out_h as f64;
    let scale_w = in_w as f64 / out_w as f64;

    let rows: Vec<Sample> = (0..out_h).map(|y| Sample::new(y, scale_h, in_h)).collect();
    let cols: Vec<Sample> = (0..out_w).map(|x| Sample::new(x, scale_w, in_w)).collect();

    Array2::from_shape_fn((out_h, out_w), |(y, x)| {
        let r = &rows[y];
        let c = &cols[x];

        let top = grid[[r.lower, c.lower]] + (grid[[r.lower, c.upper]] - grid[[r.lower, c.lower]]) * c.lerp;
        let bottom = grid[[r.upper, c.lower]] + (grid[[r.upper, c.upper]] - grid[[r.upper, c.lower]]) * c.lerp;

        top + (bottom - top) * r.lerp
    })
}

/// Source neighbours and interpolation weight for one output coordinate.
struct Sample {
    lower: usize,
    upper: usize,
    lerp: f64,
}

impl Sample {
    fn new(out: usize, scale: f64, in_len: usize) -> Self {
        let src = (out as f64 + 0.5) * scale - 0.5;
        let floor = src.floor();
        let last = in_len - 1;

        Self {
            lower: (floor.max(0.0) as usize).min(last),
            upper: (src.ceil().max(0.0) as usize).min(last),
            lerp: src - floor,
        }
    }
}
