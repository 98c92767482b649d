//! Host-side reference kernels.
//!
//! These are the numerics behind both the host-emulation device filters and
//! the CPU fallback path, so a stage that falls back produces bit-identical
//! results to the emulated device. All kernels write into a preallocated
//! destination image and quantize to the destination's pixel kind on the way
//! out. Parallelized over output samples with rayon.

use rayon::prelude::*;

use pyr_core::Image;

use crate::{ComputeError, ComputeResult};

/// Separable gaussian smoothing with per-axis sigmas (pixel units).
///
/// A sigma of zero (or negative) skips that axis. Boundaries clamp.
pub fn smooth_into(src: &Image, sigmas: &[f64], dst: &mut Image) -> ComputeResult<()> {
    if dst.size() != src.size() {
        return Err(ComputeError::InvalidInput(format!(
            "smooth output shape {:?} != input shape {:?}",
            dst.size(),
            src.size()
        )));
    }
    if sigmas.len() != src.dimension() {
        return Err(ComputeError::InvalidInput(format!(
            "{} sigmas for dimension {}",
            sigmas.len(),
            src.dimension()
        )));
    }

    let size = src.size().to_vec();
    let strides = src.strides();
    let mut current = src.data().to_vec();

    for axis in 0..size.len() {
        let sigma = sigmas[axis];
        if sigma <= 0.0 {
            continue;
        }
        let weights = gaussian_weights(sigma);
        let radius = (weights.len() / 2) as isize;
        let stride = strides[axis] as isize;
        let extent = size[axis] as isize;

        let next: Vec<f32> = (0..current.len())
            .into_par_iter()
            .map(|idx| {
                let along = ((idx / strides[axis]) % size[axis]) as isize;
                let mut acc = 0.0f64;
                for (k, &w) in weights.iter().enumerate() {
                    let sample = (along + k as isize - radius).clamp(0, extent - 1);
                    let nidx = (idx as isize + (sample - along) * stride) as usize;
                    acc += w * current[nidx] as f64;
                }
                acc as f32
            })
            .collect();
        current = next;
    }

    dst.data_mut().copy_from_slice(&current);
    let spacing = src.spacing().to_vec();
    dst.set_spacing(&spacing)?;
    quantize_to_kind(dst);
    Ok(())
}

/// Integer-factor shrink: keeps every factor-th sample per axis.
///
/// The destination extents must equal `max(1, src / factor)` per axis;
/// spacing is scaled by the factor.
pub fn shrink_into(src: &Image, factors: &[u32], dst: &mut Image) -> ComputeResult<()> {
    if factors.len() != src.dimension() || factors.iter().any(|&f| f == 0) {
        return Err(ComputeError::InvalidInput(format!(
            "bad shrink factors {factors:?} for dimension {}",
            src.dimension()
        )));
    }
    let expected = shrunk_size(src.size(), factors);
    if dst.size() != expected.as_slice() {
        return Err(ComputeError::InvalidInput(format!(
            "shrink output shape {:?} != expected {:?}",
            dst.size(),
            expected
        )));
    }

    let src_size = src.size().to_vec();
    let src_strides = src.strides();
    let dst_size = dst.size().to_vec();
    let dst_strides = dst.strides();
    let src_data = src.data();
    let factors = factors.to_vec();

    let out: Vec<f32> = (0..dst.len())
        .into_par_iter()
        .map(|idx| {
            let mut src_idx = 0;
            for axis in 0..dst_size.len() {
                let coord = (idx / dst_strides[axis]) % dst_size[axis];
                let sampled = (coord * factors[axis] as usize).min(src_size[axis] - 1);
                src_idx += sampled * src_strides[axis];
            }
            src_data[src_idx]
        })
        .collect();
    dst.data_mut().copy_from_slice(&out);

    let spacing: Vec<f64> = src
        .spacing()
        .iter()
        .zip(&factors)
        .map(|(s, &f)| s * f as f64)
        .collect();
    dst.set_spacing(&spacing)?;
    quantize_to_kind(dst);
    Ok(())
}

/// Linear resample onto the destination grid (pixel-center alignment).
pub fn resample_into(src: &Image, dst: &mut Image) -> ComputeResult<()> {
    if dst.dimension() != src.dimension() {
        return Err(ComputeError::InvalidInput(format!(
            "resample output dimension {} != input dimension {}",
            dst.dimension(),
            src.dimension()
        )));
    }

    let dim = src.dimension();
    let src_size = src.size().to_vec();
    let src_strides = src.strides();
    let dst_size = dst.size().to_vec();
    let dst_strides = dst.strides();
    let src_data = src.data();
    let scale: Vec<f64> = (0..dim)
        .map(|a| src_size[a] as f64 / dst_size[a] as f64)
        .collect();

    let out: Vec<f32> = (0..dst.len())
        .into_par_iter()
        .map(|idx| {
            // Continuous source position per axis, with floor/frac split.
            let mut lo = [0usize; 3];
            let mut frac = [0.0f64; 3];
            for axis in 0..dim {
                let coord = (idx / dst_strides[axis]) % dst_size[axis];
                let pos = (coord as f64 + 0.5) * scale[axis] - 0.5;
                let pos = pos.clamp(0.0, (src_size[axis] - 1) as f64);
                let floor = pos.floor();
                lo[axis] = floor as usize;
                frac[axis] = pos - floor;
            }
            // Accumulate the 2^dim corner contributions.
            let mut acc = 0.0f64;
            for corner in 0..(1usize << dim) {
                let mut weight = 1.0f64;
                let mut src_idx = 0usize;
                for axis in 0..dim {
                    let hi = (corner >> axis) & 1 == 1;
                    let c = if hi {
                        (lo[axis] + 1).min(src_size[axis] - 1)
                    } else {
                        lo[axis]
                    };
                    weight *= if hi { frac[axis] } else { 1.0 - frac[axis] };
                    src_idx += c * src_strides[axis];
                }
                if weight > 0.0 {
                    acc += weight * src_data[src_idx] as f64;
                }
            }
            acc as f32
        })
        .collect();
    dst.data_mut().copy_from_slice(&out);

    let spacing: Vec<f64> = (0..dim)
        .map(|a| src.spacing()[a] * scale[a])
        .collect();
    dst.set_spacing(&spacing)?;
    quantize_to_kind(dst);
    Ok(())
}

/// Copy samples, quantizing to the destination kind.
pub fn cast_into(src: &Image, dst: &mut Image) -> ComputeResult<()> {
    if dst.size() != src.size() {
        return Err(ComputeError::InvalidInput(format!(
            "cast output shape {:?} != input shape {:?}",
            dst.size(),
            src.size()
        )));
    }
    dst.data_mut().copy_from_slice(src.data());
    let spacing = src.spacing().to_vec();
    dst.set_spacing(&spacing)?;
    quantize_to_kind(dst);
    Ok(())
}

/// Destination extents after an integer shrink.
pub fn shrunk_size(size: &[usize], factors: &[u32]) -> Vec<usize> {
    size.iter()
        .zip(factors)
        .map(|(&s, &f)| (s / f as usize).max(1))
        .collect()
}

fn quantize_to_kind(img: &mut Image) {
    let kind = img.kind();
    if !kind.is_integer() {
        return;
    }
    img.data_mut()
        .par_iter_mut()
        .for_each(|v| *v = kind.quantize(*v));
}

fn gaussian_weights(sigma: f64) -> Vec<f64> {
    let radius = ((3.0 * sigma).ceil() as usize).max(1);
    let mut weights: Vec<f64> = (0..=2 * radius)
        .map(|k| {
            let x = k as f64 - radius as f64;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}
