use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::{BrbmError, Result};

/// CPU backend used by default and in tests.
pub type CpuBackend = burn::backend::NdArray<f32>;

#[cfg(feature = "gpu")]
pub type WgpuBackend = burn::backend::Wgpu;

pub fn cpu_device() -> <CpuBackend as Backend>::Device {
    Default::default()
}

#[cfg(feature = "gpu")]
pub fn init_gpu_device() -> burn::backend::wgpu::WgpuDevice {
    // Burn's WGPU backend uses Default::default() for device creation
    burn::backend::wgpu::WgpuDevice::default()
}

/// Copy a float tensor back to the host as a flat row-major `Vec<f32>`.
pub fn to_host<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| BrbmError::TensorData(format!("{e:?}")))
}

/// Build a `[rows, cols]` tensor from row-major host data.
pub fn from_host<B: Backend>(
    data: Vec<f32>,
    rows: usize,
    cols: usize,
    device: &B::Device,
) -> Result<Tensor<B, 2>> {
    if data.len() != rows * cols {
        return Err(BrbmError::ShapeMismatch {
            what: "host buffer",
            expected: vec![rows * cols],
            actual: vec![data.len()],
        });
    }
    Ok(Tensor::from_data(
        burn::tensor::TensorData::new(data, [rows, cols]),
        device,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_round_trip_keeps_layout() {
        let device = cpu_device();
        let t = from_host::<CpuBackend>(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3, &device)
            .expect("build tensor");
        assert_eq!(t.dims(), [2, 3]);

        let col = t.slice([0..2, 1..2]);
        assert_eq!(to_host(col).expect("read"), vec![2.0, 5.0]);
    }

    #[test]
    fn test_from_host_rejects_bad_length() {
        let device = cpu_device();
        let result = from_host::<CpuBackend>(vec![1.0; 5], 2, 3, &device);
        assert!(matches!(result, Err(BrbmError::ShapeMismatch { .. })));
    }
}
