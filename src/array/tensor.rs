//! candle family: device tensors that may carry a computation graph

use candle_core::{DType as CandleDType, Device, Tensor};

use super::host::{DType, HostArray, HostData};
use crate::error::{Error, Result};

/// Map a host dtype to candle's
pub fn candle_dtype(dtype: DType) -> CandleDType {
    match dtype {
        DType::U8 => CandleDType::U8,
        DType::U32 => CandleDType::U32,
        DType::I64 => CandleDType::I64,
        DType::F32 => CandleDType::F32,
        DType::F64 => CandleDType::F64,
    }
}

/// Upload a host array to `device` with the same shape, dtype and bits
pub fn tensor_from_host(arr: &HostArray, device: &Device) -> Result<Tensor> {
    let shape = arr.shape().to_vec();
    let tensor = match arr.data() {
        HostData::U8(v) => Tensor::from_slice(v.as_slice(), shape, device)?,
        HostData::U32(v) => Tensor::from_slice(v.as_slice(), shape, device)?,
        HostData::I64(v) => Tensor::from_slice(v.as_slice(), shape, device)?,
        HostData::F32(v) => Tensor::from_slice(v.as_slice(), shape, device)?,
        HostData::F64(v) => Tensor::from_slice(v.as_slice(), shape, device)?,
    };
    Ok(tensor)
}

/// Detach from the graph, copy to CPU and flatten into a host array
///
/// Half precision dtypes are rejected instead of being widened.
pub fn tensor_to_host(tensor: &Tensor) -> Result<HostArray> {
    let tensor = tensor.detach().to_device(&Device::Cpu)?;
    let shape = tensor.dims().to_vec();
    let flat = tensor.flatten_all()?;

    let data = match tensor.dtype() {
        CandleDType::U8 => HostData::U8(flat.to_vec1()?),
        CandleDType::U32 => HostData::U32(flat.to_vec1()?),
        CandleDType::I64 => HostData::I64(flat.to_vec1()?),
        CandleDType::F32 => HostData::F32(flat.to_vec1()?),
        CandleDType::F64 => HostData::F64(flat.to_vec1()?),
        other => {
            return Err(Error::TypeKind(format!(
                "candle dtype {:?} has no host representation",
                other
            )))
        }
    };

    HostArray::new(shape, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Var;

    #[test]
    fn test_tensor_from_host_keeps_layout() {
        let host = HostArray::new(vec![2, 3], HostData::F32(vec![0.5; 6])).unwrap();
        let t = tensor_from_host(&host, &Device::Cpu).unwrap();
        assert_eq!(t.dims(), &[2, 3]);
        assert_eq!(t.dtype(), candle_dtype(DType::F32));
    }

    #[test]
    fn test_tensor_to_host_detaches_variables() {
        let var = Var::new(&[1.0f32, 2.0, 3.0], &Device::Cpu).unwrap();
        let tracked = (var.as_tensor() * 2.0).unwrap();

        let host = tensor_to_host(&tracked).unwrap();
        assert_eq!(host.as_f32().unwrap(), &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_tensor_to_host_handles_transposed_input() {
        let t = Tensor::arange(0u32, 6, &Device::Cpu)
            .unwrap()
            .reshape((2, 3))
            .unwrap()
            .t()
            .unwrap();

        let host = tensor_to_host(&t).unwrap();
        assert_eq!(host.shape(), &[3, 2]);
        assert_eq!(host.data(), &HostData::U32(vec![0, 3, 1, 4, 2, 5]));
    }

    #[test]
    fn test_half_precision_is_rejected() {
        let t = Tensor::zeros((2,), CandleDType::F16, &Device::Cpu).unwrap();
        assert!(matches!(tensor_to_host(&t), Err(Error::TypeKind(_))));
    }
}
