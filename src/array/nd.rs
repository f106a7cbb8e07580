//! ndarray family: dynamically-ranked host arrays with a runtime dtype tag

use ndarray::{ArrayD, IxDyn};

use super::host::{DType, HostArray, HostData};
use crate::error::Result;

/// An `ndarray::ArrayD` of any supported element type
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum NdArray {
    U8(ArrayD<u8>),
    U32(ArrayD<u32>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

impl NdArray {
    /// Shape of the array
    pub fn shape(&self) -> &[usize] {
        match self {
            NdArray::U8(a) => a.shape(),
            NdArray::U32(a) => a.shape(),
            NdArray::I64(a) => a.shape(),
            NdArray::F32(a) => a.shape(),
            NdArray::F64(a) => a.shape(),
        }
    }

    /// Element type
    pub fn dtype(&self) -> DType {
        match self {
            NdArray::U8(_) => DType::U8,
            NdArray::U32(_) => DType::U32,
            NdArray::I64(_) => DType::I64,
            NdArray::F32(_) => DType::F32,
            NdArray::F64(_) => DType::F64,
        }
    }

    /// Build from a host array without changing any element
    pub fn from_host(arr: &HostArray) -> Result<Self> {
        let shape = IxDyn(arr.shape());
        let nd = match arr.data() {
            HostData::U8(v) => NdArray::U8(ArrayD::from_shape_vec(shape, v.clone())?),
            HostData::U32(v) => NdArray::U32(ArrayD::from_shape_vec(shape, v.clone())?),
            HostData::I64(v) => NdArray::I64(ArrayD::from_shape_vec(shape, v.clone())?),
            HostData::F32(v) => NdArray::F32(ArrayD::from_shape_vec(shape, v.clone())?),
            HostData::F64(v) => NdArray::F64(ArrayD::from_shape_vec(shape, v.clone())?),
        };
        Ok(nd)
    }

    /// Copy into a row-major host array
    ///
    /// Iteration follows logical order, so transposed or sliced views come out
    /// in standard layout.
    pub fn to_host(&self) -> Result<HostArray> {
        let shape = self.shape().to_vec();
        let data = match self {
            NdArray::U8(a) => HostData::U8(a.iter().copied().collect()),
            NdArray::U32(a) => HostData::U32(a.iter().copied().collect()),
            NdArray::I64(a) => HostData::I64(a.iter().copied().collect()),
            NdArray::F32(a) => HostData::F32(a.iter().copied().collect()),
            NdArray::F64(a) => HostData::F64(a.iter().copied().collect()),
        };
        HostArray::new(shape, data)
    }
}

macro_rules! impl_from_array {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<ArrayD<$ty>> for NdArray {
                fn from(a: ArrayD<$ty>) -> Self {
                    NdArray::$variant(a)
                }
            }
        )*
    };
}

impl_from_array! {
    u8 => U8,
    u32 => U32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_from_host_keeps_shape() {
        let host = HostArray::new(vec![2, 2], HostData::I64(vec![1, 2, 3, 4])).unwrap();
        let nd = NdArray::from_host(&host).unwrap();
        assert_eq!(nd.shape(), &[2, 2]);
        assert_eq!(nd.dtype(), DType::I64);
    }

    #[test]
    fn test_to_host_uses_logical_order() {
        let a = Array2::from_shape_vec((2, 3), vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let transposed = NdArray::from(a.reversed_axes().into_dyn());

        let host = transposed.to_host().unwrap();
        assert_eq!(host.shape(), &[3, 2]);
        assert_eq!(host.as_f32().unwrap(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }
}
