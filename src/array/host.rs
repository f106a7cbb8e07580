//! Host-resident plain arrays
//!
//! The representation-agnostic array every family is materialized into:
//! a contiguous row-major buffer together with its shape.

use std::fmt;

use crate::error::{Error, Result};

/// Element type shared by every supported array family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// Unsigned bytes, also used for boolean masks
    U8,
    /// 32-bit unsigned integers
    U32,
    /// 64-bit signed integers (token ids, codes)
    I64,
    /// Single precision floats
    F32,
    /// Double precision floats
    F64,
}

impl DType {
    /// Short lowercase name (e.g. "f32")
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::U8 => "u8",
            DType::U32 => "u32",
            DType::I64 => "i64",
            DType::F32 => "f32",
            DType::F64 => "f64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed element buffer of a [`HostArray`]
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum HostData {
    U8(Vec<u8>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl HostData {
    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            HostData::U8(v) => v.len(),
            HostData::U32(v) => v.len(),
            HostData::I64(v) => v.len(),
            HostData::F32(v) => v.len(),
            HostData::F64(v) => v.len(),
        }
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type of the buffer
    pub fn dtype(&self) -> DType {
        match self {
            HostData::U8(_) => DType::U8,
            HostData::U32(_) => DType::U32,
            HostData::I64(_) => DType::I64,
            HostData::F32(_) => DType::F32,
            HostData::F64(_) => DType::F64,
        }
    }
}

/// Plain host array: shape plus row-major data
#[derive(Debug, Clone, PartialEq)]
pub struct HostArray {
    shape: Vec<usize>,
    data: HostData,
}

impl HostArray {
    /// Create a host array, checking the element count against the shape
    ///
    /// An empty shape denotes a scalar and holds exactly one element.
    pub fn new(shape: Vec<usize>, data: HostData) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::Shape(format!(
                "shape {:?} needs {} elements, buffer holds {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Shape of the array
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Element buffer
    pub fn data(&self) -> &HostData {
        &self.data
    }

    /// Element type
    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// Total number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow as f32 slice (fails for any other dtype)
    pub fn as_f32(&self) -> Result<&[f32]> {
        match &self.data {
            HostData::F32(v) => Ok(v),
            other => Err(dtype_mismatch(DType::F32, other.dtype())),
        }
    }

    /// Borrow as f64 slice (fails for any other dtype)
    pub fn as_f64(&self) -> Result<&[f64]> {
        match &self.data {
            HostData::F64(v) => Ok(v),
            other => Err(dtype_mismatch(DType::F64, other.dtype())),
        }
    }

    /// Borrow as i64 slice (fails for any other dtype)
    pub fn as_i64(&self) -> Result<&[i64]> {
        match &self.data {
            HostData::I64(v) => Ok(v),
            other => Err(dtype_mismatch(DType::I64, other.dtype())),
        }
    }

    /// Borrow as u8 slice (fails for any other dtype)
    pub fn as_u8(&self) -> Result<&[u8]> {
        match &self.data {
            HostData::U8(v) => Ok(v),
            other => Err(dtype_mismatch(DType::U8, other.dtype())),
        }
    }
}

fn dtype_mismatch(expected: DType, actual: DType) -> Error {
    Error::TypeKind(format!("expected {} array, got {}", expected, actual))
}

macro_rules! impl_from_vec {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for HostData {
                fn from(v: Vec<$ty>) -> Self {
                    HostData::$variant(v)
                }
            }

            impl From<Vec<$ty>> for HostArray {
                fn from(v: Vec<$ty>) -> Self {
                    Self {
                        shape: vec![v.len()],
                        data: HostData::$variant(v),
                    }
                }
            }
        )*
    };
}

impl_from_vec! {
    u8 => U8,
    u32 => U32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}
