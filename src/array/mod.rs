//! Array normalization
//!
//! Moves named values between array families:
//! - plain host arrays (shape + row-major buffer)
//! - candle tensors (device resident, may track gradients)
//! - ndarray arrays (host resident, arbitrary strides)

mod convert;
mod host;
mod nd;
mod tensor;

pub use convert::{
    candle_to_host, host_to_candle, host_to_ndarray, ndarray_to_host, NamedValues, Payload,
    Value, DEFAULT_OUTPUT_KEY,
};
pub use host::{DType, HostArray, HostData};
pub use nd::NdArray;
pub use tensor::{candle_dtype, tensor_from_host, tensor_to_host};
