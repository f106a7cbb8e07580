//! Conversions between array families over named value mappings
//!
//! Every operation returns a fresh mapping. Values that are not arrays of the
//! source family (scalars, strings, markers, arrays of another family) are
//! cloned through untouched.

use candle_core::{Device, Tensor};
use indexmap::IndexMap;
use tracing::debug;

use super::host::HostArray;
use super::nd::NdArray;
use super::tensor::{tensor_from_host, tensor_to_host};
use crate::error::{Error, Result};

/// Key used when a single array is wrapped into a mapping
pub const DEFAULT_OUTPUT_KEY: &str = "output";

/// A named value: an array of one of the supported families, or anything else
#[derive(Debug, Clone)]
pub enum Value {
    /// Plain host array
    Host(HostArray),
    /// candle tensor
    Candle(Tensor),
    /// ndarray array
    NdArray(NdArray),
    /// Opaque pass-through value (null, scalar, string, nested structure)
    Other(serde_json::Value),
}

impl Value {
    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Host(_) => "host array",
            Value::Candle(_) => "candle tensor",
            Value::NdArray(_) => "ndarray array",
            Value::Other(_) => "non-array value",
        }
    }

    /// Whether this is an array of any family
    pub fn is_array(&self) -> bool {
        !matches!(self, Value::Other(_))
    }

    /// Shape for arrays, `None` for pass-through values
    pub fn shape(&self) -> Option<Vec<usize>> {
        match self {
            Value::Host(a) => Some(a.shape().to_vec()),
            Value::Candle(t) => Some(t.dims().to_vec()),
            Value::NdArray(a) => Some(a.shape().to_vec()),
            Value::Other(_) => None,
        }
    }

    /// Borrow the host array, if this is one
    pub fn as_host(&self) -> Option<&HostArray> {
        match self {
            Value::Host(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow the candle tensor, if this is one
    pub fn as_candle(&self) -> Option<&Tensor> {
        match self {
            Value::Candle(t) => Some(t),
            _ => None,
        }
    }

    /// Borrow the ndarray array, if this is one
    pub fn as_ndarray(&self) -> Option<&NdArray> {
        match self {
            Value::NdArray(a) => Some(a),
            _ => None,
        }
    }
}

impl From<HostArray> for Value {
    fn from(a: HostArray) -> Self {
        Value::Host(a)
    }
}

impl From<Tensor> for Value {
    fn from(t: Tensor) -> Self {
        Value::Candle(t)
    }
}

impl From<NdArray> for Value {
    fn from(a: NdArray) -> Self {
        Value::NdArray(a)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Other(v)
    }
}

/// Insertion-ordered mapping from name to value
pub type NamedValues = IndexMap<String, Value>;

/// Input accepted by the normalizer: a whole mapping or one lone value
#[derive(Debug, Clone)]
pub enum Payload {
    /// Named value mapping
    Named(NamedValues),
    /// A single value
    Single(Value),
}

impl From<NamedValues> for Payload {
    fn from(map: NamedValues) -> Self {
        Payload::Named(map)
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        Payload::Single(v)
    }
}

impl From<Tensor> for Payload {
    fn from(t: Tensor) -> Self {
        Payload::Single(Value::Candle(t))
    }
}

impl From<NdArray> for Payload {
    fn from(a: NdArray) -> Self {
        Payload::Single(Value::NdArray(a))
    }
}

fn expect_named<'a>(payload: &'a Payload, op: &str) -> Result<&'a NamedValues> {
    match payload {
        Payload::Named(map) => Ok(map),
        Payload::Single(v) => Err(Error::TypeKind(format!(
            "{} expects a named value mapping, got a single {}",
            op,
            v.kind()
        ))),
    }
}

/// Apply `convert` to every array it accepts, cloning the rest
fn map_values<F>(data: &NamedValues, mut convert: F) -> Result<NamedValues>
where
    F: FnMut(&Value) -> Result<Option<Value>>,
{
    data.iter()
        .map(|(key, value)| {
            if !value.is_array() {
                return Ok((key.clone(), value.clone()));
            }
            let converted = match convert(value)? {
                Some(converted) => {
                    debug!(
                        "{}: {} {:?} -> {}",
                        key,
                        value.kind(),
                        value.shape().unwrap_or_default(),
                        converted.kind()
                    );
                    converted
                }
                None => value.clone(),
            };
            Ok((key.clone(), converted))
        })
        .collect()
}

/// Convert every host array in the mapping into a candle tensor on `device`
pub fn host_to_candle(payload: &Payload, device: &Device) -> Result<NamedValues> {
    let data = expect_named(payload, "host_to_candle")?;
    map_values(data, |value| match value {
        Value::Host(arr) => Ok(Some(Value::Candle(tensor_from_host(arr, device)?))),
        _ => Ok(None),
    })
}

/// Convert every host array in the mapping into an ndarray array
pub fn host_to_ndarray(payload: &Payload) -> Result<NamedValues> {
    let data = expect_named(payload, "host_to_ndarray")?;
    map_values(data, |value| match value {
        Value::Host(arr) => Ok(Some(Value::NdArray(NdArray::from_host(arr)?))),
        _ => Ok(None),
    })
}

/// Detach candle tensors and materialize them as host arrays
///
/// A lone tensor is wrapped as `{"output": host}`. In a mapping every tensor is
/// converted and keys are kept.
pub fn candle_to_host(payload: &Payload) -> Result<NamedValues> {
    match payload {
        Payload::Single(Value::Candle(t)) => {
            let mut out = NamedValues::new();
            out.insert(DEFAULT_OUTPUT_KEY.to_string(), Value::Host(tensor_to_host(t)?));
            Ok(out)
        }
        Payload::Single(other) => Err(Error::TypeKind(format!(
            "candle_to_host expects a candle tensor or a mapping, got a {}",
            other.kind()
        ))),
        Payload::Named(data) => map_values(data, |value| match value {
            Value::Candle(t) => Ok(Some(Value::Host(tensor_to_host(t)?))),
            _ => Ok(None),
        }),
    }
}

/// Copy ndarray arrays into row-major host arrays
///
/// Same wrapping rules as [`candle_to_host`].
pub fn ndarray_to_host(payload: &Payload) -> Result<NamedValues> {
    match payload {
        Payload::Single(Value::NdArray(a)) => {
            let mut out = NamedValues::new();
            out.insert(DEFAULT_OUTPUT_KEY.to_string(), Value::Host(a.to_host()?));
            Ok(out)
        }
        Payload::Single(other) => Err(Error::TypeKind(format!(
            "ndarray_to_host expects an ndarray array or a mapping, got a {}",
            other.kind()
        ))),
        Payload::Named(data) => map_values(data, |value| match value {
            Value::NdArray(a) => Ok(Some(Value::Host(a.to_host()?))),
            _ => Ok(None),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::HostData;
    use serde_json::json;

    fn sample() -> NamedValues {
        let mut map = NamedValues::new();
        map.insert(
            "logits".to_string(),
            HostArray::new(vec![2, 2], HostData::F32(vec![0.1, -0.2, 0.3, 1e-8]))
                .unwrap()
                .into(),
        );
        map.insert("ids".to_string(), HostArray::from(vec![5i64, 7, 11]).into());
        map.insert("mask".to_string(), HostArray::from(vec![1u8, 0, 1]).into());
        map.insert("label".to_string(), json!("cls").into());
        map.insert("extra".to_string(), json!(null).into());
        map
    }

    #[test]
    fn test_host_to_candle_converts_arrays_only() {
        let out = host_to_candle(&sample().into(), &Device::Cpu).unwrap();
        assert_eq!(out.len(), 5);
        assert_eq!(out["logits"].as_candle().unwrap().dims(), &[2, 2]);
        assert_eq!(out["ids"].as_candle().unwrap().dtype(), candle_core::DType::I64);
        assert!(matches!(&out["label"], Value::Other(v) if *v == json!("cls")));
        assert!(matches!(&out["extra"], Value::Other(serde_json::Value::Null)));
    }

    #[test]
    fn test_host_to_ndarray_preserves_keys_in_order() {
        let out = host_to_ndarray(&sample().into()).unwrap();
        let keys: Vec<&str> = out.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["logits", "ids", "mask", "label", "extra"]);
        assert_eq!(out["mask"].as_ndarray().unwrap().shape(), &[3]);
    }

    #[test]
    fn test_normalizer_rejects_single_value() {
        let single = Payload::from(Value::Host(HostArray::from(vec![1.0f32])));
        assert!(matches!(host_to_ndarray(&single), Err(Error::TypeKind(_))));
        assert!(matches!(
            host_to_candle(&single, &Device::Cpu),
            Err(Error::TypeKind(_))
        ));
    }

    #[test]
    fn test_candle_round_trip_is_exact() {
        let original = sample();
        let on_device = host_to_candle(&original.clone().into(), &Device::Cpu).unwrap();
        let back = candle_to_host(&on_device.into()).unwrap();

        for key in ["logits", "ids", "mask"] {
            assert_eq!(back[key].as_host(), original[key].as_host());
        }
    }

    #[test]
    fn test_ndarray_round_trip_is_exact() {
        let original = sample();
        let nd = host_to_ndarray(&original.clone().into()).unwrap();
        let back = ndarray_to_host(&nd.into()).unwrap();

        for key in ["logits", "ids", "mask"] {
            assert_eq!(back[key].as_host(), original[key].as_host());
        }
    }

    #[test]
    fn test_single_tensor_is_wrapped_as_output() {
        let t = Tensor::new(&[1.5f64, 2.5], &Device::Cpu).unwrap();
        let out = candle_to_host(&t.into()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[DEFAULT_OUTPUT_KEY].as_host().unwrap().as_f64().unwrap(), &[1.5, 2.5]);
    }

    #[test]
    fn test_detach_rejects_pass_through_single() {
        let single = Payload::from(Value::Other(json!(3)));
        assert!(matches!(candle_to_host(&single), Err(Error::TypeKind(_))));
        assert!(matches!(ndarray_to_host(&single), Err(Error::TypeKind(_))));
    }

    #[test]
    fn test_detach_passes_other_families_through() {
        let mut map = NamedValues::new();
        let zeros = ndarray::ArrayD::<f32>::zeros(ndarray::IxDyn(&[2]));
        map.insert("nd".to_string(), NdArray::from(zeros).into());
        map.insert("step".to_string(), json!(12).into());

        let out = candle_to_host(&map.into()).unwrap();
        assert!(out["nd"].as_ndarray().is_some());
        assert!(matches!(&out["step"], Value::Other(v) if *v == json!(12)));
    }

    #[test]
    fn test_value_shape_across_families() {
        let host = sample();
        let on_device = host_to_candle(&host.clone().into(), &Device::Cpu).unwrap();
        let nd = host_to_ndarray(&host.clone().into()).unwrap();

        for values in [&host, &on_device, &nd] {
            assert!(values["logits"].is_array());
            assert_eq!(values["logits"].shape(), Some(vec![2, 2]));
            assert_eq!(values["ids"].shape(), Some(vec![3]));
            assert!(!values["label"].is_array());
            assert_eq!(values["label"].shape(), None);
        }
    }
}
