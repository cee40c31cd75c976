//! Backend-native values and their conversion to JSON.
//!
//! Recordings carry static fields next to the waveforms: numeric scalars,
//! strings, raw byte strings, small arrays. [`RawValue`] models those as the
//! backend hands them out; [`to_json`] turns them into plain JSON for the UI
//! boundary and refuses anything it cannot represent faithfully.

use crate::error::SerializeError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

const BYTES_KEY: &str = "$bytes";

#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Numeric array in row-major order.
    Array { shape: Vec<usize>, data: Vec<f64> },
    /// Object array; a single element collapses to its scalar.
    Objects(Vec<RawValue>),
    List(Vec<RawValue>),
    Map(BTreeMap<String, RawValue>),
    /// Value the backend could not decode, tagged with its type name.
    Opaque(String),
}

/// Convert a backend value into JSON for the UI boundary.
///
/// Byte strings decode as lossy UTF-8, numeric arrays flatten to `f32`
/// precision sequences, single-element object arrays collapse to the
/// element. Non-finite floats and opaque values are errors.
pub fn to_json(value: &RawValue) -> Result<Value, SerializeError> {
    Ok(match value {
        RawValue::None => Value::Null,
        RawValue::Bool(b) => Value::Bool(*b),
        RawValue::Int(i) => Value::from(*i),
        RawValue::Float(f) => finite(*f)?,
        RawValue::Str(s) => Value::String(s.clone()),
        RawValue::Bytes(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        RawValue::Array { shape, data } => {
            let expected: usize = shape.iter().product();
            if expected != data.len() {
                return Err(SerializeError::Unsupported {
                    what: format!(
                        "array of shape {:?} holding {} values",
                        shape,
                        data.len()
                    ),
                });
            }
            let flat = data
                .iter()
                .map(|v| finite(*v as f32 as f64))
                .collect::<Result<Vec<_>, _>>()?;
            Value::Array(flat)
        }
        RawValue::Objects(items) if items.len() == 1 => to_json(&items[0])?,
        RawValue::Objects(items) | RawValue::List(items) => {
            Value::Array(items.iter().map(to_json).collect::<Result<Vec<_>, _>>()?)
        }
        RawValue::Map(map) => {
            let mut out = Map::new();
            for (key, val) in map {
                out.insert(key.clone(), to_json(val)?);
            }
            Value::Object(out)
        }
        RawValue::Opaque(type_name) => {
            return Err(SerializeError::Unsupported {
                what: format!("opaque value of type {type_name}"),
            })
        }
    })
}

fn finite(value: f64) -> Result<Value, SerializeError> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| SerializeError::Unsupported {
            what: format!("non-finite float {value}"),
        })
}

/// Read a value from an attribute file.
///
/// Rectangular nested numeric arrays become [`RawValue::Array`], other
/// arrays become object arrays, and `{"$bytes": "<base64>"}` carries raw
/// bytes.
pub fn from_storage_json(value: &Value) -> RawValue {
    match value {
        Value::Null => RawValue::None,
        Value::Bool(b) => RawValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => RawValue::Int(i),
            None => RawValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => RawValue::Str(s.clone()),
        Value::Array(items) => match numeric_array(value) {
            Some((shape, data)) => RawValue::Array { shape, data },
            None => RawValue::Objects(items.iter().map(from_storage_json).collect()),
        },
        Value::Object(map) => {
            if let (1, Some(Value::String(encoded))) = (map.len(), map.get(BYTES_KEY)) {
                return match STANDARD.decode(encoded) {
                    Ok(bytes) => RawValue::Bytes(bytes),
                    Err(_) => RawValue::Opaque("malformed base64 bytes".into()),
                };
            }
            RawValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), from_storage_json(v)))
                    .collect(),
            )
        }
    }
}

/// Inverse of [`from_storage_json`], used when writing attribute files.
pub fn to_storage_json(value: &RawValue) -> Result<Value, SerializeError> {
    match value {
        RawValue::Bytes(bytes) => {
            let mut map = Map::new();
            map.insert(BYTES_KEY.into(), Value::String(STANDARD.encode(bytes)));
            Ok(Value::Object(map))
        }
        RawValue::Array { shape, data } => nest(shape, data),
        RawValue::Objects(items) | RawValue::List(items) => Ok(Value::Array(
            items
                .iter()
                .map(to_storage_json)
                .collect::<Result<Vec<_>, _>>()?,
        )),
        RawValue::Map(map) => {
            let mut out = Map::new();
            for (key, val) in map {
                out.insert(key.clone(), to_storage_json(val)?);
            }
            Ok(Value::Object(out))
        }
        RawValue::Float(f) => finite(*f),
        other => to_json(other),
    }
}

fn nest(shape: &[usize], data: &[f64]) -> Result<Value, SerializeError> {
    match shape.split_first() {
        None => data
            .first()
            .map(|v| finite(*v))
            .unwrap_or(Ok(Value::Null)),
        Some((&len, rest)) => {
            let stride: usize = rest.iter().product();
            let mut items = Vec::with_capacity(len);
            for i in 0..len {
                let chunk = data
                    .get(i * stride..(i + 1) * stride)
                    .ok_or_else(|| SerializeError::Unsupported {
                        what: format!("array of shape {:?} holding {} values", shape, data.len()),
                    })?;
                if rest.is_empty() {
                    items.push(finite(chunk[0])?);
                } else {
                    items.push(nest(rest, chunk)?);
                }
            }
            Ok(Value::Array(items))
        }
    }
}

fn numeric_array(value: &Value) -> Option<(Vec<usize>, Vec<f64>)> {
    match value {
        Value::Number(n) => Some((Vec::new(), vec![n.as_f64()?])),
        Value::Array(items) => {
            let mut shape = None;
            let mut data = Vec::new();
            for item in items {
                let (inner_shape, inner_data) = numeric_array(item)?;
                if let Some(existing) = &shape {
                    if *existing != inner_shape {
                        return None;
                    }
                } else {
                    shape = Some(inner_shape);
                }
                data.extend(inner_data);
            }
            let mut full = vec![items.len()];
            full.extend(shape.unwrap_or_default());
            Some((full, data))
        }
        _ => None,
    }
}

/// Static per-subject fields, grouped the way the recording groups them
/// (`fix` for subject-level fields plus one group per channel).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectMetadata {
    groups: BTreeMap<String, BTreeMap<String, RawValue>>,
}

impl SubjectMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_group(&mut self, name: impl Into<String>, fields: BTreeMap<String, RawValue>) {
        self.groups.insert(name.into(), fields);
    }

    pub fn group(&self, name: &str) -> Option<&BTreeMap<String, RawValue>> {
        self.groups.get(name)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, RawValue>)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field(&self, group: &str, key: &str) -> Option<&RawValue> {
        self.groups.get(group).and_then(|g| g.get(key))
    }

    pub fn to_json(&self) -> Result<Value, SerializeError> {
        let mut out = Map::new();
        for (name, fields) in &self.groups {
            let mut group = Map::new();
            for (key, val) in fields {
                group.insert(key.clone(), to_json(val)?);
            }
            out.insert(name.clone(), Value::Object(group));
        }
        Ok(Value::Object(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_bytes_and_collapses_single_objects() {
        let note = RawValue::Objects(vec![RawValue::Bytes(b"sinus rhythm".to_vec())]);
        assert_eq!(to_json(&note).unwrap(), json!("sinus rhythm"));
        let many = RawValue::Objects(vec![RawValue::Int(1), RawValue::Str("a".into())]);
        assert_eq!(to_json(&many).unwrap(), json!([1, "a"]));
        let invalid = RawValue::Bytes(vec![0x66, 0x6f, 0xff]);
        assert_eq!(to_json(&invalid).unwrap(), json!("fo\u{fffd}"));
    }

    #[test]
    fn flattens_multidimensional_arrays_to_f32() {
        let arr = RawValue::Array {
            shape: vec![2, 2],
            data: vec![1.0, 2.0, 3.0, 0.1],
        };
        let js = to_json(&arr).unwrap();
        let values = js.as_array().unwrap();
        assert_eq!(values.len(), 4);
        assert_eq!(values[0], json!(1.0));
        assert_eq!(values[3].as_f64().unwrap(), 0.1f32 as f64);
    }

    #[test]
    fn unsupported_values_fail_loudly() {
        assert!(matches!(
            to_json(&RawValue::Float(f64::NAN)),
            Err(SerializeError::Unsupported { .. })
        ));
        assert!(matches!(
            to_json(&RawValue::Opaque("compound".into())),
            Err(SerializeError::Unsupported { .. })
        ));
        let mut map = BTreeMap::new();
        map.insert("bad".into(), RawValue::Float(f64::INFINITY));
        assert!(to_json(&RawValue::Map(map)).is_err());
        let ragged = RawValue::Array {
            shape: vec![3],
            data: vec![1.0],
        };
        assert!(to_json(&ragged).is_err());
    }

    #[test]
    fn storage_json_recognises_arrays_and_bytes() {
        let attrs = json!({
            "fs": 125,
            "gain": 0.5,
            "matrix": [[1.5, 2.0], [3.0, 4.0]],
            "subject_notes": [{"$bytes": "bm90ZQ=="}],
            "tags": ["a", 1],
        });
        let raw = from_storage_json(&attrs);
        let RawValue::Map(map) = &raw else {
            panic!("expected map, got {raw:?}");
        };
        assert_eq!(map["fs"], RawValue::Int(125));
        assert_eq!(map["gain"], RawValue::Float(0.5));
        assert_eq!(
            map["matrix"],
            RawValue::Array {
                shape: vec![2, 2],
                data: vec![1.5, 2.0, 3.0, 4.0]
            }
        );
        assert_eq!(to_json(&map["subject_notes"]).unwrap(), json!("note"));
        assert!(matches!(map["tags"], RawValue::Objects(_)));
        assert_eq!(to_storage_json(&raw).unwrap(), attrs);
    }

    #[test]
    fn metadata_groups_serialize_per_group() {
        let mut meta = SubjectMetadata::new();
        let mut fix = BTreeMap::new();
        fix.insert("age".to_string(), RawValue::Int(61));
        meta.insert_group("fix", fix);
        let mut ppg = BTreeMap::new();
        ppg.insert("fs".to_string(), RawValue::Float(125.0));
        meta.insert_group("ppg", ppg);
        assert_eq!(meta.field("ppg", "fs"), Some(&RawValue::Float(125.0)));
        assert_eq!(
            meta.to_json().unwrap(),
            json!({"fix": {"age": 61}, "ppg": {"fs": 125.0}})
        );
    }
}
