//
// Copyright (c) 2024 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::error::{DriverError, DriverErrorCode};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use oracle_nosql_rust_sdk::types::{FieldValue, MapValue};
use serde_json::{Map, Number, Value};
use std::result::Result;

/// Convert a value read from a NoSQL table into JSON.
///
/// Binary values become base64 strings and timestamps RFC 3339 strings, which
/// is how they would have been written as JSON in the first place.
pub(crate) fn field_value_to_json(fv: &FieldValue) -> Result<Value, DriverError> {
    match fv {
        FieldValue::Array(a) => {
            let mut arr = Vec::with_capacity(a.len());
            for v in a {
                arr.push(field_value_to_json(v)?);
            }
            Ok(Value::Array(arr))
        }
        FieldValue::Map(m) => map_value_to_json(m),
        FieldValue::Binary(b) => Ok(Value::String(BASE64_STANDARD.encode(b))),
        FieldValue::Boolean(b) => Ok(Value::Bool(*b)),
        FieldValue::Double(d) => match Number::from_f64(*d) {
            Some(n) => Ok(Value::Number(n)),
            None => Err(DriverError::new(
                DriverErrorCode::Serialization,
                &format!("double value {} has no JSON representation", d),
            )),
        },
        FieldValue::Integer(i) => Ok(Value::from(*i)),
        FieldValue::Long(l) => Ok(Value::from(*l)),
        FieldValue::String(s) => Ok(Value::String(s.clone())),
        FieldValue::Timestamp(t) => Ok(Value::String(t.to_rfc3339())),
        FieldValue::Number(n) => Ok(serde_json::from_str::<Value>(&n.to_string())?),
        // JsonNull, Null, Empty and unset values all read as null
        _ => Ok(Value::Null),
    }
}

pub(crate) fn map_value_to_json(m: &MapValue) -> Result<Value, DriverError> {
    let mut obj = Map::new();
    for (k, v) in m.iter() {
        obj.insert(k.clone(), field_value_to_json(v)?);
    }
    Ok(Value::Object(obj))
}
