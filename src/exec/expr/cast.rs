// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Generic text-to-type cast service.
//!
//! This is the engine's default try-cast path for target types without a
//! custom strict implementation (floats, temporal types, booleans). Failures
//! become nulls; the strict numeric policies never route through here.
use arrow::array::{Array, ArrayRef, BooleanBuilder, StringArray, StringBuilder};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use std::sync::Arc;

fn parse_text_to_boolean(value: &str) -> Option<bool> {
    // Integer literals first; when that succeeds, non-zero is true.
    // Otherwise fall back to strict boolean text parsing.
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(v) = trimmed.parse::<i32>() {
        return Some(v != 0);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Some(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Some(false);
    }
    None
}

fn cast_utf8_to_boolean_array(arr: &StringArray) -> ArrayRef {
    let mut builder = BooleanBuilder::new();
    for i in 0..arr.len() {
        if arr.is_null(i) {
            builder.append_null();
            continue;
        }
        match parse_text_to_boolean(arr.value(i)) {
            Some(v) => builder.append_value(v),
            None => builder.append_null(),
        }
    }
    Arc::new(builder.finish()) as ArrayRef
}

/// Blank values never parse; normalize them to nulls so the safe cast kernel
/// does not have to reject each one row by row.
fn blank_to_null(arr: &StringArray) -> ArrayRef {
    let mut builder = StringBuilder::new();
    for i in 0..arr.len() {
        if arr.is_null(i) || arr.value(i).trim().is_empty() {
            builder.append_null();
        } else {
            builder.append_value(arr.value(i));
        }
    }
    Arc::new(builder.finish()) as ArrayRef
}

pub(crate) fn cast_text_to_type(
    array: &ArrayRef,
    target_type: &DataType,
) -> Result<ArrayRef, String> {
    if array.data_type() == target_type {
        return Ok(array.clone());
    }
    let arr = array
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| "failed to downcast to StringArray".to_string())?;

    match target_type {
        DataType::Boolean => Ok(cast_utf8_to_boolean_array(arr)),
        _ => {
            let normalized = blank_to_null(arr);
            // arrow's default cast options are safe: unparseable rows become null.
            cast(normalized.as_ref(), target_type).map_err(|e| {
                format!(
                    "CAST failed: from {:?} to {:?}: {}",
                    array.data_type(),
                    target_type,
                    e
                )
            })
        }
    }
}
