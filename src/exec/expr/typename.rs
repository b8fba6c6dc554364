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
use crate::common::largeint;
use arrow::datatypes::{DataType, TimeUnit};

/// DECIMAL without explicit precision/scale resolves to the engine's
/// widest default decimal.
pub const DEFAULT_DECIMAL_PRECISION: u8 = 38;
pub const DEFAULT_DECIMAL_SCALE: u8 = 9;

pub const MAX_DECIMAL_PRECISION: u8 = 38;

/// Resolve a SQL type name (case insensitive) to the engine's DataType.
///
/// Numeric names match the engine's catalog spelling; both `UTINYINT` and
/// `TINYINT UNSIGNED` style spellings are accepted for unsigned widths.
pub fn resolve_type_name(name: &str) -> Result<DataType, String> {
    let normalized = normalize(name);
    if let Some(rest) = normalized
        .strip_prefix("DECIMAL")
        .or_else(|| normalized.strip_prefix("NUMERIC"))
    {
        return resolve_decimal(rest.trim(), &normalized);
    }

    match normalized.as_str() {
        "BOOLEAN" | "BOOL" => Ok(DataType::Boolean),
        "TINYINT" => Ok(DataType::Int8),
        "SMALLINT" => Ok(DataType::Int16),
        "INT" | "INTEGER" => Ok(DataType::Int32),
        "BIGINT" => Ok(DataType::Int64),
        "LARGEINT" | "HUGEINT" => Ok(largeint::largeint_data_type()),
        "UTINYINT" | "TINYINT UNSIGNED" => Ok(DataType::UInt8),
        "USMALLINT" | "SMALLINT UNSIGNED" => Ok(DataType::UInt16),
        "UINTEGER" | "UINT" | "INT UNSIGNED" | "INTEGER UNSIGNED" => Ok(DataType::UInt32),
        "UBIGINT" | "BIGINT UNSIGNED" => Ok(DataType::UInt64),
        "FLOAT" | "REAL" => Ok(DataType::Float32),
        "DOUBLE" => Ok(DataType::Float64),
        "DATE" => Ok(DataType::Date32),
        "DATETIME" | "TIMESTAMP" => Ok(DataType::Timestamp(TimeUnit::Microsecond, None)),
        "VARCHAR" | "STRING" | "TEXT" => Ok(DataType::Utf8),
        other => Err(format!("unrecognized type name '{}'", other)),
    }
}

fn normalize(name: &str) -> String {
    name.trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}

fn resolve_decimal(args: &str, full_name: &str) -> Result<DataType, String> {
    if args.is_empty() {
        return Ok(DataType::Decimal128(
            DEFAULT_DECIMAL_PRECISION,
            DEFAULT_DECIMAL_SCALE as i8,
        ));
    }
    let inner = args
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| format!("malformed decimal type name '{}'", full_name))?;

    let mut parts = inner.split(',').map(str::trim);
    let precision = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("malformed decimal type name '{}'", full_name))?
        .parse::<u8>()
        .map_err(|_| format!("invalid decimal precision in '{}'", full_name))?;
    let scale = match parts.next() {
        Some(s) => s
            .parse::<u8>()
            .map_err(|_| format!("invalid decimal scale in '{}'", full_name))?,
        None => 0,
    };
    if parts.next().is_some() {
        return Err(format!("malformed decimal type name '{}'", full_name));
    }
    if precision == 0 || precision > MAX_DECIMAL_PRECISION {
        return Err(format!(
            "decimal precision must be between 1 and {}, got {}",
            MAX_DECIMAL_PRECISION, precision
        ));
    }
    if scale > precision {
        return Err(format!(
            "decimal scale {} exceeds precision {}",
            scale, precision
        ));
    }
    Ok(DataType::Decimal128(precision, scale as i8))
}
