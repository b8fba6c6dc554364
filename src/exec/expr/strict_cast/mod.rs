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

//! `try_cast_strict(value, type[, decimal_separator])`: cast text to a
//! numeric type row by row, producing NULL instead of an error for any row
//! that does not represent the target value exactly.
//!
//! Integer and fixed-point decimal targets go through the strict digit
//! accumulator; every other supported target falls back to the generic
//! text cast, which already nulls unparsable rows.
mod accumulator;

use crate::common::largeint;
use crate::common::logging::{debug, error};
use crate::exec::chunk::Chunk;
use arrow::array::{
    Array, ArrayRef, Decimal128Array, Int8Array, Int16Array, Int32Array, Int64Array, StringArray,
    UInt8Array, UInt16Array, UInt32Array, UInt64Array,
};
use arrow::datatypes::DataType;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

use self::accumulator::{
    DecimalNative, DecimalStrict, IntegerStrict, StrictNative, parse_numeric,
};
use super::typename;
use super::{ExprArena, ExprId, ExprNode, LiteralValue};

/// Everything `eval` needs to run one strict cast, resolved once at bind
/// time. `precision` and `scale` are only meaningful for decimal targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastSpec {
    pub target: DataType,
    pub precision: u8,
    pub scale: u8,
    pub separator: char,
}

/// Targets with an enumerated strict implementation, keyed by physical
/// storage width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum StrictKind {
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Decimal16,
    Decimal32,
    Decimal64,
    Decimal128,
}

#[derive(Debug)]
enum Dispatch {
    Strict(StrictKind),
    Fallback,
}

/// Route a bound target type to its strict implementation, or to the
/// generic cast for types without one. A target that belongs to the strict
/// family but carries an uncovered physical width is a hard error, never a
/// silent fallback.
fn classify_target(target: &DataType) -> Result<Dispatch, String> {
    let kind = match target {
        DataType::Int8 => StrictKind::Int8,
        DataType::Int16 => StrictKind::Int16,
        DataType::Int32 => StrictKind::Int32,
        DataType::Int64 => StrictKind::Int64,
        DataType::UInt8 => StrictKind::UInt8,
        DataType::UInt16 => StrictKind::UInt16,
        DataType::UInt32 => StrictKind::UInt32,
        DataType::UInt64 => StrictKind::UInt64,
        DataType::FixedSizeBinary(w) if *w == largeint::LARGEINT_BYTE_WIDTH => StrictKind::Int128,
        DataType::Decimal128(p, _) => decimal_kind_for_precision(*p)?,
        DataType::Decimal256(p, _) => {
            return Err(format!(
                "try_cast_strict has no strict implementation for DECIMAL256({}, _)",
                p
            ));
        }
        _ => return Ok(Dispatch::Fallback),
    };
    Ok(Dispatch::Strict(kind))
}

fn decimal_kind_for_precision(precision: u8) -> Result<StrictKind, String> {
    match precision {
        1..=4 => Ok(StrictKind::Decimal16),
        5..=9 => Ok(StrictKind::Decimal32),
        10..=18 => Ok(StrictKind::Decimal64),
        19..=38 => Ok(StrictKind::Decimal128),
        _ => Err(format!(
            "DECIMAL precision {} maps to no physical storage width",
            precision
        )),
    }
}

/// Native integer widths that know how to build their arrow array.
trait IntoIntegerArray: Sized {
    fn into_array(values: Vec<Option<Self>>) -> ArrayRef;
}

macro_rules! impl_into_integer_array {
    ($($t:ty => $arr:ty),* $(,)?) => {$(
        impl IntoIntegerArray for $t {
            fn into_array(values: Vec<Option<Self>>) -> ArrayRef {
                Arc::new(<$arr>::from(values))
            }
        }
    )*};
}

impl_into_integer_array!(
    i8 => Int8Array,
    i16 => Int16Array,
    i32 => Int32Array,
    i64 => Int64Array,
    u8 => UInt8Array,
    u16 => UInt16Array,
    u32 => UInt32Array,
    u64 => UInt64Array,
);

fn cast_strict_to_integer<T, const SEP: u8>(
    array: &StringArray,
    _spec: &CastSpec,
) -> Result<ArrayRef, String>
where
    T: StrictNative + IntoIntegerArray,
{
    let mut values: Vec<Option<T>> = Vec::with_capacity(array.len());
    for row in 0..array.len() {
        if array.is_null(row) {
            values.push(None);
            continue;
        }
        let mut policy = IntegerStrict;
        values.push(parse_numeric::<T, _, SEP>(
            array.value(row).as_bytes(),
            &mut policy,
        ));
    }
    Ok(T::into_array(values))
}

fn cast_strict_to_largeint<const SEP: u8>(
    array: &StringArray,
    _spec: &CastSpec,
) -> Result<ArrayRef, String> {
    let mut values: Vec<Option<i128>> = Vec::with_capacity(array.len());
    for row in 0..array.len() {
        if array.is_null(row) {
            values.push(None);
            continue;
        }
        let mut policy = IntegerStrict;
        values.push(parse_numeric::<i128, _, SEP>(
            array.value(row).as_bytes(),
            &mut policy,
        ));
    }
    largeint::array_from_i128(&values)
}

/// Parse at the physical width selected by the declared precision, then
/// widen into the Decimal128 storage array.
fn cast_strict_to_decimal<T, const SEP: u8>(
    array: &StringArray,
    spec: &CastSpec,
) -> Result<ArrayRef, String>
where
    T: DecimalNative + Into<i128>,
{
    let limit = T::pow10(spec.precision).ok_or_else(|| {
        format!(
            "DECIMAL precision {} overflows its physical storage width",
            spec.precision
        )
    })?;
    let mut values: Vec<Option<i128>> = Vec::with_capacity(array.len());
    for row in 0..array.len() {
        if array.is_null(row) {
            values.push(None);
            continue;
        }
        let mut policy = DecimalStrict::<T>::new(spec.scale, limit);
        values.push(
            parse_numeric::<T, _, SEP>(array.value(row).as_bytes(), &mut policy).map(Into::into),
        );
    }
    let out = Decimal128Array::from(values)
        .with_precision_and_scale(spec.precision, spec.scale as i8)
        .map_err(|e| e.to_string())?;
    Ok(Arc::new(out))
}

type StrictCastFn = fn(&StringArray, &CastSpec) -> Result<ArrayRef, String>;

/// Dispatch table over (strict kind, separator byte). Separator handling is
/// compiled in through the const parameter, so the per-row loop never
/// branches on it.
static STRICT_CAST_TABLE: Lazy<HashMap<(StrictKind, u8), StrictCastFn>> = Lazy::new(|| {
    let mut m: HashMap<(StrictKind, u8), StrictCastFn> = HashMap::new();

    m.insert((StrictKind::Int8, b'.'), cast_strict_to_integer::<i8, b'.'>);
    m.insert((StrictKind::Int8, b','), cast_strict_to_integer::<i8, b','>);
    m.insert(
        (StrictKind::Int16, b'.'),
        cast_strict_to_integer::<i16, b'.'>,
    );
    m.insert(
        (StrictKind::Int16, b','),
        cast_strict_to_integer::<i16, b','>,
    );
    m.insert(
        (StrictKind::Int32, b'.'),
        cast_strict_to_integer::<i32, b'.'>,
    );
    m.insert(
        (StrictKind::Int32, b','),
        cast_strict_to_integer::<i32, b','>,
    );
    m.insert(
        (StrictKind::Int64, b'.'),
        cast_strict_to_integer::<i64, b'.'>,
    );
    m.insert(
        (StrictKind::Int64, b','),
        cast_strict_to_integer::<i64, b','>,
    );
    m.insert((StrictKind::Int128, b'.'), cast_strict_to_largeint::<b'.'>);
    m.insert((StrictKind::Int128, b','), cast_strict_to_largeint::<b','>);
    m.insert((StrictKind::UInt8, b'.'), cast_strict_to_integer::<u8, b'.'>);
    m.insert((StrictKind::UInt8, b','), cast_strict_to_integer::<u8, b','>);
    m.insert(
        (StrictKind::UInt16, b'.'),
        cast_strict_to_integer::<u16, b'.'>,
    );
    m.insert(
        (StrictKind::UInt16, b','),
        cast_strict_to_integer::<u16, b','>,
    );
    m.insert(
        (StrictKind::UInt32, b'.'),
        cast_strict_to_integer::<u32, b'.'>,
    );
    m.insert(
        (StrictKind::UInt32, b','),
        cast_strict_to_integer::<u32, b','>,
    );
    m.insert(
        (StrictKind::UInt64, b'.'),
        cast_strict_to_integer::<u64, b'.'>,
    );
    m.insert(
        (StrictKind::UInt64, b','),
        cast_strict_to_integer::<u64, b','>,
    );
    m.insert(
        (StrictKind::Decimal16, b'.'),
        cast_strict_to_decimal::<i16, b'.'>,
    );
    m.insert(
        (StrictKind::Decimal16, b','),
        cast_strict_to_decimal::<i16, b','>,
    );
    m.insert(
        (StrictKind::Decimal32, b'.'),
        cast_strict_to_decimal::<i32, b'.'>,
    );
    m.insert(
        (StrictKind::Decimal32, b','),
        cast_strict_to_decimal::<i32, b','>,
    );
    m.insert(
        (StrictKind::Decimal64, b'.'),
        cast_strict_to_decimal::<i64, b'.'>,
    );
    m.insert(
        (StrictKind::Decimal64, b','),
        cast_strict_to_decimal::<i64, b','>,
    );
    m.insert(
        (StrictKind::Decimal128, b'.'),
        cast_strict_to_decimal::<i128, b'.'>,
    );
    m.insert(
        (StrictKind::Decimal128, b','),
        cast_strict_to_decimal::<i128, b','>,
    );

    m
});

/// Evaluate one bound `try_cast_strict` over a chunk.
pub(crate) fn eval(
    arena: &ExprArena,
    value: ExprId,
    spec: &CastSpec,
    chunk: &Chunk,
) -> Result<ArrayRef, String> {
    let input = arena.eval(value, chunk)?;
    let dispatch = classify_target(&spec.target).inspect_err(|e| error!("{e}"))?;
    match dispatch {
        Dispatch::Strict(kind) => {
            let array = input
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| "failed to downcast to StringArray".to_string())?;
            let cast_fn = STRICT_CAST_TABLE
                .get(&(kind, spec.separator as u8))
                .copied()
                .ok_or_else(|| {
                    let msg = format!(
                        "strict cast dispatch table has no entry for {:?} with separator '{}'",
                        kind, spec.separator
                    );
                    error!("{msg}");
                    msg
                })?;
            cast_fn(array, spec)
        }
        Dispatch::Fallback => super::cast_text_to_target(&input, &spec.target),
    }
}

fn constant_utf8_argument(arena: &ExprArena, id: ExprId) -> Option<String> {
    match arena.node(id)? {
        ExprNode::Literal(LiteralValue::Utf8(s)) => Some(s.clone()),
        _ => None,
    }
}

/// Bind `try_cast_strict(value, type[, decimal_separator])`. The type name
/// and separator must be constant strings; everything about them is
/// validated here so `eval` runs no per-batch argument checks.
pub fn bind_try_cast_strict(arena: &mut ExprArena, args: &[ExprId]) -> Result<ExprId, String> {
    if args.len() != 2 && args.len() != 3 {
        return Err(
            "try_cast_strict requires two or three arguments: (value, type[, decimal_separator])"
                .to_string(),
        );
    }

    let type_name = constant_utf8_argument(arena, args[1]).ok_or_else(|| {
        "the 'type' argument of try_cast_strict must be a constant string, e.g. 'INTEGER'"
            .to_string()
    })?;

    let separator = if args.len() == 3 {
        let raw = constant_utf8_argument(arena, args[2]).ok_or_else(|| {
            "the 'decimal_separator' argument of try_cast_strict must be a constant string"
                .to_string()
        })?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c @ ('.' | ',')), None) => c,
            _ => {
                return Err(format!(
                    "invalid decimal separator '{}': must be '.' or ','",
                    raw
                ));
            }
        }
    } else {
        '.'
    };

    let target = typename::resolve_type_name(&type_name)?;
    // Surface an uncovered physical width at bind time rather than on the
    // first chunk.
    classify_target(&target)?;

    let (precision, scale) = match &target {
        DataType::Decimal128(p, s) => (*p, *s as u8),
        _ => (0, 0),
    };
    debug!(
        type_name = %type_name,
        separator = %separator,
        "bound try_cast_strict"
    );
    let spec = Arc::new(CastSpec {
        target: target.clone(),
        precision,
        scale,
        separator,
    });
    Ok(arena.push_typed(ExprNode::TryCastStrict { value: args[0], spec }, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ids::SlotId;

    const ALL_STRICT_KINDS: [StrictKind; 13] = [
        StrictKind::Int8,
        StrictKind::Int16,
        StrictKind::Int32,
        StrictKind::Int64,
        StrictKind::Int128,
        StrictKind::UInt8,
        StrictKind::UInt16,
        StrictKind::UInt32,
        StrictKind::UInt64,
        StrictKind::Decimal16,
        StrictKind::Decimal32,
        StrictKind::Decimal64,
        StrictKind::Decimal128,
    ];

    fn utf8_literal(arena: &mut ExprArena, s: &str) -> ExprId {
        arena.push_typed(
            ExprNode::Literal(LiteralValue::Utf8(s.to_string())),
            DataType::Utf8,
        )
    }

    #[test]
    fn dispatch_table_covers_every_kind_and_separator() {
        for kind in ALL_STRICT_KINDS {
            for sep in [b'.', b','] {
                assert!(
                    STRICT_CAST_TABLE.contains_key(&(kind, sep)),
                    "missing entry for {:?} '{}'",
                    kind,
                    sep as char
                );
            }
        }
        assert_eq!(STRICT_CAST_TABLE.len(), ALL_STRICT_KINDS.len() * 2);
    }

    #[test]
    fn classify_routes_by_decimal_precision() {
        for (precision, kind) in [
            (1, StrictKind::Decimal16),
            (4, StrictKind::Decimal16),
            (5, StrictKind::Decimal32),
            (9, StrictKind::Decimal32),
            (10, StrictKind::Decimal64),
            (18, StrictKind::Decimal64),
            (19, StrictKind::Decimal128),
            (38, StrictKind::Decimal128),
        ] {
            match classify_target(&DataType::Decimal128(precision, 0)).unwrap() {
                Dispatch::Strict(k) => assert_eq!(k, kind, "precision {}", precision),
                Dispatch::Fallback => panic!("precision {} fell back", precision),
            }
        }
    }

    #[test]
    fn classify_rejects_uncovered_widths() {
        let err = classify_target(&DataType::Decimal256(50, 0)).expect_err("expected error");
        assert!(err.contains("DECIMAL256"), "err={}", err);
    }

    #[test]
    fn classify_falls_back_for_non_enumerated_types() {
        for dt in [
            DataType::Float64,
            DataType::Boolean,
            DataType::Date32,
            DataType::Utf8,
        ] {
            assert!(matches!(classify_target(&dt).unwrap(), Dispatch::Fallback));
        }
    }

    #[test]
    fn bind_rejects_wrong_arity() {
        let mut arena = ExprArena::default();
        let v = utf8_literal(&mut arena, "1");
        let err = bind_try_cast_strict(&mut arena, &[v]).expect_err("expected bind error");
        assert!(err.contains("two or three arguments"), "err={}", err);
    }

    #[test]
    fn bind_rejects_non_constant_type_argument() {
        let mut arena = ExprArena::default();
        let v = utf8_literal(&mut arena, "1");
        let ty = arena.push_typed(ExprNode::SlotRef(SlotId(9)), DataType::Utf8);
        let err = bind_try_cast_strict(&mut arena, &[v, ty]).expect_err("expected bind error");
        assert!(err.contains("constant string"), "err={}", err);
    }

    #[test]
    fn bind_rejects_unknown_type_name() {
        let mut arena = ExprArena::default();
        let v = utf8_literal(&mut arena, "1");
        let ty = utf8_literal(&mut arena, "QUADFLOAT");
        let err = bind_try_cast_strict(&mut arena, &[v, ty]).expect_err("expected bind error");
        assert!(err.contains("QUADFLOAT"), "err={}", err);
    }

    #[test]
    fn bind_validates_separator() {
        let mut arena = ExprArena::default();
        let v = utf8_literal(&mut arena, "1");
        let ty = utf8_literal(&mut arena, "INTEGER");
        for bad in [";", "..", "", "x"] {
            let sep = utf8_literal(&mut arena, bad);
            let err =
                bind_try_cast_strict(&mut arena, &[v, ty, sep]).expect_err("expected bind error");
            assert!(err.contains("decimal separator"), "sep={:?} err={}", bad, err);
        }
        let sep = utf8_literal(&mut arena, ",");
        let expr = bind_try_cast_strict(&mut arena, &[v, ty, sep]).unwrap();
        match arena.node(expr).unwrap() {
            ExprNode::TryCastStrict { spec, .. } => assert_eq!(spec.separator, ','),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn bind_records_decimal_precision_and_scale() {
        let mut arena = ExprArena::default();
        let v = utf8_literal(&mut arena, "1.23");
        let ty = utf8_literal(&mut arena, "DECIMAL(7, 2)");
        let expr = bind_try_cast_strict(&mut arena, &[v, ty]).unwrap();
        assert_eq!(arena.data_type(expr), Some(&DataType::Decimal128(7, 2)));
        match arena.node(expr).unwrap() {
            ExprNode::TryCastStrict { spec, .. } => {
                assert_eq!(spec.precision, 7);
                assert_eq!(spec.scale, 2);
                assert_eq!(spec.separator, '.');
            }
            other => panic!("unexpected node {:?}", other),
        }
    }
}
