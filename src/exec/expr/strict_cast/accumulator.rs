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

//! Shared digit accumulator for strict numeric text parsing.
//!
//! The scanner itself carries no strictness opinion: it is a bare decimal
//! text parser with an injectable fractional-digit policy. The two policies
//! ([`IntegerStrict`], [`DecimalStrict`]) decide what happens to digits after
//! the decimal separator and whether the finished parse is acceptable.
use std::cmp::min;

/// Native accumulation operations at one physical storage width.
pub(crate) trait StrictNative: Copy {
    const ZERO: Self;
    fn is_zero(self) -> bool;
    fn checked_mul10_add(self, digit: u8) -> Option<Self>;
    fn checked_mul10_sub(self, digit: u8) -> Option<Self>;
    fn checked_mul10(self) -> Option<Self>;
    /// Exact division by ten; `None` when a nonzero digit would be discarded.
    fn div10_exact(self) -> Option<Self>;
}

macro_rules! impl_strict_native {
    ($($t:ty),* $(,)?) => {$(
        impl StrictNative for $t {
            const ZERO: Self = 0;

            fn is_zero(self) -> bool {
                self == 0
            }

            fn checked_mul10_add(self, digit: u8) -> Option<Self> {
                self.checked_mul(10)?.checked_add(digit as $t)
            }

            fn checked_mul10_sub(self, digit: u8) -> Option<Self> {
                self.checked_mul(10)?.checked_sub(digit as $t)
            }

            fn checked_mul10(self) -> Option<Self> {
                self.checked_mul(10)
            }

            fn div10_exact(self) -> Option<Self> {
                if self % 10 == 0 { Some(self / 10) } else { None }
            }
        }
    )*};
}

impl_strict_native!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

/// Physical widths that can back a fixed-point decimal.
pub(crate) trait DecimalNative: StrictNative + PartialOrd + std::ops::Neg<Output = Self> {
    /// 10^exp, `None` when it exceeds the physical width.
    fn pow10(exp: u8) -> Option<Self>;
}

macro_rules! impl_decimal_native {
    ($($t:ty),* $(,)?) => {$(
        impl DecimalNative for $t {
            fn pow10(exp: u8) -> Option<Self> {
                let mut out: $t = 1;
                for _ in 0..exp {
                    out = out.checked_mul(10)?;
                }
                Some(out)
            }
        }
    )*};
}

impl_decimal_native!(i16, i32, i64, i128);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Sign {
    Positive,
    Negative,
}

/// Per-row parse state. Created fresh on the stack for every value and
/// discarded as soon as the row's result is known.
pub(crate) struct NumericParse<T> {
    pub sign: Sign,
    pub magnitude: T,
    /// All mantissa digits seen, integer and fractional; zero means the
    /// input held no number at all.
    pub digit_count: u32,
    pub exponent: i64,
}

impl<T: StrictNative> NumericParse<T> {
    fn new() -> Self {
        Self {
            sign: Sign::Positive,
            magnitude: T::ZERO,
            digit_count: 0,
            exponent: 0,
        }
    }

    /// Fold one mantissa digit into the magnitude. Negative values
    /// accumulate downward so the signed minimum stays representable.
    fn push_digit(&mut self, digit: u8) -> bool {
        let next = match self.sign {
            Sign::Positive => self.magnitude.checked_mul10_add(digit),
            Sign::Negative => self.magnitude.checked_mul10_sub(digit),
        };
        match next {
            Some(v) => {
                self.magnitude = v;
                self.digit_count += 1;
                true
            }
            None => false,
        }
    }

    /// Record a mantissa digit that is absorbed without touching the
    /// magnitude (an insignificant zero, or a counted-only excess digit).
    fn count_digit(&mut self) {
        self.digit_count += 1;
    }
}

/// Strictness strategy plugged into the shared scanner, selected once per
/// cast call site.
pub(crate) trait FractionPolicy<T: StrictNative> {
    /// Handle one digit after the decimal separator; returning false rejects
    /// the row.
    fn handle_fractional_digit(&mut self, state: &mut NumericParse<T>, digit: u8) -> bool;

    /// Exact scaling once the whole mantissa and exponent are known.
    fn finalize(&self, state: &mut NumericParse<T>) -> bool;

    /// Acceptance gate evaluated after a successful scan.
    fn accept(&self, state: &NumericParse<T>) -> bool;
}

/// Multiply or exact-divide the magnitude by 10^|shift|. Negative shifts
/// reject any value whose shifted-off digits are not all zero.
fn shift_by_pow10<T: StrictNative>(state: &mut NumericParse<T>, shift: i64) -> bool {
    if shift >= 0 {
        for _ in 0..shift {
            if state.magnitude.is_zero() {
                break;
            }
            match state.magnitude.checked_mul10() {
                Some(v) => state.magnitude = v,
                None => return false,
            }
        }
    } else {
        for _ in 0..shift.unsigned_abs() {
            if state.magnitude.is_zero() {
                break;
            }
            match state.magnitude.div10_exact() {
                Some(v) => state.magnitude = v,
                None => return false,
            }
        }
    }
    true
}

/// Integer strictness: zero fractional digits are absorbed ("5.00" is 5);
/// the first nonzero fractional digit fails the row.
pub(crate) struct IntegerStrict;

impl<T: StrictNative> FractionPolicy<T> for IntegerStrict {
    fn handle_fractional_digit(&mut self, state: &mut NumericParse<T>, digit: u8) -> bool {
        if digit == 0 {
            state.count_digit();
            true
        } else {
            false
        }
    }

    fn finalize(&self, state: &mut NumericParse<T>) -> bool {
        let exponent = state.exponent;
        shift_by_pow10(state, exponent)
    }

    fn accept(&self, _state: &NumericParse<T>) -> bool {
        true
    }
}

/// Decimal strictness: fractional digits beyond the target scale are never
/// incorporated into the magnitude, only counted; the row is accepted when
/// every excess digit is a trailing zero.
pub(crate) struct DecimalStrict<T> {
    scale: u8,
    /// 10^precision at the physical width; the final unscaled magnitude must
    /// be strictly inside (-limit, limit).
    limit: T,
    decimal_count: u32,
    excessive_decimals: u32,
    trailing_decimal_zeros: u32,
}

impl<T: DecimalNative> DecimalStrict<T> {
    pub(crate) fn new(scale: u8, limit: T) -> Self {
        Self {
            scale,
            limit,
            decimal_count: 0,
            excessive_decimals: 0,
            trailing_decimal_zeros: 0,
        }
    }
}

impl<T: DecimalNative> FractionPolicy<T> for DecimalStrict<T> {
    fn handle_fractional_digit(&mut self, state: &mut NumericParse<T>, digit: u8) -> bool {
        if digit == 0 {
            self.trailing_decimal_zeros += 1;
        } else {
            self.trailing_decimal_zeros = 0;
        }
        if self.decimal_count >= self.scale as u32 {
            self.excessive_decimals += 1;
            self.decimal_count += 1;
            state.count_digit();
            return true;
        }
        if !state.push_digit(digit) {
            return false;
        }
        self.decimal_count += 1;
        true
    }

    fn finalize(&self, state: &mut NumericParse<T>) -> bool {
        let incorporated = min(self.decimal_count, self.scale as u32) as i64;
        let shift = self.scale as i64 - incorporated + state.exponent;
        if !shift_by_pow10(state, shift) {
            return false;
        }
        state.magnitude > -self.limit && state.magnitude < self.limit
    }

    fn accept(&self, _state: &NumericParse<T>) -> bool {
        self.excessive_decimals <= self.trailing_decimal_zeros
    }
}

/// Scan one text value left to right and produce its exact magnitude, or
/// `None` when the row must become null.
///
/// `SEP` is the configured decimal separator; the other separator character
/// is ordinary invalid input, so the same text can never silently parse
/// under a mismatched separator.
pub(crate) fn parse_numeric<T, P, const SEP: u8>(input: &[u8], policy: &mut P) -> Option<T>
where
    T: StrictNative,
    P: FractionPolicy<T>,
{
    let bytes = input.trim_ascii();
    let len = bytes.len();
    let mut state = NumericParse::<T>::new();
    let mut pos = 0;

    if pos < len && (bytes[pos] == b'+' || bytes[pos] == b'-') {
        if bytes[pos] == b'-' {
            state.sign = Sign::Negative;
        }
        pos += 1;
    }

    while pos < len && bytes[pos].is_ascii_digit() {
        if !state.push_digit(bytes[pos] - b'0') {
            return None;
        }
        pos += 1;
    }

    if pos < len && bytes[pos] == SEP {
        pos += 1;
        while pos < len && bytes[pos].is_ascii_digit() {
            if !policy.handle_fractional_digit(&mut state, bytes[pos] - b'0') {
                return None;
            }
            pos += 1;
        }
    }

    if pos < len && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        if state.digit_count == 0 {
            return None;
        }
        pos += 1;
        let mut negative_exponent = false;
        if pos < len && (bytes[pos] == b'+' || bytes[pos] == b'-') {
            negative_exponent = bytes[pos] == b'-';
            pos += 1;
        }
        let mut value: i64 = 0;
        let mut exponent_digits = 0u32;
        while pos < len && bytes[pos].is_ascii_digit() {
            value = value
                .checked_mul(10)?
                .checked_add((bytes[pos] - b'0') as i64)?;
            exponent_digits += 1;
            pos += 1;
        }
        if exponent_digits == 0 {
            return None;
        }
        state.exponent = if negative_exponent { -value } else { value };
    }

    // A second sign, a second separator, or any other residue fails here.
    if pos != len || state.digit_count == 0 {
        return None;
    }
    if !policy.finalize(&mut state) {
        return None;
    }
    if !policy.accept(&state) {
        return None;
    }
    Some(state.magnitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_int<T: StrictNative>(input: &str) -> Option<T> {
        let mut policy = IntegerStrict;
        parse_numeric::<T, _, b'.'>(input.as_bytes(), &mut policy)
    }

    fn parse_int_comma<T: StrictNative>(input: &str) -> Option<T> {
        let mut policy = IntegerStrict;
        parse_numeric::<T, _, b','>(input.as_bytes(), &mut policy)
    }

    fn parse_dec<T: DecimalNative>(input: &str, precision: u8, scale: u8) -> Option<T> {
        let limit = T::pow10(precision).expect("limit fits physical width");
        let mut policy = DecimalStrict::<T>::new(scale, limit);
        parse_numeric::<T, _, b'.'>(input.as_bytes(), &mut policy)
    }

    fn parse_dec_comma<T: DecimalNative>(input: &str, precision: u8, scale: u8) -> Option<T> {
        let limit = T::pow10(precision).expect("limit fits physical width");
        let mut policy = DecimalStrict::<T>::new(scale, limit);
        parse_numeric::<T, _, b','>(input.as_bytes(), &mut policy)
    }

    #[test]
    fn integer_basic_forms() {
        assert_eq!(parse_int::<i32>("123"), Some(123));
        assert_eq!(parse_int::<i32>("+123"), Some(123));
        assert_eq!(parse_int::<i32>("-123"), Some(-123));
        assert_eq!(parse_int::<i32>("0"), Some(0));
        assert_eq!(parse_int::<i32>("  42 "), Some(42));
        assert_eq!(parse_int::<i32>("007"), Some(7));
    }

    #[test]
    fn integer_rejects_malformed_input() {
        assert_eq!(parse_int::<i32>(""), None);
        assert_eq!(parse_int::<i32>("   "), None);
        assert_eq!(parse_int::<i32>("+"), None);
        assert_eq!(parse_int::<i32>("-"), None);
        assert_eq!(parse_int::<i32>("--1"), None);
        assert_eq!(parse_int::<i32>("1-"), None);
        assert_eq!(parse_int::<i32>("12a"), None);
        assert_eq!(parse_int::<i32>("1 2"), None);
        assert_eq!(parse_int::<i32>("1.2.3"), None);
        assert_eq!(parse_int::<i32>("."), None);
        assert_eq!(parse_int::<i32>("e5"), None);
    }

    #[test]
    fn integer_absorbs_zero_fraction_only() {
        assert_eq!(parse_int::<i32>("123.00"), Some(123));
        assert_eq!(parse_int::<i32>("123."), Some(123));
        assert_eq!(parse_int::<i32>("5.000000"), Some(5));
        assert_eq!(parse_int::<i32>("-7.0"), Some(-7));
        assert_eq!(parse_int::<i32>("123.01"), None);
        assert_eq!(parse_int::<i32>("123.1"), None);
        assert_eq!(parse_int::<i32>("0.5"), None);
    }

    #[test]
    fn integer_width_limits() {
        assert_eq!(parse_int::<i8>("127"), Some(127));
        assert_eq!(parse_int::<i8>("128"), None);
        assert_eq!(parse_int::<i8>("-128"), Some(-128));
        assert_eq!(parse_int::<i8>("-129"), None);
        assert_eq!(parse_int::<u8>("255"), Some(255));
        assert_eq!(parse_int::<u8>("256"), None);
        assert_eq!(parse_int::<u8>("-0"), Some(0));
        assert_eq!(parse_int::<u8>("-1"), None);
        assert_eq!(parse_int::<i64>("9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_int::<i64>("9223372036854775808"), None);
        assert_eq!(
            parse_int::<i128>("170141183460469231731687303715884105727"),
            Some(i128::MAX)
        );
    }

    #[test]
    fn integer_exponent_is_exact_scaling() {
        assert_eq!(parse_int::<i32>("12e2"), Some(1200));
        assert_eq!(parse_int::<i32>("12E+2"), Some(1200));
        assert_eq!(parse_int::<i32>("1500e-2"), Some(15));
        assert_eq!(parse_int::<i32>("15e-1"), None);
        assert_eq!(parse_int::<i32>("5.0e1"), Some(50));
        assert_eq!(parse_int::<i32>("0e999999999"), Some(0));
        assert_eq!(parse_int::<i32>("1e999999999999999999999"), None);
        assert_eq!(parse_int::<i32>("1e"), None);
        assert_eq!(parse_int::<i32>("1e+"), None);
        assert_eq!(parse_int::<i32>("2e9"), Some(2_000_000_000));
        assert_eq!(parse_int::<i32>("3e9"), None);
        assert_eq!(parse_int::<i64>("3e9"), Some(3_000_000_000));
    }

    #[test]
    fn decimal_pads_to_scale() {
        assert_eq!(parse_dec::<i32>("1.23", 5, 2), Some(123));
        assert_eq!(parse_dec::<i32>("1.2", 5, 2), Some(120));
        assert_eq!(parse_dec::<i32>("1", 5, 2), Some(100));
        assert_eq!(parse_dec::<i32>(".5", 5, 2), Some(50));
        assert_eq!(parse_dec::<i32>("-1.23", 5, 2), Some(-123));
        assert_eq!(parse_dec::<i32>("0.00", 5, 2), Some(0));
    }

    #[test]
    fn decimal_absorbs_trailing_zeros_beyond_scale() {
        assert_eq!(parse_dec::<i32>("1.230", 5, 2), Some(123));
        assert_eq!(parse_dec::<i32>("1.200", 5, 2), Some(120));
        assert_eq!(parse_dec::<i32>("1.23000000", 5, 2), Some(123));
        assert_eq!(parse_dec::<i32>("1.231", 5, 2), None);
        assert_eq!(parse_dec::<i32>("1.2301", 5, 2), None);
        // A nonzero digit anywhere in the excess tail makes the zeros after
        // it irrelevant.
        assert_eq!(parse_dec::<i32>("1.3050", 5, 2), None);
        assert_eq!(parse_dec::<i32>("1.0300", 5, 2), Some(103));
    }

    #[test]
    fn decimal_overflow_against_limit() {
        assert_eq!(parse_dec::<i32>("999.99", 5, 2), Some(99999));
        assert_eq!(parse_dec::<i32>("1000.00", 5, 2), None);
        assert_eq!(parse_dec::<i32>("-999.99", 5, 2), Some(-99999));
        assert_eq!(parse_dec::<i32>("-1000.00", 5, 2), None);
        assert_eq!(parse_dec::<i16>("99999", 4, 0), None);
        assert_eq!(parse_dec::<i16>("9999", 4, 0), Some(9999));
        // Overflow beats the trailing-zero rule.
        assert_eq!(parse_dec::<i32>("1000.000", 5, 2), None);
    }

    #[test]
    fn decimal_scale_zero_behaves_like_integer() {
        assert_eq!(parse_dec::<i16>("7.0", 4, 0), Some(7));
        assert_eq!(parse_dec::<i16>("7.5", 4, 0), None);
    }

    #[test]
    fn decimal_exponent_is_exact_scaling() {
        assert_eq!(parse_dec::<i32>("1.2e1", 5, 2), Some(1200));
        assert_eq!(parse_dec::<i32>("123400e-4", 5, 2), Some(1234));
        assert_eq!(parse_dec::<i32>("123450e-4", 5, 2), None);
        assert_eq!(parse_dec::<i32>("5e-2", 5, 2), Some(5));
        assert_eq!(parse_dec::<i32>("5e-3", 5, 2), None);
    }

    #[test]
    fn comma_separator_swaps_roles_with_period() {
        assert_eq!(parse_dec_comma::<i32>("1,23", 5, 2), Some(123));
        assert_eq!(parse_dec_comma::<i32>("1.23", 5, 2), None);
        assert_eq!(parse_dec::<i32>("1,23", 5, 2), None);
        assert_eq!(parse_int_comma::<i32>("5,00"), Some(5));
        assert_eq!(parse_int::<i32>("5,00"), None);
    }
}
