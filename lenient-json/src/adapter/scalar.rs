//! Coercing adapters for primitive shapes.
//!
//! Every primitive accepts several wire representations. A token that cannot
//! be coerced is reported and the target keeps its default.

use alloc::string::ToString;

use lenient_core::{ScalarType, Shape, TokenKind, Value, ValueError};
use lexical_parse_float::FromLexical as _;
use lexical_parse_integer::FromLexical as _;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::{Decoded, TypeAdapter};
use crate::{DecodeContext, DecodeError, EncodeContext, EncodeError, Token};

/// Adapter for strings, booleans, integers, floats and decimals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarAdapter;

impl TypeAdapter for ScalarAdapter {
    fn read(&self, cx: &mut DecodeContext<'_, '_>, shape: &'static Shape) -> Result<Decoded, DecodeError> {
        let Some(scalar) = shape.as_scalar() else {
            return Err(cx.custom_error(format_args!("`{shape}` is not a scalar")));
        };

        match cx.reader().peek()? {
            TokenKind::Null => {
                cx.reader().next_null()?;
                Ok(Decoded::Null)
            }
            TokenKind::String | TokenKind::Number | TokenKind::Boolean => {
                let token = cx.reader().next_token()?;
                let kind = token.kind();
                match coerce(scalar, token) {
                    Some(value) => Ok(Decoded::Value(value)),
                    None => {
                        cx.report(shape, kind);
                        Ok(Decoded::Faulted)
                    }
                }
            }
            other => {
                cx.report(shape, other);
                cx.reader().skip_value()?;
                Ok(Decoded::Faulted)
            }
        }
    }

    fn write(
        &self,
        cx: &mut EncodeContext<'_>,
        shape: &'static Shape,
        value: &Value,
    ) -> Result<(), EncodeError> {
        let writer = cx.writer();
        match value {
            Value::Null => writer.null(),
            Value::String(s) => writer.string(s),
            Value::Bool(b) => writer.bool(*b),
            Value::I32(n) => writer.i64(i64::from(*n)),
            Value::I64(n) => writer.i64(*n),
            Value::F32(f) => writer.f32(*f),
            Value::F64(f) => writer.f64(*f),
            Value::Decimal(d) => writer.decimal(d),
            other => return Err(ValueError::mismatch(shape, other).into()),
        }
        Ok(())
    }
}

/// Converts a scalar token to `scalar`, or `None` if it cannot be coerced.
pub(crate) fn coerce(scalar: ScalarType, token: Token<'_>) -> Option<Value> {
    match scalar {
        ScalarType::String => match token {
            Token::String(s) => Some(Value::String(s.into_owned())),
            Token::Number(n) => Some(Value::String(n.to_string())),
            Token::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        ScalarType::Bool => match token {
            Token::Bool(b) => Some(Value::Bool(b)),
            Token::String(s) => parse_bool(&s).map(Value::Bool),
            Token::Number(n) => f64::from_lexical(n.as_bytes())
                .ok()
                .map(|f| Value::Bool(f != 0.0)),
            _ => None,
        },
        ScalarType::I32 => integer(&token)
            .and_then(|n| i32::try_from(n).ok())
            .map(Value::I32),
        ScalarType::I64 => integer(&token).map(Value::I64),
        ScalarType::F32 => float_text(&token)
            .and_then(|text| f32::from_lexical(text.as_bytes()).ok())
            .filter(|f| f.is_finite())
            .map(Value::F32),
        ScalarType::F64 => float_text(&token)
            .and_then(|text| f64::from_lexical(text.as_bytes()).ok())
            .filter(|f| f.is_finite())
            .map(Value::F64),
        ScalarType::Decimal => float_text(&token).and_then(decimal).map(Value::Decimal),
        ScalarType::JsonObject | ScalarType::JsonArray | ScalarType::JsonValue => None,
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text == "1" || text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text == "0" || text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Numbers are truncated toward zero; strings must hold an integer literal.
fn integer(token: &Token<'_>) -> Option<i64> {
    match token {
        Token::Number(n) => i64::from_lexical(n.as_bytes())
            .ok()
            .or_else(|| decimal(n)?.trunc().to_i64()),
        Token::String(s) => i64::from_lexical(s.trim().as_bytes()).ok(),
        Token::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn float_text<'a>(token: &'a Token<'_>) -> Option<&'a str> {
    match token {
        Token::Number(n) => Some(n),
        Token::String(s) => Some(s.trim()),
        _ => None,
    }
}

/// Decimal text, plain or in scientific notation.
///
/// The scale is kept as written up to 28 fractional digits; digits past that
/// are rounded away. Values whose integer part does not fit in 96 bits
/// (about 7.9e28) cannot be represented and yield `None`.
fn decimal(text: &str) -> Option<Decimal> {
    let Some(at) = text.find(['e', 'E']) else {
        return Decimal::from_str_exact(text)
            .ok()
            .or_else(|| text.parse::<Decimal>().ok());
    };
    if let Ok(exact) = Decimal::from_scientific(text) {
        return Some(exact);
    }
    let mantissa = text[..at].parse::<Decimal>().ok()?;
    let exponent = text[at + 1..].parse::<i32>().ok()?;
    let steps = exponent.unsigned_abs().min(64);
    if exponent >= 0 {
        (0..steps).try_fold(mantissa, |d, _| d.checked_mul(Decimal::TEN))
    } else {
        (0..steps).try_fold(mantissa, |d, _| d.checked_div(Decimal::TEN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::borrow::Cow;
    use core::str::FromStr;

    fn s(text: &str) -> Token<'_> {
        Token::String(Cow::Borrowed(text))
    }

    #[test]
    fn strings_accept_every_scalar() {
        assert_eq!(coerce(ScalarType::String, s("x")), Some(Value::String("x".into())));
        assert_eq!(
            coerce(ScalarType::String, Token::Number("42")),
            Some(Value::String("42".into()))
        );
        assert_eq!(
            coerce(ScalarType::String, Token::Bool(true)),
            Some(Value::String("true".into()))
        );
    }

    #[test]
    fn booleans() {
        assert_eq!(coerce(ScalarType::Bool, s(" TRUE ")), Some(Value::Bool(true)));
        assert_eq!(coerce(ScalarType::Bool, s("0")), Some(Value::Bool(false)));
        assert_eq!(coerce(ScalarType::Bool, Token::Number("2")), Some(Value::Bool(true)));
        assert_eq!(coerce(ScalarType::Bool, Token::Number("0.0")), Some(Value::Bool(false)));
        assert_eq!(coerce(ScalarType::Bool, s("yes")), None);
    }

    #[test]
    fn integers_truncate_and_range_check() {
        assert_eq!(coerce(ScalarType::I32, Token::Number("3.9")), Some(Value::I32(3)));
        assert_eq!(coerce(ScalarType::I32, Token::Number("-3.9")), Some(Value::I32(-3)));
        assert_eq!(coerce(ScalarType::I32, Token::Number("1.5e2")), Some(Value::I32(150)));
        assert_eq!(coerce(ScalarType::I32, Token::Number("3000000000")), None);
        assert_eq!(
            coerce(ScalarType::I64, Token::Number("3000000000")),
            Some(Value::I64(3_000_000_000))
        );
        assert_eq!(coerce(ScalarType::I32, s(" 12 ")), Some(Value::I32(12)));
        assert_eq!(coerce(ScalarType::I32, s("abc")), None);
        assert_eq!(coerce(ScalarType::I32, s("1.5")), None);
        assert_eq!(coerce(ScalarType::I64, Token::Bool(true)), Some(Value::I64(1)));
    }

    #[test]
    fn floats() {
        assert_eq!(coerce(ScalarType::F64, Token::Number("2.5")), Some(Value::F64(2.5)));
        assert_eq!(coerce(ScalarType::F32, s("0.25")), Some(Value::F32(0.25)));
        assert_eq!(coerce(ScalarType::F64, Token::Bool(false)), None);
        assert_eq!(coerce(ScalarType::F64, s("nope")), None);
    }

    #[test]
    fn decimals_keep_exact_text() {
        let expected = Decimal::from_str("0.10").unwrap();
        assert_eq!(
            coerce(ScalarType::Decimal, Token::Number("0.10")),
            Some(Value::Decimal(expected))
        );
        assert_eq!(
            coerce(ScalarType::Decimal, s("1.5e3")),
            Some(Value::Decimal(Decimal::from(1500)))
        );
        assert_eq!(coerce(ScalarType::Decimal, Token::Bool(true)), None);
    }

    #[test]
    fn decimals_round_excess_fraction_digits() {
        let Some(Value::Decimal(d)) =
            coerce(ScalarType::Decimal, s("0.1234567890123456789012345678901"))
        else {
            panic!("a 31-digit fraction should coerce");
        };
        assert!(d.scale() <= 28);
        assert_eq!(d.round_dp(20), Decimal::from_str("0.12345678901234567890").unwrap());

        let Some(Value::Decimal(d)) =
            coerce(ScalarType::Decimal, Token::Number("1.2345678901234567890123456789012e-3"))
        else {
            panic!("a long scientific mantissa should coerce");
        };
        assert_eq!(d.round_dp(10), Decimal::from_str("0.0012345679").unwrap());
    }

    #[test]
    fn decimals_beyond_96_bits_are_rejected() {
        assert_eq!(coerce(ScalarType::Decimal, Token::Number("1e30")), None);
        assert_eq!(
            coerce(ScalarType::Decimal, Token::Number("123456789012345678901234567890")),
            None
        );
        assert_eq!(
            coerce(ScalarType::Decimal, Token::Number("1e28")),
            Some(Value::Decimal(Decimal::from_str("10000000000000000000000000000").unwrap()))
        );
    }
}
