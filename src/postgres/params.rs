use std::error::Error;

use bytes::BytesMut;
use postgres::types::{IsNull, Kind, ToSql, Type, WrongType, to_sql_checked};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::types::SqlValue;

type BoxError = Box<dyn Error + Sync + Send>;

/// Borrow bound values as the parameter slice the client expects.
#[must_use]
pub fn as_refs(params: &[SqlValue]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

/// Encode `value` only if its Rust type has a wire format for `ty`.
fn checked<T: ToSql>(value: &T, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if T::accepts(ty) {
        value.to_sql(ty, out)
    } else {
        Err(Box::new(WrongType::new::<T>(ty.clone())))
    }
}

/// Binary form of a textual uuid, hyphens optional.
fn uuid_bytes(text: &str) -> Result<[u8; 16], BoxError> {
    let digits: Vec<u8> = text.bytes().filter(|b| *b != b'-').collect();
    if digits.len() != 32 {
        return Err(format!("invalid uuid: {text}").into());
    }
    let mut raw = [0_u8; 16];
    for (slot, pair) in raw.iter_mut().zip(digits.chunks(2)) {
        let pair = std::str::from_utf8(pair)?;
        *slot = u8::from_str_radix(pair, 16).map_err(|_| format!("invalid uuid: {text}"))?;
    }
    Ok(raw)
}

impl ToSql for SqlValue {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(b) => checked(b, ty, out),
            // integers adapt to the width the server inferred for the placeholder
            SqlValue::Int(i) => match *ty {
                Type::INT2 => checked(&i16::try_from(*i)?, ty, out),
                Type::INT4 => checked(&i32::try_from(*i)?, ty, out),
                Type::OID => checked(&u32::try_from(*i)?, ty, out),
                Type::FLOAT4 => checked(&(*i as f32), ty, out),
                Type::FLOAT8 => checked(&(*i as f64), ty, out),
                Type::NUMERIC => checked(&Decimal::from(*i), ty, out),
                _ => checked(i, ty, out),
            },
            SqlValue::Float(f) => match *ty {
                Type::FLOAT4 => checked(&(*f as f32), ty, out),
                Type::NUMERIC => checked(&Decimal::try_from(*f)?, ty, out),
                _ => checked(f, ty, out),
            },
            SqlValue::Decimal(d) => match *ty {
                Type::FLOAT4 | Type::FLOAT8 => {
                    let f: f64 = (*d).try_into()?;
                    checked(&f, ty, out)
                }
                _ => checked(d, ty, out),
            },
            SqlValue::Text(s) => match *ty {
                Type::UUID => {
                    out.extend_from_slice(&uuid_bytes(s)?);
                    Ok(IsNull::No)
                }
                Type::JSON | Type::JSONB => checked(&serde_json::from_str::<JsonValue>(s)?, ty, out),
                _ => checked(s, ty, out),
            },
            SqlValue::Blob(bytes) => checked(bytes, ty, out),
            SqlValue::Timestamp(dt) => match *ty {
                Type::TIMESTAMPTZ => checked(&dt.and_utc(), ty, out),
                _ => checked(dt, ty, out),
            },
            SqlValue::Date(d) => checked(d, ty, out),
            SqlValue::Time(t) => checked(t, ty, out),
            SqlValue::Json(json) => checked(json, ty, out),
            SqlValue::Array(items) => match ty.kind() {
                Kind::Array(_) => items.to_sql(ty, out),
                _ => Err(Box::new(WrongType::new::<Vec<SqlValue>>(ty.clone()))),
            },
        }
    }

    // NULL must bind to a column of any type; concrete mismatches surface from to_sql.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}
