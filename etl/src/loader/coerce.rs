use crate::sql::Column;
use arrow::datatypes::DataType;
use serde_json::{Number, Value};

/// Converts a JSON scalar into the shape a staging column of `data_type` stores.
///
/// Follows the warehouse's JSON load rules: missing values and empty strings in numeric
/// columns load as NULL, numeric strings load into numeric columns, scalars load into
/// character columns as text, and text longer than the column width is rejected.
pub fn coerce_value(
    value: Option<&Value>,
    column: &Column,
    data_type: &DataType,
) -> Result<Value, String> {
    let value = match value {
        None | Some(Value::Null) => return Ok(Value::Null),
        Some(v) => v,
    };

    match data_type {
        DataType::Int16 => to_integer(value, i16::MIN as i64, i16::MAX as i64),
        DataType::Int32 => to_integer(value, i32::MIN as i64, i32::MAX as i64),
        DataType::Int64 => to_integer(value, i64::MIN, i64::MAX),
        DataType::Float32 | DataType::Float64 => to_float(value),
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Bool(_) | Value::Number(_) => value.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(format!(
                        "column {} cannot hold a nested JSON value",
                        column.name
                    ));
                }
                Value::Null => unreachable!("nulls return early"),
            };

            if let Some(limit) = column.ty.max_bytes() {
                if text.len() > limit {
                    return Err(format!(
                        "value of {} bytes exceeds the {} byte width of column {}",
                        text.len(),
                        limit,
                        column.name
                    ));
                }
            }
            Ok(Value::String(text))
        }
        DataType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
            other => Err(format!("cannot load {} as a boolean", other)),
        },
        _ => Ok(value.clone()),
    }
}

fn to_integer(value: &Value, min: i64, max: i64) -> Result<Value, String> {
    let parsed = match value {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            // `max + 1` is a power of two and exact as f64, unlike `i64::MAX` itself.
            (None, Some(f)) if f.fract() == 0.0 && f >= min as f64 && f < max as f64 + 1.0 => {
                f as i64
            }
            _ => return Err(format!("{} is not an integer", n)),
        },
        Value::String(s) if s.trim().is_empty() => return Ok(Value::Null),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("'{}' is not an integer", s))?,
        other => return Err(format!("cannot load {} as an integer", other)),
    };

    if parsed < min || parsed > max {
        return Err(format!("{} is out of range", parsed));
    }
    Ok(Value::Number(Number::from(parsed)))
}

fn to_float(value: &Value) -> Result<Value, String> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("'{}' is not a number", s)),
        other => Err(format!("cannot load {} as a number", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ColumnType;
    use serde_json::json;

    const USER_ID: Column = Column::new("user_id", ColumnType::BigInt);
    const STATUS: Column = Column::new("status", ColumnType::SmallInt);
    const LENGTH: Column = Column::new("song_length", ColumnType::Double);
    const GENDER: Column = Column::new("user_gender", ColumnType::Varchar(Some(1)));
    const REGISTRATION: Column = Column::new("registration", ColumnType::Varchar(Some(50)));

    #[test]
    fn test_numeric_strings_load_into_integer_columns() {
        assert_eq!(
            coerce_value(Some(&json!("8")), &USER_ID, &DataType::Int64).unwrap(),
            json!(8)
        );
        assert_eq!(
            coerce_value(Some(&json!(8)), &USER_ID, &DataType::Int64).unwrap(),
            json!(8)
        );
    }

    #[test]
    fn test_empty_and_missing_values_are_null() {
        assert_eq!(
            coerce_value(Some(&json!("")), &USER_ID, &DataType::Int64).unwrap(),
            Value::Null
        );
        assert_eq!(
            coerce_value(None, &USER_ID, &DataType::Int64).unwrap(),
            Value::Null
        );
        assert_eq!(
            coerce_value(Some(&json!("  ")), &LENGTH, &DataType::Float64).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_rejects_non_numeric_text() {
        assert!(coerce_value(Some(&json!("eight")), &USER_ID, &DataType::Int64).is_err());
        assert!(coerce_value(Some(&json!(1.5)), &USER_ID, &DataType::Int64).is_err());
        assert!(coerce_value(Some(&json!(true)), &LENGTH, &DataType::Float64).is_err());
    }

    #[test]
    fn test_small_int_range() {
        assert_eq!(
            coerce_value(Some(&json!(200)), &STATUS, &DataType::Int16).unwrap(),
            json!(200)
        );
        assert!(coerce_value(Some(&json!(40000)), &STATUS, &DataType::Int16).is_err());
    }

    #[test]
    fn test_whole_floats_respect_integer_bounds() {
        assert_eq!(
            coerce_value(Some(&json!(32767.0)), &STATUS, &DataType::Int16).unwrap(),
            json!(32767)
        );
        assert!(coerce_value(Some(&json!(32768.0)), &STATUS, &DataType::Int16).is_err());
        assert!(
            coerce_value(Some(&json!(9.223372036854775808e18)), &USER_ID, &DataType::Int64).is_err()
        );
        assert_eq!(
            coerce_value(Some(&json!(-9.223372036854775808e18)), &USER_ID, &DataType::Int64).unwrap(),
            json!(i64::MIN)
        );
    }

    #[test]
    fn test_numbers_load_into_text_columns() {
        assert_eq!(
            coerce_value(Some(&json!(1540919166796_i64)), &REGISTRATION, &DataType::Utf8).unwrap(),
            json!("1540919166796")
        );
    }

    #[test]
    fn test_text_wider_than_column_is_rejected() {
        assert_eq!(
            coerce_value(Some(&json!("F")), &GENDER, &DataType::Utf8).unwrap(),
            json!("F")
        );
        let err = coerce_value(Some(&json!("Female")), &GENDER, &DataType::Utf8).unwrap_err();
        assert!(err.contains("user_gender"));
    }

    #[test]
    fn test_nested_values_are_rejected_for_text() {
        assert!(coerce_value(Some(&json!({"a": 1})), &REGISTRATION, &DataType::Utf8).is_err());
    }
}
