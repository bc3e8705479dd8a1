use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, TimeUnit,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt64Type,
};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use common::{Error, Result};
use serde_json::{Number, Value};

pub fn batches_to_json(batches: &[RecordBatch]) -> Result<Vec<Value>> {
    let mut json_rows = Vec::new();

    for batch in batches {
        for row_idx in 0..batch.num_rows() {
            let mut row = serde_json::Map::new();

            for (col_idx, field) in batch.schema().fields().iter().enumerate() {
                let value = arrow_array_to_json(batch.column(col_idx), row_idx)?;
                row.insert(field.name().clone(), value);
            }

            json_rows.push(Value::Object(row));
        }
    }

    Ok(json_rows)
}

/// Timestamps render the way the warehouse prints a `TIMESTAMP` column: `2018-11-01 21:57:10`.
pub fn arrow_array_to_json(array: &dyn Array, index: usize) -> Result<Value> {
    if array.is_null(index) {
        return Ok(Value::Null);
    }

    Ok(match array.data_type() {
        DataType::Boolean => Value::Bool(array.as_boolean().value(index)),
        DataType::Int16 => Value::from(array.as_primitive::<Int16Type>().value(index)),
        DataType::Int32 => Value::from(array.as_primitive::<Int32Type>().value(index)),
        DataType::Int64 => Value::from(array.as_primitive::<Int64Type>().value(index)),
        DataType::UInt64 => Value::from(array.as_primitive::<UInt64Type>().value(index)),
        DataType::Float32 => float(array.as_primitive::<Float32Type>().value(index) as f64),
        DataType::Float64 => float(array.as_primitive::<Float64Type>().value(index)),
        DataType::Utf8 => Value::String(array.as_string::<i32>().value(index).to_string()),
        DataType::LargeUtf8 => Value::String(array.as_string::<i64>().value(index).to_string()),
        DataType::Utf8View => Value::String(array.as_string_view().value(index).to_string()),
        DataType::Timestamp(unit, _) => {
            let datetime = match unit {
                TimeUnit::Second => {
                    DateTime::from_timestamp(array.as_primitive::<TimestampSecondType>().value(index), 0)
                }
                TimeUnit::Millisecond => DateTime::from_timestamp_millis(
                    array.as_primitive::<TimestampMillisecondType>().value(index),
                ),
                TimeUnit::Microsecond => DateTime::from_timestamp_micros(
                    array.as_primitive::<TimestampMicrosecondType>().value(index),
                ),
                TimeUnit::Nanosecond => Some(DateTime::from_timestamp_nanos(
                    array.as_primitive::<TimestampNanosecondType>().value(index),
                )),
            };
            datetime
                .map(|dt: DateTime<Utc>| Value::String(dt.naive_utc().to_string()))
                .ok_or_else(|| Error::Other("Timestamp out of range".to_string()))?
        }
        _ => Value::Null,
    })
}

fn float(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

/// First column of the first row, as an integer. `None` when the result is empty or NULL.
pub fn scalar_i64(batches: &[RecordBatch]) -> Result<Option<i64>> {
    let Some(batch) = batches.iter().find(|b| b.num_rows() > 0) else {
        return Ok(None);
    };
    if batch.num_columns() == 0 {
        return Ok(None);
    }

    let column = cast(batch.column(0), &DataType::Int64)?;
    let values = column.as_primitive::<Int64Type>();
    if values.is_null(0) {
        return Ok(None);
    }
    Ok(Some(values.value(0)))
}

/// Rows reported by a DML statement's single `count` column; zero for statements without one.
pub fn affected_rows(batches: &[RecordBatch]) -> u64 {
    batches
        .iter()
        .filter(|b| b.num_columns() == 1 && b.schema().field(0).name() == "count")
        .filter_map(|b| b.column(0).as_primitive_opt::<UInt64Type>())
        .flat_map(|counts| counts.iter().flatten())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, StringArray, TimestampNanosecondArray, UInt64Array};
    use arrow::datatypes::{Field, Schema};
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_batches_to_json() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("user_id", DataType::Int64, true),
            Field::new("level", DataType::Utf8, true),
            Field::new("duration", DataType::Float64, true),
            Field::new("start_time", DataType::Timestamp(TimeUnit::Nanosecond, None), true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![Some(8), None])),
                Arc::new(StringArray::from(vec![Some("free"), Some("paid")])),
                Arc::new(Float64Array::from(vec![Some(252.0), None])),
                Arc::new(TimestampNanosecondArray::from(vec![
                    Some(1_541_105_830_000_000_000),
                    None,
                ])),
            ],
        )
        .unwrap();

        let rows = batches_to_json(&[batch]).unwrap();
        assert_eq!(
            rows[0],
            json!({"user_id": 8, "level": "free", "duration": 252.0, "start_time": "2018-11-01 21:57:10"})
        );
        assert_eq!(rows[1]["user_id"], Value::Null);
        assert_eq!(rows[1]["level"], json!("paid"));
    }

    #[test]
    fn test_scalar_and_affected_rows() {
        let counts = RecordBatch::try_new(
            Arc::new(Schema::new(vec![Field::new("count", DataType::UInt64, false)])),
            vec![Arc::new(UInt64Array::from(vec![3]))],
        )
        .unwrap();

        assert_eq!(scalar_i64(&[counts.clone()]).unwrap(), Some(3));
        assert_eq!(affected_rows(&[counts]), 3);
        assert_eq!(scalar_i64(&[]).unwrap(), None);
        assert_eq!(affected_rows(&[]), 0);
    }
}
