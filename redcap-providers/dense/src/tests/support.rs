use arrow_array::{
    Array, ArrayRef, FixedSizeListArray, Float32Array, Float64Array, RecordBatch,
    builder::{FixedSizeListBuilder, Float64Builder},
};
use arrow_schema::{DataType, Field, Schema};
use bytes::Bytes;
use parquet::arrow::arrow_writer::ArrowWriter;
use std::convert::TryFrom;
use std::sync::Arc;

pub(crate) fn build_array(rows: &[[f64; 3]]) -> FixedSizeListArray {
    let values = Float64Array::from_iter_values(rows.iter().flatten().copied());
    FixedSizeListArray::new(
        Arc::new(Field::new("item", DataType::Float64, false)),
        3,
        Arc::new(values) as ArrayRef,
        None,
    )
}

pub(crate) fn build_f32_array(rows: &[Vec<f32>], dimension: usize) -> FixedSizeListArray {
    assert!(rows.iter().all(|row| row.len() == dimension));
    let values = Float32Array::from_iter_values(rows.iter().flatten().copied());
    FixedSizeListArray::new(
        Arc::new(Field::new("item", DataType::Float32, false)),
        i32::try_from(dimension).expect("dimension fits in i32"),
        Arc::new(values) as ArrayRef,
        None,
    )
}

/// Rows of width 2 where `None` is a null row and `Some([.., None])` holds a
/// null value.
pub(crate) fn build_nullable_array(rows: &[Option<[Option<f64>; 2]>]) -> FixedSizeListArray {
    let mut builder = FixedSizeListBuilder::new(Float64Builder::new(), 2);
    for row in rows {
        match row {
            Some(values) => {
                for value in values {
                    builder.values().append_option(*value);
                }
                builder.append(true);
            }
            None => {
                builder.values().append_null();
                builder.values().append_null();
                builder.append(false);
            }
        }
    }
    builder.finish()
}

pub(crate) fn write_parquet(array: FixedSizeListArray) -> Bytes {
    let field = Field::new("features", array.data_type().clone(), true);
    write_columns(vec![(field, Arc::new(array) as ArrayRef)])
}

pub(crate) fn write_columns(columns: Vec<(Field, ArrayRef)>) -> Bytes {
    let (fields, arrays): (Vec<Field>, Vec<ArrayRef>) = columns.into_iter().unzip();
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).expect("batch");
    let mut buffer = Vec::new();
    {
        let mut writer = ArrowWriter::try_new(&mut buffer, schema, None).expect("writer");
        writer.write(&batch).expect("write");
        writer.close().expect("close");
    }
    Bytes::from(buffer)
}
