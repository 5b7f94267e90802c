//! Shared data for unit tests.

use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::sources::{DataFusionSource, MemoryTable};

/// Six rows: an id, a city with one null and an amount with one null.
///
/// `city` holds Oslo three times; `amount` has min 5, max 40 and mean 20.
pub fn create_mixed_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("city", DataType::Utf8, true),
        Field::new("amount", DataType::Float64, true),
    ]));

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5, 6])),
            Arc::new(StringArray::from(vec![
                Some("Oslo"),
                Some("Bergen"),
                Some("Oslo"),
                None,
                Some("Trondheim"),
                Some("Oslo"),
            ])),
            Arc::new(Float64Array::from(vec![
                Some(5.0),
                Some(15.0),
                None,
                Some(30.0),
                Some(40.0),
                Some(10.0),
            ])),
        ],
    )
    .unwrap()
}

pub fn create_mixed_table() -> MemoryTable {
    MemoryTable::from_record_batch(&create_mixed_batch()).unwrap()
}

pub fn create_mixed_source() -> DataFusionSource {
    DataFusionSource::from_record_batch("data", create_mixed_batch()).unwrap()
}
