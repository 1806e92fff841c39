use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{
    Array, ArrayRef, AsArray, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use arrow::temporal_conversions::date32_to_datetime;
use chrono::NaiveDate;
use log::{debug, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{OrderStatus, Transaction, TransactionSet};
use crate::error::LoadError;

/// Fixed on-disk date format (`DD/MM/YYYY`).
pub const DATE_FORMAT: &str = "%d/%m/%Y";

const REQUIRED_COLUMNS: [&str; 7] = [
    "date",
    "product",
    "region",
    "payment_method",
    "order_status",
    "sales_amount",
    "marketing_spend",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a transaction table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the seven transaction columns (recommended)
/// * `.json`    – `[{ "date": "01/01/2023", "product": "A", ... }, ...]`
/// * `.parquet` – same column names; `date` as `Utf8` or `Date32`
pub fn load_file(path: &Path) -> Result<TransactionSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let set = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(LoadError::UnsupportedExtension(other.to_string()).into()),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    info!("loaded {} transactions from {}", set.len(), path.display());
    Ok(set)
}

// ---------------------------------------------------------------------------
// Format-neutral row representation
// ---------------------------------------------------------------------------

/// A numeric cell before coercion.
#[derive(Debug, Clone, PartialEq)]
enum RawNumber {
    Number(f64),
    Text(String),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
enum RawDate {
    Text(String),
    Date(NaiveDate),
}

/// One source row, already split into columns but not yet typed.
#[derive(Debug, Clone)]
struct RawRecord {
    date: RawDate,
    product: String,
    region: String,
    payment_method: String,
    order_status: String,
    sales_amount: RawNumber,
    marketing_spend: RawNumber,
}

/// Accumulates typed rows and counts coerced cells.
#[derive(Default)]
struct RowSink {
    rows: Vec<Transaction>,
    coerced_sales: usize,
}

impl RowSink {
    /// `row` is 1-based, counting data rows only.
    fn push(&mut self, row: usize, raw: RawRecord) -> Result<(), LoadError> {
        let date = match raw.date {
            RawDate::Date(d) => d,
            RawDate::Text(s) => parse_date(row, &s)?,
        };

        let sales_amount = coerce_sales(&raw.sales_amount);
        if sales_amount.is_none() {
            debug!("row {row}: sales_amount {:?} coerced to missing", raw.sales_amount);
            self.coerced_sales += 1;
        }

        let marketing_spend = parse_marketing(row, &raw.marketing_spend)?;

        self.rows.push(Transaction {
            date,
            product: raw.product,
            region: raw.region,
            payment_method: raw.payment_method,
            order_status: OrderStatus::parse(&raw.order_status),
            sales_amount,
            marketing_spend,
        });
        Ok(())
    }

    fn finish(self) -> TransactionSet {
        if self.coerced_sales > 0 {
            warn!(
                "{} of {} sales_amount values were missing or not numeric",
                self.coerced_sales,
                self.rows.len()
            );
        }
        TransactionSet::from_rows(self.rows)
    }
}

/// Parse a `DD/MM/YYYY` date. Unparseable dates are fatal.
pub fn parse_date(row: usize, s: &str) -> Result<NaiveDate, LoadError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| LoadError::InvalidDate {
        row,
        value: s.to_string(),
    })
}

/// Coerce a sales cell: anything that is not a finite, non-negative number
/// becomes missing.
fn coerce_sales(raw: &RawNumber) -> Option<f64> {
    let value = match raw {
        RawNumber::Number(v) => *v,
        RawNumber::Text(s) => s.trim().parse::<f64>().ok()?,
        RawNumber::Null => return None,
    };
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Marketing spend is not nullable: blank cells count as zero, garbage is
/// an error.
fn parse_marketing(row: usize, raw: &RawNumber) -> Result<f64, LoadError> {
    let invalid = |value: String| LoadError::InvalidNumber {
        row,
        column: "marketing_spend",
        value,
    };
    match raw {
        RawNumber::Null => Ok(0.0),
        RawNumber::Number(v) if v.is_finite() => Ok(*v),
        RawNumber::Number(v) => Err(invalid(v.to_string())),
        RawNumber::Text(s) if s.trim().is_empty() => Ok(0.0),
        RawNumber::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(s.clone())),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with (at least) the seven transaction columns, in
/// any order. Extra columns are ignored.
fn load_csv(path: &Path) -> Result<TransactionSet> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file)
}

/// Parse CSV from any reader (file, bytes, stdin).
pub fn read_csv<R: Read>(input: R) -> Result<TransactionSet> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut idx = [0usize; 7];
    for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == name)
            .ok_or(LoadError::MissingColumn(name))?;
    }
    let [date_i, product_i, region_i, payment_i, status_i, sales_i, marketing_i] = idx;

    let mut sink = RowSink::default();

    for (row_no, result) in reader.records().enumerate() {
        let row = row_no + 1;
        let record = result.with_context(|| format!("CSV row {row}"))?;
        let cell = |i: usize| record.get(i).unwrap_or("").to_string();

        sink.push(
            row,
            RawRecord {
                date: RawDate::Text(cell(date_i)),
                product: cell(product_i),
                region: cell(region_i),
                payment_method: cell(payment_i),
                order_status: cell(status_i),
                sales_amount: text_number(cell(sales_i)),
                marketing_spend: text_number(cell(marketing_i)),
            },
        )?;
    }

    Ok(sink.finish())
}

fn text_number(s: String) -> RawNumber {
    if s.trim().is_empty() {
        RawNumber::Null
    } else {
        RawNumber::Text(s)
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "date": "01/01/2023",
///     "product": "Laptop",
///     "region": "East",
///     "payment_method": "Card",
///     "order_status": "Completed",
///     "sales_amount": 1200.0,
///     "marketing_spend": 50.0
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<TransactionSet> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    read_json(&text)
}

pub fn read_json(text: &str) -> Result<TransactionSet> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut sink = RowSink::default();

    for (i, rec) in records.iter().enumerate() {
        let row = i + 1;
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {row} is not a JSON object"))?;

        // null reads like an empty CSV cell; only an absent key is a missing column.
        let text_field = |name: &'static str| -> Result<String, LoadError> {
            match obj.get(name) {
                Some(JsonValue::String(s)) => Ok(s.clone()),
                Some(JsonValue::Null) => Ok(String::new()),
                None => Err(LoadError::MissingColumn(name)),
                Some(other) => Ok(other.to_string()),
            }
        };

        sink.push(
            row,
            RawRecord {
                date: RawDate::Text(text_field("date")?),
                product: text_field("product")?,
                region: text_field("region")?,
                payment_method: text_field("payment_method")?,
                order_status: text_field("order_status")?,
                sales_amount: json_number(obj.get("sales_amount")),
                marketing_spend: json_number(obj.get("marketing_spend")),
            },
        )?;
    }

    Ok(sink.finish())
}

fn json_number(val: Option<&JsonValue>) -> RawNumber {
    match val {
        Some(JsonValue::Number(n)) => n.as_f64().map_or(RawNumber::Null, RawNumber::Number),
        Some(JsonValue::String(s)) => text_number(s.clone()),
        Some(JsonValue::Null) | None => RawNumber::Null,
        Some(other) => RawNumber::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of transactions.
///
/// Expected schema:
/// - `date`: Utf8 (`DD/MM/YYYY`), Date32, Date64 or Timestamp (any unit);
///   the time of day is dropped
/// - `product`, `region`, `payment_method`, `order_status`: Utf8
/// - `sales_amount`, `marketing_spend`: Int32/Int64/Float32/Float64 or Utf8
///
/// Pandas writes datetime columns as Timestamp, Polars `Date` as Date32;
/// both load.
fn load_parquet(path: &Path) -> Result<TransactionSet> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut sink = RowSink::default();
    let mut row_offset = 0;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        read_batch(&batch, row_offset, &mut sink)?;
        row_offset += batch.num_rows();
    }

    Ok(sink.finish())
}

fn read_batch(batch: &RecordBatch, row_offset: usize, sink: &mut RowSink) -> Result<()> {
    let date_col = date_column(column(batch, "date")?)?;
    let product_col = column(batch, "product")?;
    let region_col = column(batch, "region")?;
    let payment_col = column(batch, "payment_method")?;
    let status_col = column(batch, "order_status")?;
    let sales_col = column(batch, "sales_amount")?;
    let marketing_col = column(batch, "marketing_spend")?;

    for i in 0..batch.num_rows() {
        let row = row_offset + i + 1;
        let raw = RawRecord {
            date: extract_date(&date_col, i, row)?,
            product: extract_text(product_col, i, row, "product")?,
            region: extract_text(region_col, i, row, "region")?,
            payment_method: extract_text(payment_col, i, row, "payment_method")?,
            order_status: extract_text(status_col, i, row, "order_status")?,
            sales_amount: extract_number(sales_col, i, row, "sales_amount")?,
            marketing_spend: extract_number(marketing_col, i, row, "marketing_spend")?,
        };
        sink.push(row, raw)?;
    }
    Ok(())
}

// -- Parquet / Arrow helpers --

fn column<'a>(batch: &'a RecordBatch, name: &'static str) -> Result<&'a ArrayRef, LoadError> {
    batch
        .schema()
        .index_of(name)
        .map(|i| batch.column(i))
        .map_err(|_| LoadError::MissingColumn(name))
}

/// Date64 and Timestamp columns are cast to Date32; anything else is
/// passed through to `extract_date`.
fn date_column(col: &ArrayRef) -> Result<ArrayRef> {
    match col.data_type() {
        DataType::Date64 | DataType::Timestamp(_, _) => {
            cast(col, &DataType::Date32).context("converting date column to Date32")
        }
        _ => Ok(Arc::clone(col)),
    }
}

fn unsupported(col: &ArrayRef, row: usize, column: &'static str) -> LoadError {
    LoadError::UnsupportedType {
        row,
        column,
        data_type: format!("{:?}", col.data_type()),
    }
}

/// Read a string cell from a Utf8 or LargeUtf8 column. Nulls become "".
fn extract_text(
    col: &ArrayRef,
    i: usize,
    row: usize,
    column: &'static str,
) -> Result<String, LoadError> {
    if col.is_null(i) {
        return Ok(String::new());
    }
    match col.data_type() {
        DataType::Utf8 => Ok(col.as_string::<i32>().value(i).to_string()),
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(i).to_string()),
        _ => Err(unsupported(col, row, column)),
    }
}

fn extract_date(col: &ArrayRef, i: usize, row: usize) -> Result<RawDate, LoadError> {
    if let Some(arr) = col.as_any().downcast_ref::<Date32Array>() {
        if arr.is_null(i) {
            return Err(LoadError::InvalidDate {
                row,
                value: String::new(),
            });
        }
        let days = arr.value(i);
        return date32_to_datetime(days)
            .map(|dt| RawDate::Date(dt.date()))
            .ok_or_else(|| LoadError::InvalidDate {
                row,
                value: days.to_string(),
            });
    }
    extract_text(col, i, row, "date").map(RawDate::Text)
}

fn extract_number(
    col: &ArrayRef,
    i: usize,
    row: usize,
    column: &'static str,
) -> Result<RawNumber, LoadError> {
    if col.is_null(i) {
        return Ok(RawNumber::Null);
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Float64 => any.downcast_ref::<Float64Array>().map(|a| a.value(i)),
        DataType::Float32 => any.downcast_ref::<Float32Array>().map(|a| a.value(i) as f64),
        DataType::Int64 => any.downcast_ref::<Int64Array>().map(|a| a.value(i) as f64),
        DataType::Int32 => any.downcast_ref::<Int32Array>().map(|a| a.value(i) as f64),
        DataType::Utf8 => {
            return Ok(text_number(col.as_string::<i32>().value(i).to_string()));
        }
        DataType::LargeUtf8 => {
            return Ok(text_number(col.as_string::<i64>().value(i).to_string()));
        }
        _ => None,
    };
    value
        .map(RawNumber::Number)
        .ok_or_else(|| unsupported(col, row, column))
}
