use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Float64Array, Float64Builder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use clap::Parser;
use parquet::arrow::ArrowWriter;

#[derive(Parser)]
#[command(name = "generate_sample")]
#[command(about = "Write a deterministic sample sales dataset")]
#[command(version)]
struct Cli {
    /// Output file (.csv or .parquet)
    #[arg(default_value = "DATA.csv")]
    output: PathBuf,

    /// Number of orders to generate
    #[arg(short = 'n', long, default_value_t = 2000)]
    rows: usize,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// One generated order; `sales_amount` is text so malformed cells can be
/// written deliberately.
struct Row {
    date: String,
    product: &'static str,
    region: &'static str,
    payment_method: &'static str,
    order_status: &'static str,
    sales_amount: String,
    marketing_spend: f64,
}

const PRODUCTS: [(&str, f64); 5] = [
    ("Laptop", 1200.0),
    ("Phone", 700.0),
    ("Tablet", 400.0),
    ("Headphones", 150.0),
    ("Monitor", 300.0),
];
const REGIONS: [&str; 4] = ["North", "South", "East", "West"];
const PAYMENT_METHODS: [&str; 4] = ["Credit Card", "Debit Card", "PayPal", "Cash"];
// Weighted: mostly completed orders.
const STATUSES: [&str; 8] = [
    "Completed", "Completed", "Completed", "Completed", "Completed", "Cancelled", "Returned",
    "Pending",
];

/// `n_rows` orders spread over the two years after `start`.
fn generate(n_rows: usize, start: NaiveDate, rng: &mut SimpleRng) -> Vec<Row> {
    (0..n_rows)
        .map(|i| {
            let date = start + Duration::days((rng.next_u64() % 730) as i64);
            let (product, base_price) = PRODUCTS[(rng.next_u64() % PRODUCTS.len() as u64) as usize];
            let amount = base_price * rng.range(0.8, 1.2);
            // Every 97th row carries a malformed sales cell.
            let sales_amount = match i % 97 {
                13 => String::new(),
                41 => "N/A".to_string(),
                _ => format!("{amount:.2}"),
            };
            Row {
                date: date.format("%d/%m/%Y").to_string(),
                product,
                region: rng.pick(&REGIONS),
                payment_method: rng.pick(&PAYMENT_METHODS),
                order_status: rng.pick(&STATUSES),
                sales_amount,
                marketing_spend: (amount * rng.range(0.02, 0.08) * 100.0).round() / 100.0,
            }
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record([
        "date",
        "product",
        "region",
        "payment_method",
        "order_status",
        "sales_amount",
        "marketing_spend",
    ])?;
    for r in rows {
        writer.write_record([
            r.date.as_str(),
            r.product,
            r.region,
            r.payment_method,
            r.order_status,
            r.sales_amount.as_str(),
            r.marketing_spend.to_string().as_str(),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn text_column(rows: &[Row], f: impl Fn(&Row) -> &str) -> StringArray {
    StringArray::from(rows.iter().map(f).collect::<Vec<_>>())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let mut sales = Float64Builder::new();
    for r in rows {
        sales.append_option(r.sales_amount.parse::<f64>().ok());
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("date", DataType::Utf8, false),
        Field::new("product", DataType::Utf8, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("payment_method", DataType::Utf8, false),
        Field::new("order_status", DataType::Utf8, false),
        Field::new("sales_amount", DataType::Float64, true),
        Field::new("marketing_spend", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(text_column(rows, |r| r.date.as_str())),
            Arc::new(text_column(rows, |r| r.product)),
            Arc::new(text_column(rows, |r| r.region)),
            Arc::new(text_column(rows, |r| r.payment_method)),
            Arc::new(text_column(rows, |r| r.order_status)),
            Arc::new(sales.finish()),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.marketing_spend).collect::<Vec<_>>(),
            )),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let start = NaiveDate::from_ymd_opt(2023, 1, 1).context("invalid start date")?;
    let mut rng = SimpleRng::new(cli.seed);
    let rows = generate(cli.rows, start, &mut rng);

    match cli.output.extension().and_then(|e| e.to_str()) {
        Some("csv") => write_csv(&cli.output, &rows)?,
        Some("parquet") => write_parquet(&cli.output, &rows)?,
        other => bail!("unsupported output extension: {other:?}"),
    }

    println!("Wrote {} orders to {}", rows.len(), cli.output.display());
    Ok(())
}
