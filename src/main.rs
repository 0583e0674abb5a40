//! colindex demo
//!
//! Run with: cargo run
//!
//! Builds a catalog over a deterministic synthetic sensor dataset, runs a few
//! lookups and prints the catalog statistics as JSON.
//!
//! Environment variables:
//! - COLINDEX_ROWS: Number of synthetic rows (default: 10000)
//! - COLINDEX_SEED: Seed for hashing and level promotion
//! - COLINDEX_FPR: Bloom filter false positive rate (default: 0.01)
//! - COLINDEX_MAX_LEVEL: Skip list max level (default: 4)
//! - COLINDEX_MAX_KICKS: Cuckoo displacement limit (default: 20)
//! - RUST_LOG: Log level (default: info)

use colindex::catalog::{CatalogConfig, IndexCatalog};
use colindex::data::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ROOMS: &[&str] = &["kitchen", "living", "laundry", "office", "bathroom", "bedroom", "parents", "ironing", "teenager"];
const COLUMNS: &[&str] = &["T1", "RH_1", "T_out", "Windspeed", "lights", "room"];

fn fast_random(seed: &mut u64) -> u64 {
    *seed ^= *seed << 13;
    *seed ^= *seed >> 7;
    *seed ^= *seed << 17;
    *seed
}

/// One row per reading: temperature, humidity, outdoor temperature, wind
/// speed, light energy and the room the reading came from.
fn generate_readings(count: usize, seed: &mut u64) -> Vec<Vec<Value>> {
    (0..count)
        .map(|i| {
            let lights = if fast_random(seed) % 4 == 0 {
                Value::Null
            } else {
                Value::Int64((fast_random(seed) % 7) as i64 * 10)
            };
            vec![
                Value::Float64(16.0 + (fast_random(seed) % 120) as f64 / 10.0),
                Value::Float64(30.0 + (fast_random(seed) % 300) as f64 / 10.0),
                Value::Float64(-5.0 + (fast_random(seed) % 300) as f64 / 10.0),
                Value::Float64((fast_random(seed) % 140) as f64 / 10.0),
                lights,
                Value::from(ROOMS[(fast_random(seed) as usize + i) % ROOMS.len()]),
            ]
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "colindex=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let row_count: usize = std::env::var("COLINDEX_ROWS")
        .ok()
        .and_then(|n| n.parse().ok())
        .unwrap_or(10_000);
    let config = CatalogConfig::from_env();
    info!(
        rows = row_count,
        seed = ?config.seed,
        false_positive_rate = config.false_positive_rate,
        max_level = config.skip_list.max_level,
        max_kicks = config.max_kicks,
        "building catalog"
    );

    let mut seed: u64 = config.seed.unwrap_or(12345) | 1;
    let rows = generate_readings(row_count, &mut seed);

    let columns: Vec<(String, Vec<Value>)> = COLUMNS
        .iter()
        .enumerate()
        .map(|(c, name)| {
            let values = rows.iter().map(|row| row[c].clone()).collect();
            (name.to_string(), values)
        })
        .collect();

    let mut catalog = IndexCatalog::new(config)?;
    let indexed = catalog.index_columns(columns)?;
    catalog.index_rows(&rows)?;
    info!(columns = indexed, rows = rows.len(), "catalog ready");

    // Exact and probabilistic membership on a few probe values
    for probe in [Value::Float64(21.5), Value::Float64(99.9), Value::Int64(30)] {
        for column in ["T1", "lights"] {
            let contains = catalog.contains(column, &probe)?;
            let might_contain = catalog.might_contain(column, &probe)?;
            info!(column, value = %probe, contains, might_contain, "membership");
        }
    }

    // Range sums over the first and second half of the readings
    let half = rows.len() / 2;
    for column in ["T1", "lights"] {
        let first = catalog.range_sum(column, 0, half)?;
        let second = catalog.range_sum(column, half, rows.len())?;
        info!(column, first_half = first, second_half = second, "range sums");
    }

    if let Some(row) = rows.last() {
        info!(row = ?row, found = ?catalog.lookup_row(row), "row lookup");
    }

    // Replace a reading and re-sum
    if !rows.is_empty() {
        catalog.set_numeric("T1", 0, 0.0)?;
        let sum = catalog.range_sum("T1", 0, rows.len())?;
        info!(sum, "T1 after zeroing row 0");
    }

    println!("{}", serde_json::to_string_pretty(&catalog.stats())?);

    Ok(())
}
