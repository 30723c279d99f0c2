use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use chrono::NaiveDate;

use crate::models::{DatasetOverview, SalesRecord};

/// Request-scoped, immutable set of sales records in input order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SalesRecord>,
}

impl Dataset {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    /// Unique SKUs in order of first appearance.
    pub fn skus(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|record| seen.insert(record.sku.as_str()))
            .map(|record| record.sku.clone())
            .collect()
    }

    /// Records grouped by SKU in one pass, groups in first-appearance order.
    pub fn by_sku(&self) -> Vec<(&str, Vec<&SalesRecord>)> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(&str, Vec<&SalesRecord>)> = Vec::new();

        for record in &self.records {
            let slot = *index.entry(record.sku.as_str()).or_insert_with(|| {
                groups.push((record.sku.as_str(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(record);
        }

        groups
    }

    pub fn contains(&self, sku: &str) -> bool {
        self.records.iter().any(|record| record.sku == sku)
    }

    pub fn overview(&self) -> DatasetOverview {
        DatasetOverview {
            total_rows: self.records.len(),
            unique_skus: self.skus().len(),
            first_date: self.records.iter().map(|r| r.date).min(),
            last_date: self.records.iter().map(|r| r.date).max(),
            total_units_sold: self.records.iter().map(|r| r.units_sold).sum(),
        }
    }
}

#[derive(serde::Deserialize)]
struct CsvRow {
    date: NaiveDate,
    sku: String,
    units_sold: f64,
    on_hand_end: f64,
}

pub fn load_csv(csv_path: &Path) -> anyhow::Result<Dataset> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    read_csv(file).with_context(|| format!("failed to load {}", csv_path.display()))
}

pub fn read_csv<R: Read>(input: R) -> anyhow::Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row_number = index + 1;
        let row = result.with_context(|| format!("row {row_number}: malformed record"))?;

        if row.sku.is_empty() {
            bail!("row {row_number}: sku is empty");
        }
        if !(row.units_sold.is_finite() && row.units_sold >= 0.0) {
            bail!("row {row_number}: units_sold must be a non-negative number");
        }
        if !(row.on_hand_end.is_finite() && row.on_hand_end >= 0.0) {
            bail!("row {row_number}: on_hand_end must be a non-negative number");
        }

        records.push(SalesRecord {
            date: row.date,
            sku: row.sku,
            units_sold: row.units_sold,
            on_hand_end: row.on_hand_end,
        });
    }

    tracing::debug!(rows = records.len(), "dataset loaded");
    Ok(Dataset::new(records))
}
