//! Line-item reconciliation.
//!
//! Cloud OCR results report the goods table column by column, and columns
//! can have different lengths when cells were not recognized.

use crate::models::invoice::LineItem;

/// Parallel commodity columns, one vector per attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommodityColumns {
    pub names: Vec<String>,
    pub units: Vec<String>,
    pub quantities: Vec<String>,
    pub prices: Vec<String>,
    pub amounts: Vec<String>,
    pub tax_rates: Vec<String>,
    pub taxes: Vec<String>,
}

impl CommodityColumns {
    /// Number of rows: the longest column.
    pub fn row_count(&self) -> usize {
        self.columns().iter().map(|c| c.len()).max().unwrap_or(0)
    }

    /// Whether every column is empty.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    fn columns(&self) -> [&Vec<String>; 7] {
        [
            &self.names,
            &self.units,
            &self.quantities,
            &self.prices,
            &self.amounts,
            &self.tax_rates,
            &self.taxes,
        ]
    }
}

/// Merge the columns into rows, padding short columns with empty cells.
pub fn reconcile(columns: &CommodityColumns) -> Vec<LineItem> {
    let cell = |column: &[String], row: usize| column.get(row).cloned().unwrap_or_default();

    (0..columns.row_count())
        .map(|row| {
            let mut item = LineItem {
                name: cell(&columns.names, row),
                specification: String::new(),
                unit: cell(&columns.units, row),
                quantity: cell(&columns.quantities, row),
                unit_price: cell(&columns.prices, row),
                amount: cell(&columns.amounts, row),
                tax_rate: cell(&columns.tax_rates, row),
                tax: cell(&columns.taxes, row),
            };
            item.backfill_specification();
            item
        })
        .collect()
}
