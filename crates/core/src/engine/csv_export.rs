use csv::{QuoteStyle, WriterBuilder};
use rust_decimal::Decimal;

use super::dashboard_model::PositionRow;
use crate::constants::DISPLAY_DECIMAL_PRECISION;
use crate::errors::{Error, Result};

const CSV_HEADER: [&str; 9] = [
    "Display",
    "Symbol",
    "Category",
    "Qty",
    "AvgPrice",
    "CurrentPrice",
    "MarketValue",
    "P&L",
    "Change%",
];

const QUANTITY_PRECISION: u32 = 8;

fn money(value: Decimal) -> String {
    value.round_dp(DISPLAY_DECIMAL_PRECISION).to_string()
}

/// Positions as CSV with every cell quoted.
pub fn export_positions_csv(rows: &[PositionRow]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.write_record([
            row.display_name.clone(),
            row.symbol.clone().unwrap_or_default(),
            row.category.clone(),
            row.quantity.round_dp(QUANTITY_PRECISION).normalize().to_string(),
            money(row.average_price),
            money(row.current_price),
            money(row.market_value),
            money(row.pnl),
            money(row.change_percent),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| Error::Export(e.to_string()))
}
