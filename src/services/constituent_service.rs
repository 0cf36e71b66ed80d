use csv::{ReaderBuilder, StringRecord};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::constituent_source::ConstituentSource;
use crate::models::ConstituentRecord;

const SYMBOL_COLUMN: &str = "Symbol";
const NAME_COLUMN: &str = "Security";
const SECTOR_COLUMN: &str = "GICS Sector";

/// Fetches the constituent table and projects every row to symbol/name/sector.
///
/// Only a failed fetch is an error; parsing never drops or aborts on a row.
pub async fn fetch_constituents(
    source: &dyn ConstituentSource,
) -> Result<Vec<ConstituentRecord>, AppError> {
    let table = source.fetch_table().await?;
    let records = parse_constituents(&table);
    info!("Parsed {} constituent rows", records.len());
    Ok(records)
}

/// Columns are found by header name so reordered or extended tables still parse.
/// A column missing from the header, or a row too short to reach it, yields "".
pub fn parse_constituents(table: &str) -> Vec<ConstituentRecord> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(table.as_bytes());

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            warn!("Constituent table has no readable header: {}", e);
            return Vec::new();
        }
    };

    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let symbol_idx = position(SYMBOL_COLUMN);
    let name_idx = position(NAME_COLUMN);
    let sector_idx = position(SECTOR_COLUMN);

    reader
        .records()
        .map(|row| match row {
            Ok(row) => ConstituentRecord {
                symbol: field(&row, symbol_idx),
                name: field(&row, name_idx),
                sector: field(&row, sector_idx),
            },
            Err(e) => {
                warn!("Unreadable constituent row: {}", e);
                ConstituentRecord::default()
            }
        })
        .collect()
}

fn field(row: &StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| row.get(i))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}
