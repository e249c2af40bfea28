use crate::error::ImportError;
use crate::product::{
    max_price, ProductRow, CATEGORY, PRICE, PRICE_SCALE, PRODUCT_ID, PRODUCT_NAME, QUANTITY_SOLD, RATING,
    REQUIRED_COLUMNS, REVIEW_COUNT,
};
use crate::RawTable;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Cell values read as "no value", on top of the empty string.
const MISSING_MARKERS: [&str; 13] = [
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
    "#NA",
];

struct Columns {
    product_id: usize,
    product_name: usize,
    category: usize,
    price: usize,
    quantity_sold: usize,
    rating: usize,
    review_count: usize,
}

impl Columns {
    fn locate(table: &RawTable) -> Result<Self, ImportError> {
        let mut missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| table.column(name).is_none())
            .collect();

        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(ImportError::Schema(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        let index = |name: &str| table.column(name).unwrap_or_default();
        Ok(Columns {
            product_id: index(PRODUCT_ID),
            product_name: index(PRODUCT_NAME),
            category: index(CATEGORY),
            price: index(PRICE),
            quantity_sold: index(QUANTITY_SOLD),
            rating: index(RATING),
            review_count: index(REVIEW_COUNT),
        })
    }
}

/// Checks the column set of an upload and coerces every row into a typed
/// `ProductRow`.
///
/// Unparsable `price`, `quantity_sold` and `rating` cells are treated as
/// missing. Missing prices and quantities take the median of the values
/// present in this batch; rows without a `product_id` are dropped.
/// A number too large for a decimal is a validation error, never missing.
pub fn normalize(table: &RawTable) -> Result<Vec<ProductRow>, ImportError> {
    let cols = Columns::locate(table)?;

    let prices = table
        .rows
        .iter()
        .map(|r| parse_decimal(cell(&r.fields, cols.price), r.line, PRICE))
        .collect::<Result<Vec<_>, _>>()?;
    let quantities = table
        .rows
        .iter()
        .map(|r| parse_decimal(cell(&r.fields, cols.quantity_sold), r.line, QUANTITY_SOLD))
        .collect::<Result<Vec<_>, _>>()?;

    let price_fill = fill_value(PRICE, &prices)?;
    let quantity_fill = fill_value(QUANTITY_SOLD, &quantities)?;

    let mut rows = Vec::with_capacity(table.rows.len());
    for (i, raw) in table.rows.iter().enumerate() {
        let Some(product_id) = text(cell(&raw.fields, cols.product_id)) else {
            tracing::debug!(line = raw.line, "dropping row without product_id");
            continue;
        };

        // A None here means the column had nothing to impute, which only
        // happens when no row needed it.
        let price = prices[i].or(price_fill).unwrap_or_default();
        let quantity = quantities[i].or(quantity_fill).unwrap_or_default();

        rows.push(ProductRow {
            line: raw.line,
            product_id,
            product_name: text(cell(&raw.fields, cols.product_name)).unwrap_or_default(),
            category: text(cell(&raw.fields, cols.category)).unwrap_or_default(),
            price: round_price(price),
            quantity_sold: to_integer(quantity, raw.line, QUANTITY_SOLD, true)?,
            rating: parse_float(cell(&raw.fields, cols.rating)),
            review_count: parse_review_count(cell(&raw.fields, cols.review_count), raw.line)?,
        });
    }

    Ok(rows)
}

/// Median of a numeric column, needed only if at least one cell is missing.
fn fill_value(
    column: &str,
    values: &[Option<Decimal>],
) -> Result<Option<Decimal>, ImportError> {
    if values.iter().all(Option::is_some) {
        return Ok(None);
    }

    let present: Vec<Decimal> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return Err(ImportError::Schema(format!(
            "cannot impute missing `{}` values: column has no numeric values",
            column
        )));
    }
    match median(present) {
        Some(m) => Ok(Some(m)),
        None => Err(ImportError::Schema(format!(
            "cannot impute missing `{}` values: median overflows",
            column
        ))),
    }
}

/// Median of `values`, or `None` when there are none. Even counts take the
/// midpoint of the two middle values without overflowing near `Decimal::MAX`.
pub fn median(mut values: Vec<Decimal>) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();

    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        midpoint(values[mid - 1], values[mid])
    }
}

/// `lo <= hi`. Same-sign pairs may overflow on the sum but not on the
/// difference, opposite-sign pairs the other way round.
fn midpoint(lo: Decimal, hi: Decimal) -> Option<Decimal> {
    match lo.checked_add(hi) {
        Some(sum) => sum.checked_div(Decimal::TWO),
        None => hi
            .checked_sub(lo)
            .and_then(|gap| gap.checked_div(Decimal::TWO))
            .and_then(|half| lo.checked_add(half)),
    }
}

fn cell(fields: &[String], index: usize) -> &str {
    fields.get(index).map(String::as_str).unwrap_or_default()
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || MISSING_MARKERS.contains(&value)
}

fn text(value: &str) -> Option<String> {
    let value = value.trim();
    if is_missing(value) {
        None
    } else {
        Some(value.to_string())
    }
}

/// `Ok(None)` for a missing or non-numeric cell. A cell that reads as a
/// float (`1e30`, `inf`) but has no decimal representation is out of range.
fn parse_decimal(
    value: &str,
    line: u64,
    field: &'static str,
) -> Result<Option<Decimal>, ImportError> {
    let value = value.trim();
    if is_missing(value) {
        return Ok(None);
    }
    if let Ok(parsed) = Decimal::from_str(value).or_else(|_| Decimal::from_scientific(value)) {
        return Ok(Some(parsed));
    }
    match value.parse::<f64>() {
        Ok(float) if float.is_nan() => Ok(None),
        Ok(float) => Decimal::from_f64(float).map(Some).ok_or_else(|| {
            ImportError::validation(line, field, format!("out of range: {}", value))
        }),
        Err(_) => Ok(None),
    }
}

fn parse_float(value: &str) -> Option<f64> {
    let value = value.trim();
    if is_missing(value) {
        return None;
    }
    value.parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn round_price(price: Decimal) -> Decimal {
    let mut rounded = price.round_dp(PRICE_SCALE);
    // Prices this large fail validation later; leave their scale alone.
    if rounded.abs() < max_price() {
        rounded.rescale(PRICE_SCALE);
    }
    rounded
}

/// Converts a numeric cell to an integer. With `truncate` the fractional
/// part is dropped, otherwise it is an error.
fn to_integer(
    value: Decimal,
    line: u64,
    field: &'static str,
    truncate: bool,
) -> Result<i64, ImportError> {
    let whole = value.trunc();
    if !truncate && whole != value {
        return Err(ImportError::validation(
            line,
            field,
            format!("must be a whole number, got {}", value),
        ));
    }
    whole
        .to_i64()
        .ok_or_else(|| ImportError::validation(line, field, format!("out of range: {}", value)))
}

fn parse_review_count(value: &str, line: u64) -> Result<i64, ImportError> {
    let trimmed = value.trim();
    if is_missing(trimmed) {
        return Ok(0);
    }
    let parsed = parse_decimal(trimmed, line, REVIEW_COUNT)?.ok_or_else(|| {
        ImportError::validation(line, REVIEW_COUNT, format!("not a number: {}", trimmed))
    })?;
    to_integer(parsed, line, REVIEW_COUNT, false)
}
