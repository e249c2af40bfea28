use crate::product::{Product, PRICE_SCALE};

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::io::Write;

pub const SUMMARY_HEADER: [&str; 4] = [
    "category",
    "total_revenue",
    "top_product",
    "top_product_quantity_sold",
];

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category: String,
    pub total_revenue: Decimal,
    pub top_product: String,
    pub top_product_quantity_sold: u32,
}

struct Accumulator<'a> {
    revenue: Decimal,
    top: &'a Product,
}

/// Groups products by category and computes revenue and best seller.
///
/// Output is ordered by category. Among products sharing the highest
/// `quantity_sold` the one with the smallest `product_id` wins, whatever
/// order the input is in.
pub fn summarize(products: &[Product]) -> Vec<CategorySummary> {
    let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();

    for product in products {
        groups
            .entry(product.category.as_str())
            .and_modify(|acc| {
                acc.revenue += product.revenue();
                if beats(product, acc.top) {
                    acc.top = product;
                }
            })
            .or_insert_with(|| Accumulator {
                revenue: product.revenue(),
                top: product,
            });
    }

    groups
        .into_iter()
        .map(|(category, acc)| CategorySummary {
            category: category.to_string(),
            total_revenue: acc.revenue,
            top_product: acc.top.product_name.clone(),
            top_product_quantity_sold: acc.top.quantity_sold,
        })
        .collect()
}

fn beats(candidate: &Product, current: &Product) -> bool {
    candidate.quantity_sold > current.quantity_sold
        || (candidate.quantity_sold == current.quantity_sold
            && candidate.product_id < current.product_id)
}

/// Renders summaries as CSV under the fixed report header.
pub fn write_summary<W: Write>(summaries: &[CategorySummary], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(SUMMARY_HEADER)?;

    for summary in summaries {
        let mut revenue = summary.total_revenue.round_dp(PRICE_SCALE);
        revenue.rescale(PRICE_SCALE);

        wtr.write_record([
            summary.category.as_str(),
            revenue.to_string().as_str(),
            summary.top_product.as_str(),
            summary.top_product_quantity_sold.to_string().as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
