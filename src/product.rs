use crate::error::ImportError;

use rust_decimal::Decimal;

pub const PRODUCT_ID: &str = "product_id";
pub const PRODUCT_NAME: &str = "product_name";
pub const CATEGORY: &str = "category";
pub const PRICE: &str = "price";
pub const QUANTITY_SOLD: &str = "quantity_sold";
pub const RATING: &str = "rating";
pub const REVIEW_COUNT: &str = "review_count";

/// Columns every upload must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    PRODUCT_ID,
    PRODUCT_NAME,
    CATEGORY,
    PRICE,
    QUANTITY_SOLD,
    RATING,
    REVIEW_COUNT,
];

pub const MAX_TEXT_LEN: usize = 255;
pub const PRICE_SCALE: u32 = 2;
/// Upper bound of a positive integer column in the products table.
pub const MAX_COUNT: i64 = 2_147_483_647;

/// Ten significant digits with two decimal places.
pub fn max_price() -> Decimal {
    Decimal::from(100_000_000)
}

/// A persisted product, keyed by `product_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub price: Decimal,
    pub quantity_sold: u32,
    pub rating: f64,
    pub review_count: u32,
}

/// A normalized upload row. Typed, but not yet validated against the
/// product constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    /// 1-based line of the source file, header included.
    pub line: u64,
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub price: Decimal,
    pub quantity_sold: i64,
    pub rating: Option<f64>,
    pub review_count: i64,
}

impl TryFrom<&ProductRow> for Product {
    type Error = ImportError;

    fn try_from(row: &ProductRow) -> Result<Self, Self::Error> {
        let line = row.line;

        check_text(line, PRODUCT_ID, &row.product_id)?;
        check_text(line, PRODUCT_NAME, &row.product_name)?;
        check_text(line, CATEGORY, &row.category)?;

        if row.price < Decimal::ZERO {
            return Err(ImportError::validation(
                line,
                PRICE,
                format!("must be non-negative, got {}", row.price),
            ));
        }
        if row.price >= max_price() {
            return Err(ImportError::validation(
                line,
                PRICE,
                format!("must be less than {}, got {}", max_price(), row.price),
            ));
        }

        let quantity_sold = check_count(line, QUANTITY_SOLD, row.quantity_sold)?;
        let review_count = check_count(line, REVIEW_COUNT, row.review_count)?;

        let rating = match row.rating {
            Some(r) if r.is_finite() => r,
            Some(r) => {
                return Err(ImportError::validation(
                    line,
                    RATING,
                    format!("must be a finite number, got {}", r),
                ))
            }
            None => return Err(ImportError::validation(line, RATING, "missing value")),
        };

        Ok(Product {
            product_id: row.product_id.clone(),
            product_name: row.product_name.clone(),
            category: row.category.clone(),
            price: row.price,
            quantity_sold,
            rating,
            review_count,
        })
    }
}

impl Product {
    /// Overwrites every mutable field with the validated values of `row`.
    /// The identifier is never touched.
    pub fn apply(&mut self, row: &ProductRow) -> Result<(), ImportError> {
        let validated = Product::try_from(row)?;

        self.product_name = validated.product_name;
        self.category = validated.category;
        self.price = validated.price;
        self.quantity_sold = validated.quantity_sold;
        self.rating = validated.rating;
        self.review_count = validated.review_count;

        Ok(())
    }

    pub fn revenue(&self) -> Decimal {
        self.price * Decimal::from(self.quantity_sold)
    }
}

fn check_text(line: u64, field: &'static str, value: &str) -> Result<(), ImportError> {
    if value.is_empty() {
        return Err(ImportError::validation(line, field, "must not be empty"));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ImportError::validation(
            line,
            field,
            format!("must be at most {} characters", MAX_TEXT_LEN),
        ));
    }
    Ok(())
}

fn check_count(line: u64, field: &'static str, value: i64) -> Result<u32, ImportError> {
    if value < 0 {
        return Err(ImportError::validation(
            line,
            field,
            format!("must be non-negative, got {}", value),
        ));
    }
    if value > MAX_COUNT {
        return Err(ImportError::validation(
            line,
            field,
            format!("must be at most {}, got {}", MAX_COUNT, value),
        ));
    }
    // Bounded by MAX_COUNT above.
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn row() -> ProductRow {
        ProductRow {
            line: 2,
            product_id: "SKU-1".to_string(),
            product_name: "Kettle".to_string(),
            category: "Kitchen".to_string(),
            price: Decimal::from_str("19.99").unwrap(),
            quantity_sold: 12,
            rating: Some(4.5),
            review_count: 3,
        }
    }

    fn expect_field(result: Result<Product, ImportError>, expected: &str) {
        match result {
            Err(ImportError::Validation { field, .. }) => assert_eq!(field, expected),
            other => panic!("Expected validation error on {}, got {:?}", expected, other),
        }
    }

    #[test]
    fn test_valid_row_converts() {
        let product = Product::try_from(&row()).unwrap();
        assert_eq!(product.product_id, "SKU-1");
        assert_eq!(product.quantity_sold, 12);
        assert_eq!(product.review_count, 3);
        assert_eq!(product.rating, 4.5);
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut r = row();
        r.price = Decimal::from(-1);
        expect_field(Product::try_from(&r), PRICE);
    }

    #[test]
    fn test_zero_price_accepted() {
        let mut r = row();
        r.price = Decimal::ZERO;
        assert!(Product::try_from(&r).is_ok());
    }

    #[test]
    fn test_price_too_large_rejected() {
        let mut r = row();
        r.price = Decimal::from(100_000_000);
        expect_field(Product::try_from(&r), PRICE);
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let mut r = row();
        r.quantity_sold = -3;
        expect_field(Product::try_from(&r), QUANTITY_SOLD);
    }

    #[test]
    fn test_review_count_overflow_rejected() {
        let mut r = row();
        r.review_count = MAX_COUNT + 1;
        expect_field(Product::try_from(&r), REVIEW_COUNT);
    }

    #[test]
    fn test_missing_rating_rejected() {
        let mut r = row();
        r.rating = None;
        expect_field(Product::try_from(&r), RATING);
    }

    #[test]
    fn test_infinite_rating_rejected() {
        let mut r = row();
        r.rating = Some(f64::INFINITY);
        expect_field(Product::try_from(&r), RATING);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut r = row();
        r.product_name = String::new();
        expect_field(Product::try_from(&r), PRODUCT_NAME);
    }

    #[test]
    fn test_long_category_rejected() {
        let mut r = row();
        r.category = "x".repeat(MAX_TEXT_LEN + 1);
        expect_field(Product::try_from(&r), CATEGORY);
    }

    #[test]
    fn test_apply_keeps_identifier() {
        let mut product = Product::try_from(&row()).unwrap();
        let mut update = row();
        update.product_id = "OTHER".to_string();
        update.product_name = "Steel kettle".to_string();
        update.quantity_sold = 40;

        product.apply(&update).unwrap();

        assert_eq!(product.product_id, "SKU-1");
        assert_eq!(product.product_name, "Steel kettle");
        assert_eq!(product.quantity_sold, 40);
    }

    #[test]
    fn test_failed_apply_leaves_record_untouched() {
        let mut product = Product::try_from(&row()).unwrap();
        let before = product.clone();
        let mut update = row();
        update.price = Decimal::from(-5);

        assert!(product.apply(&update).is_err());
        assert_eq!(product, before);
    }

    #[test]
    fn test_revenue() {
        let product = Product::try_from(&row()).unwrap();
        assert_eq!(product.revenue(), Decimal::from_str("239.88").unwrap());
    }
}
