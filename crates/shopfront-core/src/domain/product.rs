use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::brand::Brand;
use super::pagination::{PageRequest, SortOrder};
use crate::error::DomainError;

/// Product entity - a catalog item belonging to a brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub discount_percentage: f64,
    pub brand_id: Uuid,
    pub stock_quantity: i32,
    pub image: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a product. The brand is resolved separately.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub discount_percentage: f64,
    pub stock_quantity: i32,
    pub image: String,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub stock_quantity: Option<i32>,
    pub image: Option<String>,
    pub is_deleted: Option<bool>,
    pub brand_id: Option<Uuid>,
}

impl Product {
    pub fn new(input: NewProduct, brand_id: Uuid) -> Result<Self, DomainError> {
        let now = Utc::now();
        let product = Self {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            description: input.description,
            price: input.price,
            discount_percentage: input.discount_percentage,
            brand_id,
            stock_quantity: input.stock_quantity,
            image: input.image,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    /// Apply a partial update. The product is left unchanged if the result is invalid.
    pub fn apply(&mut self, changes: ProductChanges) -> Result<(), DomainError> {
        let mut next = self.clone();
        if let Some(title) = changes.title {
            next.title = title.trim().to_string();
        }
        if let Some(description) = changes.description {
            next.description = description;
        }
        if let Some(price) = changes.price {
            next.price = price;
        }
        if let Some(discount) = changes.discount_percentage {
            next.discount_percentage = discount;
        }
        if let Some(stock) = changes.stock_quantity {
            next.stock_quantity = stock;
        }
        if let Some(image) = changes.image {
            next.image = image;
        }
        if let Some(is_deleted) = changes.is_deleted {
            next.is_deleted = is_deleted;
        }
        if let Some(brand_id) = changes.brand_id {
            next.brand_id = brand_id;
        }
        next.validate()?;
        next.updated_at = Utc::now();
        *self = next;
        Ok(())
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.title.is_empty() {
            return Err(DomainError::Validation("title is required".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(DomainError::Validation("description is required".to_string()));
        }
        if self.image.trim().is_empty() {
            return Err(DomainError::Validation("image is required".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(DomainError::Validation("price must be a non-negative number".to_string()));
        }
        if !(0.0..=100.0).contains(&self.discount_percentage) {
            return Err(DomainError::Validation(
                "discountPercentage must be between 0 and 100".to_string(),
            ));
        }
        if self.stock_quantity < 0 {
            return Err(DomainError::Validation("stockQuantity cannot be negative".to_string()));
        }
        Ok(())
    }

    /// Unit price after the percentage discount, rounded to cents.
    pub fn discounted_price(&self) -> f64 {
        let raw = self.price * (1.0 - self.discount_percentage / 100.0);
        (raw * 100.0).round() / 100.0
    }
}

/// A product with its brand populated, as returned by read endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    #[serde(flatten)]
    pub product: Product,
    pub brand: Option<Brand>,
}

/// Columns a product listing may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortField {
    Price,
    Title,
    StockQuantity,
    DiscountPercentage,
    CreatedAt,
}

impl ProductSortField {
    /// Ascending comparison of two products on this field.
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::Price => a.price.total_cmp(&b.price),
            Self::Title => a.title.cmp(&b.title),
            Self::StockQuantity => a.stock_quantity.cmp(&b.stock_quantity),
            Self::DiscountPercentage => a.discount_percentage.total_cmp(&b.discount_percentage),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

impl FromStr for ProductSortField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(Self::Price),
            "title" => Ok(Self::Title),
            "stockQuantity" => Ok(Self::StockQuantity),
            "discountPercentage" => Ok(Self::DiscountPercentage),
            "createdAt" => Ok(Self::CreatedAt),
            other => Err(DomainError::Validation(format!("cannot sort by '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSort {
    pub field: ProductSortField,
    pub order: SortOrder,
}

impl ProductSort {
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let ordering = self.field.compare(a, b);
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Filters, ordering and pagination for `GET /products`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    /// Restrict to these brands. Empty means any brand.
    pub brand_ids: Vec<Uuid>,
    /// Hide soft-deleted products (storefront view).
    pub exclude_deleted: bool,
    pub sort: Option<ProductSort>,
    pub page: Option<PageRequest>,
}

impl ProductQuery {
    /// Whether a product passes the filters (ordering and paging aside).
    pub fn matches(&self, product: &Product) -> bool {
        if self.exclude_deleted && product.is_deleted {
            return false;
        }
        self.brand_ids.is_empty() || self.brand_ids.contains(&product.brand_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(title: &str, price: f64) -> Product {
        Product::new(
            NewProduct {
                title: title.to_string(),
                description: "desc".to_string(),
                price,
                discount_percentage: 0.0,
                stock_quantity: 3,
                image: "img.png".to_string(),
            },
            Uuid::new_v4(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_out_of_range_discount() {
        let result = Product::new(
            NewProduct {
                title: "Phone".to_string(),
                description: "desc".to_string(),
                price: 10.0,
                discount_percentage: 120.0,
                stock_quantity: 1,
                image: "img.png".to_string(),
            },
            Uuid::new_v4(),
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_apply_is_atomic() {
        let mut product = sample("Phone", 10.0);
        let before = product.clone();
        let result = product.apply(ProductChanges {
            title: Some("Tablet".to_string()),
            price: Some(-1.0),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(product, before);

        product
            .apply(ProductChanges {
                title: Some("Tablet".to_string()),
                is_deleted: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(product.title, "Tablet");
        assert!(product.is_deleted);
    }

    #[test]
    fn test_discounted_price_rounds_to_cents() {
        let mut product = sample("Phone", 19.99);
        product.discount_percentage = 15.0;
        assert_eq!(product.discounted_price(), 16.99);
    }

    #[test]
    fn test_sort_descending_by_price() {
        let cheap = sample("A", 1.0);
        let pricey = sample("B", 9.0);
        let sort = ProductSort {
            field: ProductSortField::Price,
            order: SortOrder::Desc,
        };
        assert_eq!(sort.compare(&cheap, &pricey), Ordering::Greater);
    }

    #[test]
    fn test_query_matches_brand_and_deleted_filters() {
        let mut product = sample("A", 1.0);
        let query = ProductQuery {
            brand_ids: vec![product.brand_id],
            exclude_deleted: true,
            ..Default::default()
        };
        assert!(query.matches(&product));

        product.is_deleted = true;
        assert!(!query.matches(&product));

        let other_brand = ProductQuery {
            brand_ids: vec![Uuid::new_v4()],
            ..Default::default()
        };
        assert!(!other_brand.matches(&sample("B", 2.0)));
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!(
            "stockQuantity".parse::<ProductSortField>().unwrap(),
            ProductSortField::StockQuantity
        );
        assert!("password".parse::<ProductSortField>().is_err());
    }
}
