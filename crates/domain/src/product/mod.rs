//! Catalog products that make up orders.

mod service;

pub use service::ProductService;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::Money;

/// Errors raised while validating product data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductError {
    #[error("Product name is required")]
    NameRequired,

    #[error("Invalid price: {0} (must be greater than 0)")]
    InvalidPrice(String),

    #[error("Unknown product category: {0}")]
    UnknownCategory(String),
}

/// Menu section a product belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    Snack,
    SideDish,
    Drink,
    Dessert,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Snack => "SNACK",
            ProductCategory::SideDish => "SIDE_DISH",
            ProductCategory::Drink => "DRINK",
            ProductCategory::Dessert => "DESSERT",
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = ProductError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SNACK" => Ok(ProductCategory::Snack),
            "SIDE_DISH" => Ok(ProductCategory::SideDish),
            "DRINK" => Ok(ProductCategory::Drink),
            "DESSERT" => Ok(ProductCategory::Dessert),
            other => Err(ProductError::UnknownCategory(other.to_string())),
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: ProductCategory,
    pub price: Money,
    pub created_at: DateTime<Utc>,
}

/// A product that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: ProductCategory,
    pub price: Money,
}

impl NewProduct {
    pub fn new(
        name: &str,
        description: &str,
        category: ProductCategory,
        price: Money,
    ) -> Result<Self, ProductError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProductError::NameRequired);
        }
        if !price.is_positive() {
            return Err(ProductError::InvalidPrice(price.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            description: description.trim().to_string(),
            category,
            price,
        })
    }
}

/// Response view of a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category: ProductCategory,
    pub price: f64,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category,
            price: product.price.as_decimal(),
        }
    }
}
