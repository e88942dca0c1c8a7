//! Product catalog lookups.

use common::ProductId;

use crate::error::DomainError;
use crate::ports::ProductRepository;

use super::{NewProduct, Product, ProductCategory};

/// Service resolving product identifiers for the order use cases.
pub struct ProductService<R: ProductRepository> {
    repository: R,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Adds a product to the catalog.
    #[tracing::instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, DomainError> {
        let product = self.repository.save_product(product).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Resolves a product id. Fails with `ProductNotFound` when absent.
    #[tracing::instrument(skip(self))]
    pub async fn find_product_by_id(&self, id: ProductId) -> Result<Product, DomainError> {
        self.repository
            .find_product_by_id(id)
            .await?
            .ok_or(DomainError::ProductNotFound(id))
    }

    /// Lists the products of a menu section.
    #[tracing::instrument(skip(self))]
    pub async fn list_products_by_category(
        &self,
        category: ProductCategory,
    ) -> Result<Vec<Product>, DomainError> {
        Ok(self.repository.find_products_by_category(category).await?)
    }
}
