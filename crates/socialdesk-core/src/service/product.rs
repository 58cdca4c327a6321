//! Product catalog CRUD.

use chrono::Utc;

use socialdesk_types::error::{MediaError, RepositoryError};
use socialdesk_types::id::{BrandId, ProductId};
use socialdesk_types::media::{CreateProductRequest, Product, UpdateProductRequest};

use crate::repository::media::ProductRepository;

fn storage(e: RepositoryError) -> MediaError {
    MediaError::StorageError(e.to_string())
}

fn currency(raw: Option<String>) -> Result<String, MediaError> {
    let code = raw.unwrap_or_else(|| "USD".to_string()).trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(MediaError::Validation(format!("invalid currency code '{code}'")));
    }
    Ok(code)
}

fn validate(product: &Product) -> Result<(), MediaError> {
    if product.name.trim().is_empty() {
        return Err(MediaError::Validation("product name cannot be empty".to_string()));
    }
    if product.price_cents.is_some_and(|p| p < 0) {
        return Err(MediaError::Validation("price cannot be negative".to_string()));
    }
    Ok(())
}

pub struct ProductService<R: ProductRepository> {
    products: R,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(products: R) -> Self {
        Self { products }
    }

    pub async fn create(&self, brand_id: &BrandId, request: CreateProductRequest) -> Result<Product, MediaError> {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            brand_id: *brand_id,
            name: request.name.trim().to_string(),
            description: request.description.filter(|d| !d.trim().is_empty()),
            price_cents: request.price_cents,
            currency: currency(request.currency)?,
            image_url: request.image_url,
            product_url: request.product_url,
            tags: request.tags,
            created_at: now,
            updated_at: now,
        };
        validate(&product)?;
        self.products.create(&product).await.map_err(storage)
    }

    pub async fn list(&self, brand_id: &BrandId) -> Result<Vec<Product>, MediaError> {
        self.products.list(brand_id).await.map_err(storage)
    }

    pub async fn get(&self, brand_id: &BrandId, id: &ProductId) -> Result<Product, MediaError> {
        self.products
            .get_by_id(id)
            .await
            .map_err(storage)?
            .filter(|p| p.brand_id == *brand_id)
            .ok_or(MediaError::NotFound)
    }

    pub async fn update(
        &self,
        brand_id: &BrandId,
        id: &ProductId,
        request: UpdateProductRequest,
    ) -> Result<Product, MediaError> {
        let mut product = self.get(brand_id, id).await?;
        if let Some(name) = request.name {
            product.name = name.trim().to_string();
        }
        if let Some(description) = request.description {
            product.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        if request.price_cents.is_some() {
            product.price_cents = request.price_cents;
        }
        if request.currency.is_some() {
            product.currency = currency(request.currency)?;
        }
        if let Some(url) = request.image_url {
            product.image_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(url) = request.product_url {
            product.product_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(tags) = request.tags {
            product.tags = tags;
        }
        validate(&product)?;
        product.updated_at = Utc::now();
        self.products.update(&product).await.map_err(storage)
    }

    pub async fn delete(&self, brand_id: &BrandId, id: &ProductId) -> Result<(), MediaError> {
        self.get(brand_id, id).await?;
        self.products.delete(id).await.map_err(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemProducts;

    fn create(name: &str, price: Option<i64>, currency: Option<&str>) -> CreateProductRequest {
        CreateProductRequest {
            name: name.to_string(),
            description: None,
            price_cents: price,
            currency: currency.map(str::to_string),
            image_url: None,
            product_url: None,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_defaults_currency() {
        let svc = ProductService::new(MemProducts::default());
        let p = svc.create(&BrandId::new(), create(" Cold Brew ", Some(450), None)).await.unwrap();
        assert_eq!(p.name, "Cold Brew");
        assert_eq!(p.currency, "USD");
        assert_eq!(p.formatted_price().as_deref(), Some("$4.50"));
    }

    #[tokio::test]
    async fn test_validation() {
        let svc = ProductService::new(MemProducts::default());
        let brand_id = BrandId::new();
        assert!(svc.create(&brand_id, create("", None, None)).await.is_err());
        assert!(svc.create(&brand_id, create("Mug", Some(-1), None)).await.is_err());
        assert!(svc.create(&brand_id, create("Mug", None, Some("euro"))).await.is_err());
    }

    #[tokio::test]
    async fn test_update_and_delete_scoped() {
        let svc = ProductService::new(MemProducts::default());
        let brand_id = BrandId::new();
        let p = svc.create(&brand_id, create("Mug", Some(1200), Some("eur"))).await.unwrap();

        let updated = svc
            .update(
                &brand_id,
                &p.id,
                UpdateProductRequest {
                    price_cents: Some(1500),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.formatted_price().as_deref(), Some("€15.00"));

        assert!(matches!(
            svc.delete(&BrandId::new(), &p.id).await.unwrap_err(),
            MediaError::NotFound
        ));
        svc.delete(&brand_id, &p.id).await.unwrap();
        assert!(svc.list(&brand_id).await.unwrap().is_empty());
    }
}
