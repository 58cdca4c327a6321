//! Brand (tenant) and team management.

use chrono::Utc;

use socialdesk_types::brand::{
    Brand, CreateBrandRequest, CreateUserRequest, UpdateBrandRequest, User, UserRole,
    is_valid_email, slugify,
};
use socialdesk_types::error::{BrandError, RepositoryError};
use socialdesk_types::id::{BrandId, UserId};

use crate::repository::brand::{BrandRepository, UserRepository};

fn storage(e: RepositoryError) -> BrandError {
    BrandError::StorageError(e.to_string())
}

pub struct BrandService<B: BrandRepository, U: UserRepository> {
    brands: B,
    users: U,
}

impl<B: BrandRepository, U: UserRepository> BrandService<B, U> {
    pub fn new(brands: B, users: U) -> Self {
        Self { brands, users }
    }

    /// Create a brand. The slug is derived from the name and made unique by
    /// appending -2, -3, etc.
    pub async fn create_brand(&self, request: CreateBrandRequest) -> Result<Brand, BrandError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(BrandError::InvalidName("name cannot be empty".to_string()));
        }
        let base_slug = slugify(&name);
        if base_slug.is_empty() {
            return Err(BrandError::InvalidName(
                "name must contain at least one alphanumeric character".to_string(),
            ));
        }
        let slug = self.ensure_unique_slug(&base_slug).await?;

        let now = Utc::now();
        let brand = Brand {
            id: BrandId::new(),
            slug,
            name,
            industry: request.industry.filter(|s| !s.trim().is_empty()),
            website: request.website.filter(|s| !s.trim().is_empty()),
            requires_approval: request.requires_approval,
            created_at: now,
            updated_at: now,
        };
        let brand = self.brands.create(&brand).await.map_err(|e| match e {
            RepositoryError::Conflict(msg) => BrandError::SlugConflict(msg),
            other => storage(other),
        })?;
        tracing::info!(brand_id = %brand.id, slug = %brand.slug, "created brand");
        Ok(brand)
    }

    async fn ensure_unique_slug(&self, base_slug: &str) -> Result<String, BrandError> {
        let mut slug = base_slug.to_string();
        let mut counter = 2;
        loop {
            if self.brands.get_by_slug(&slug).await.map_err(storage)?.is_none() {
                return Ok(slug);
            }
            slug = format!("{base_slug}-{counter}");
            counter += 1;
            if counter > 100 {
                return Err(BrandError::SlugConflict(format!(
                    "could not generate unique slug from '{base_slug}'"
                )));
            }
        }
    }

    pub async fn get(&self, id: &BrandId) -> Result<Brand, BrandError> {
        self.brands
            .get_by_id(id)
            .await
            .map_err(storage)?
            .ok_or(BrandError::NotFound)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Brand, BrandError> {
        self.brands
            .get_by_slug(slug)
            .await
            .map_err(storage)?
            .ok_or(BrandError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<Brand>, BrandError> {
        self.brands.list().await.map_err(storage)
    }

    /// Renaming keeps the slug so existing links stay valid.
    pub async fn update_brand(&self, id: &BrandId, request: UpdateBrandRequest) -> Result<Brand, BrandError> {
        let mut brand = self.get(id).await?;
        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(BrandError::InvalidName("name cannot be empty".to_string()));
            }
            brand.name = name;
        }
        if let Some(industry) = request.industry {
            brand.industry = Some(industry).filter(|s| !s.trim().is_empty());
        }
        if let Some(website) = request.website {
            brand.website = Some(website).filter(|s| !s.trim().is_empty());
        }
        if let Some(flag) = request.requires_approval {
            brand.requires_approval = flag;
        }
        brand.updated_at = Utc::now();
        self.brands.update(&brand).await.map_err(storage)
    }

    /// Add a team member. The first member of a brand defaults to Owner,
    /// later ones to Editor.
    pub async fn add_user(&self, brand_id: &BrandId, request: CreateUserRequest) -> Result<User, BrandError> {
        self.get(brand_id).await?;
        let email = request.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(BrandError::InvalidEmail(email));
        }
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(BrandError::InvalidName("user name cannot be empty".to_string()));
        }
        if self
            .users
            .get_by_email(brand_id, &email)
            .await
            .map_err(storage)?
            .is_some()
        {
            return Err(BrandError::EmailConflict(email));
        }

        let role = match request.role {
            Some(role) => role,
            None if self.users.list_by_brand(brand_id).await.map_err(storage)?.is_empty() => {
                UserRole::Owner
            }
            None => UserRole::Editor,
        };
        let user = User {
            id: UserId::new(),
            brand_id: *brand_id,
            email,
            name,
            role,
            created_at: Utc::now(),
        };
        let user = self.users.create(&user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => BrandError::EmailConflict(user.email.clone()),
            other => storage(other),
        })?;
        tracing::info!(brand_id = %brand_id, user_id = %user.id, role = %user.role, "added user");
        Ok(user)
    }

    pub async fn get_user(&self, brand_id: &BrandId, id: &UserId) -> Result<User, BrandError> {
        self.users
            .get_by_id(id)
            .await
            .map_err(storage)?
            .filter(|u| u.brand_id == *brand_id)
            .ok_or(BrandError::UserNotFound)
    }

    pub async fn list_users(&self, brand_id: &BrandId) -> Result<Vec<User>, BrandError> {
        self.users.list_by_brand(brand_id).await.map_err(storage)
    }

    pub async fn remove_user(&self, brand_id: &BrandId, id: &UserId) -> Result<(), BrandError> {
        self.get_user(brand_id, id).await?;
        self.users.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => BrandError::UserNotFound,
            other => storage(other),
        })
    }
}
