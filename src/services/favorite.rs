//! Favorite service

use crate::db::repositories::FavoriteRepository;
use crate::models::{Favorite, ToggleFavoriteInput, User};
use crate::services::error::ServiceError;
use crate::services::review::ProductLookup;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteToggle {
    pub favorited: bool,
}

pub struct FavoriteService {
    favorites: Arc<dyn FavoriteRepository>,
    lookup: ProductLookup,
}

impl FavoriteService {
    pub fn new(favorites: Arc<dyn FavoriteRepository>, lookup: ProductLookup) -> Self {
        Self { favorites, lookup }
    }

    /// Add the product to the user's favorites, or remove it if already there
    pub async fn toggle(&self, user: &User, input: ToggleFavoriteInput) -> Result<FavoriteToggle, ServiceError> {
        if let Some(existing) = self
            .favorites
            .find(user.id, input.product_type, input.product_id)
            .await?
        {
            self.favorites.delete(existing.id).await?;
            return Ok(FavoriteToggle { favorited: false });
        }

        self.lookup.require(input.product_type, input.product_id).await?;
        self.favorites
            .create(user.id, input.product_type, input.product_id)
            .await?;
        Ok(FavoriteToggle { favorited: true })
    }

    pub async fn list(&self, user: &User) -> Result<Vec<Favorite>, ServiceError> {
        Ok(self.favorites.list_by_user(user.id).await?)
    }

    pub async fn delete(&self, user: &User, id: i64) -> Result<(), ServiceError> {
        let favorite = self
            .favorites
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Favorite"))?;
        if favorite.user_id != user.id {
            return Err(ServiceError::Forbidden(
                "You can only remove your own favorites".to_string(),
            ));
        }
        self.favorites.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_course, migrated_pool};
    use crate::db::repositories::{SqlxCourseRepository, SqlxFavoriteRepository, SqlxProductRepository};
    use crate::models::{ProductType, UserRole};
    use crate::services::course::tests::user_with_role;

    fn toggle_input(product_id: i64) -> ToggleFavoriteInput {
        ToggleFavoriteInput {
            product_type: ProductType::Course,
            product_id,
        }
    }

    #[tokio::test]
    async fn test_toggle_and_owner_delete() {
        let pool = migrated_pool().await;
        let service = FavoriteService::new(
            SqlxFavoriteRepository::boxed(pool.clone()),
            ProductLookup::new(
                SqlxCourseRepository::boxed(pool.clone()),
                SqlxProductRepository::boxed(pool.clone()),
            ),
        );
        let fan = user_with_role(&pool, "fan@example.com", UserRole::User).await;
        let other = user_with_role(&pool, "other@example.com", UserRole::User).await;
        let course_id = insert_course(&pool, "rust", None).await;

        assert!(service.toggle(&fan, toggle_input(course_id)).await.unwrap().favorited);
        assert!(!service.toggle(&fan, toggle_input(course_id)).await.unwrap().favorited);
        assert!(service.list(&fan).await.unwrap().is_empty());

        assert!(matches!(
            service.toggle(&fan, toggle_input(9999)).await,
            Err(ServiceError::NotFound(_))
        ));

        service.toggle(&fan, toggle_input(course_id)).await.unwrap();
        let favorites = service.list(&fan).await.unwrap();
        assert_eq!(favorites.len(), 1);

        assert!(matches!(
            service.delete(&other, favorites[0].id).await,
            Err(ServiceError::Forbidden(_))
        ));
        service.delete(&fan, favorites[0].id).await.unwrap();
        assert!(service.list(&fan).await.unwrap().is_empty());
    }
}
