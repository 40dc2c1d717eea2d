use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::{AppError, is_unique_violation},
    models::category::{Category, CreateCategoryRequest},
    services::identity::{Capability, Identity},
};

pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<Category>, AppError> {
    let categories = sqlx::query_as("SELECT id, name FROM categories ORDER BY name ASC")
        .fetch_all(pool)
        .await?;

    Ok(categories)
}

pub async fn create_category(
    pool: &SqlitePool,
    identity: &Identity,
    payload: CreateCategoryRequest,
) -> Result<Category, AppError> {
    identity.authorize(Capability::ManageCategories)?;
    payload.validate()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Category name cannot be empty".to_string()));
    }

    let category: Category =
        sqlx::query_as("INSERT INTO categories (name) VALUES (?) RETURNING id, name")
            .bind(name)
            .fetch_one(pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("Category '{name}' already exists"))
                } else {
                    AppError::from(e)
                }
            })?;

    tracing::info!(category_id = category.id, name = %category.name, "category created");
    Ok(category)
}

/// Deletes an unused category. Categories still holding threads are kept.
pub async fn delete_category(pool: &SqlitePool, identity: &Identity, id: i64) -> Result<(), AppError> {
    identity.authorize(Capability::ManageCategories)?;

    let result = sqlx::query(
        "DELETE FROM categories WHERE id = ?1 AND NOT EXISTS (SELECT 1 FROM threads WHERE category_id = ?1)",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM threads WHERE category_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Category still holds {in_use} thread(s)"
            )));
        }
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    tracing::info!(category_id = id, "category deleted");
    Ok(())
}
