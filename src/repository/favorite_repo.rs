//! 收藏仓库 - PostgreSQL 实现

use crate::error::DatabaseError;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

/// 收藏仓库（按 (user_id, favorite_vk_id) 唯一）
#[derive(Clone)]
pub struct FavoriteRepository {
    pool: Arc<PgPool>,
}

impl FavoriteRepository {
    /// 创建新的收藏仓库
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 添加收藏，幂等：返回 true 表示新增，false 表示已存在
    pub async fn add_favorite(
        &self,
        user_id: i64,
        favorite_vk_id: i64,
    ) -> Result<bool, DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Database(format!("Failed to begin transaction: {}", e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO favorites (user_id, favorite_vk_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, favorite_vk_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(favorite_vk_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("添加收藏失败: {}", e);
            DatabaseError::Database(format!("Failed to add favorite: {}", e))
        })?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Database(format!("Failed to commit: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    /// 全部收藏的 VK ID（按添加时间）
    pub async fn get_favorites(&self, user_id: i64) -> Result<Vec<i64>, DatabaseError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT favorite_vk_id FROM favorites
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| DatabaseError::Database(format!("Failed to query favorites: {}", e)))
    }

    /// 是否已收藏
    pub async fn is_favorite(&self, user_id: i64, vk_id: i64) -> Result<bool, DatabaseError> {
        let row: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM favorites
            WHERE user_id = $1 AND favorite_vk_id = $2
            "#,
        )
        .bind(user_id)
        .bind(vk_id)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| DatabaseError::Database(format!("Failed to check favorite: {}", e)))?;
        Ok(row.is_some())
    }
}
