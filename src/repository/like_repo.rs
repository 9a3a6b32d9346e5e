//! 照片点赞记录仓库 - PostgreSQL 实现
//!
//! 镜像 VK 自身"一人一照片一赞"的语义，避免重复调用 likes.add。

use crate::error::DatabaseError;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

/// 点赞记录仓库（按 (user_id, photo_id) 唯一）
#[derive(Clone)]
pub struct LikeRepository {
    pool: Arc<PgPool>,
}

impl LikeRepository {
    /// 创建新的点赞记录仓库
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 记录一次点赞，幂等：返回 true 表示新增，false 表示该照片已点过
    pub async fn add_like(
        &self,
        user_id: i64,
        owner_vk_id: i64,
        photo_id: i64,
    ) -> Result<bool, DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Database(format!("Failed to begin transaction: {}", e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO photo_likes (user_id, owner_vk_id, photo_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, photo_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(owner_vk_id)
        .bind(photo_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("记录点赞失败: {}", e);
            DatabaseError::Database(format!("Failed to add like: {}", e))
        })?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Database(format!("Failed to commit: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    /// 撤销一条点赞记录（likes.add 调用失败时回滚，用户可重试）
    pub async fn remove_like(&self, user_id: i64, photo_id: i64) -> Result<(), DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Database(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query(
            r#"
            DELETE FROM photo_likes
            WHERE user_id = $1 AND photo_id = $2
            "#,
        )
        .bind(user_id)
        .bind(photo_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("撤销点赞记录失败: {}", e);
            DatabaseError::Database(format!("Failed to remove like: {}", e))
        })?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Database(format!("Failed to commit: {}", e)))?;

        Ok(())
    }

    /// 该照片是否已点过赞
    pub async fn has_liked_photo(
        &self,
        user_id: i64,
        photo_id: i64,
    ) -> Result<bool, DatabaseError> {
        let row: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM photo_likes
            WHERE user_id = $1 AND photo_id = $2
            "#,
        )
        .bind(user_id)
        .bind(photo_id)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| DatabaseError::Database(format!("Failed to check like: {}", e)))?;
        Ok(row.is_some())
    }
}
