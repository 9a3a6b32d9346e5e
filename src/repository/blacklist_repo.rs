//! 黑名单仓库 - PostgreSQL 实现

use crate::error::DatabaseError;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

/// 黑名单仓库（按 (user_id, blocked_vk_id) 唯一）
#[derive(Clone)]
pub struct BlacklistRepository {
    pool: Arc<PgPool>,
}

impl BlacklistRepository {
    /// 创建新的黑名单仓库
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 拉黑，幂等：返回 true 表示新增，false 表示已在黑名单
    pub async fn add_to_blacklist(
        &self,
        user_id: i64,
        blocked_vk_id: i64,
    ) -> Result<bool, DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Database(format!("Failed to begin transaction: {}", e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO blacklist (user_id, blocked_vk_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, blocked_vk_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(blocked_vk_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("加入黑名单失败: {}", e);
            DatabaseError::Database(format!("Failed to add to blacklist: {}", e))
        })?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Database(format!("Failed to commit: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    /// 全部被拉黑的 VK ID
    pub async fn get_blacklist(&self, user_id: i64) -> Result<Vec<i64>, DatabaseError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT blocked_vk_id FROM blacklist
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| DatabaseError::Database(format!("Failed to query blacklist: {}", e)))
    }

    /// 是否在黑名单中
    pub async fn is_blacklisted(&self, user_id: i64, vk_id: i64) -> Result<bool, DatabaseError> {
        let row: Option<i32> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM blacklist
            WHERE user_id = $1 AND blocked_vk_id = $2
            "#,
        )
        .bind(user_id)
        .bind(vk_id)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| DatabaseError::Database(format!("Failed to check blacklist: {}", e)))?;
        Ok(row.is_some())
    }
}
