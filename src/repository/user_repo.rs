//! 用户仓库 - PostgreSQL 实现

use crate::error::DatabaseError;
use crate::model::user::{NewUser, User};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

/// 用户仓库
#[derive(Clone)]
pub struct UserRepository {
    pool: Arc<PgPool>,
}

impl UserRepository {
    /// 创建新的用户仓库
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 插入或覆盖用户资料（重新拉取时字段覆盖，从不删除）
    pub async fn upsert_user(&self, user: &NewUser) -> Result<(), DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Database(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO users (vk_id, first_name, last_name, age, sex, city)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (vk_id) DO UPDATE SET
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                age = EXCLUDED.age,
                sex = EXCLUDED.sex,
                city = EXCLUDED.city
            "#,
        )
        .bind(user.vk_id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.age)
        .bind(user.sex)
        .bind(&user.city)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("用户 upsert 失败: {}", e);
            DatabaseError::Database(format!("Failed to upsert user: {}", e))
        })?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Database(format!("Failed to commit: {}", e)))?;

        Ok(())
    }

    /// 按 VK ID 查找用户
    pub async fn find_by_vk_id(&self, vk_id: i64) -> Result<Option<User>, DatabaseError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, vk_id, first_name, last_name, age, sex, city
            FROM users
            WHERE vk_id = $1
            "#,
        )
        .bind(vk_id)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| DatabaseError::Database(format!("Failed to query user: {}", e)))
    }
}
