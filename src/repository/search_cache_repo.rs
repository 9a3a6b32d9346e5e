//! 搜索结果缓存仓库 - PostgreSQL 实现
//!
//! 平面 TTL 行，键为 (user_id, 规范化参数串)，参数必须完全一致才命中。

use crate::error::DatabaseError;
use crate::model::candidate::Candidate;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

/// 搜索结果缓存仓库
#[derive(Clone)]
pub struct SearchCacheRepository {
    pool: Arc<PgPool>,
}

impl SearchCacheRepository {
    /// 创建新的缓存仓库
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 读取未过期的缓存结果；无命中或已过期返回 None
    pub async fn get_cached_results(
        &self,
        user_id: i64,
        params_key: &str,
    ) -> Result<Option<Vec<Candidate>>, DatabaseError> {
        let row: Option<serde_json::Value> = sqlx::query_scalar(
            r#"
            SELECT results FROM search_cache
            WHERE user_id = $1 AND params = $2 AND expires_at > NOW()
            "#,
        )
        .bind(user_id)
        .bind(params_key)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| DatabaseError::Database(format!("Failed to query search cache: {}", e)))?;

        match row {
            Some(value) => {
                let candidates: Vec<Candidate> = serde_json::from_value(value).map_err(|e| {
                    DatabaseError::Serialization(format!("Cached results are corrupt: {}", e))
                })?;
                Ok(Some(candidates))
            }
            None => Ok(None),
        }
    }

    /// 写入（或覆盖）缓存结果，带 TTL 过期时间
    pub async fn cache_results(
        &self,
        user_id: i64,
        params_key: &str,
        candidates: &[Candidate],
        ttl_secs: i64,
    ) -> Result<(), DatabaseError> {
        let results = serde_json::to_value(candidates)
            .map_err(|e| DatabaseError::Serialization(format!("Failed to serialize: {}", e)))?;
        let expires_at = Utc::now() + Duration::seconds(ttl_secs);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Database(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO search_cache (user_id, params, results, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, params) DO UPDATE SET
                results = EXCLUDED.results,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(user_id)
        .bind(params_key)
        .bind(results)
        .bind(expires_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("写入搜索缓存失败: {}", e);
            DatabaseError::Database(format!("Failed to cache results: {}", e))
        })?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Database(format!("Failed to commit: {}", e)))?;

        Ok(())
    }
}
