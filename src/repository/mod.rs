//! 持久层：五张表各一个 Repository

pub mod blacklist_repo;
pub mod favorite_repo;
pub mod like_repo;
pub mod search_cache_repo;
pub mod user_repo;

pub use blacklist_repo::BlacklistRepository;
pub use favorite_repo::FavoriteRepository;
pub use like_repo::LikeRepository;
pub use search_cache_repo::SearchCacheRepository;
pub use user_repo::UserRepository;

use sqlx::PgPool;
use std::sync::Arc;

/// 所有仓库的集合（共享同一个连接池）
#[derive(Clone)]
pub struct Storage {
    pub users: UserRepository,
    pub favorites: FavoriteRepository,
    pub blacklist: BlacklistRepository,
    pub likes: LikeRepository,
    pub search_cache: SearchCacheRepository,
}

impl Storage {
    /// 基于连接池创建全部仓库
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            favorites: FavoriteRepository::new(pool.clone()),
            blacklist: BlacklistRepository::new(pool.clone()),
            likes: LikeRepository::new(pool.clone()),
            search_cache: SearchCacheRepository::new(pool),
        }
    }
}
