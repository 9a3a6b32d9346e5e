//! 用户模型（对应 users 表）

use crate::vk::model::VkUser;
use serde::{Deserialize, Serialize};

/// 已知用户（首次交互时入库，重新拉取资料时覆盖字段，从不删除）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// 内部自增 ID
    pub id: i32,
    /// VK 用户 ID（唯一）
    pub vk_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i16>,
    /// 性别：1 = 女，2 = 男
    pub sex: Option<i16>,
    pub city: Option<String>,
}

/// 待入库的用户资料（upsert 输入）
#[derive(Debug, Clone)]
pub struct NewUser {
    pub vk_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i16>,
    pub sex: Option<i16>,
    pub city: Option<String>,
}

impl NewUser {
    /// 从 VK 资料构造
    pub fn from_profile(profile: &VkUser) -> Self {
        Self {
            vk_id: profile.id,
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            age: profile.age().map(|a| a as i16),
            sex: profile.sex.map(|s| s as i16),
            city: profile.city.as_ref().map(|c| c.title.clone()),
        }
    }
}
