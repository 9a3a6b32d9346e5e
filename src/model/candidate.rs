//! 浏览会话中的候选人

use crate::vk::model::VkUser;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 候选人：搜索结果的精简快照，进入缓存与浏览会话
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    pub vk_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u16>,
    pub city: Option<String>,
    #[serde(default)]
    pub is_closed: bool,
}

impl Candidate {
    /// 从搜索结果条目构造
    pub fn from_profile(profile: &VkUser) -> Self {
        Self {
            vk_id: profile.id,
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            age: profile.age(),
            city: profile.city.as_ref().map(|c| c.title.clone()),
            is_closed: profile.is_closed.unwrap_or(false),
        }
    }

    /// 个人主页链接
    pub fn profile_url(&self) -> String {
        format!("https://vk.com/id{}", self.vk_id)
    }

    /// 候选人卡片文本
    pub fn card_text(&self) -> String {
        let age = self
            .age
            .map(|a| a.to_string())
            .unwrap_or_else(|| "не указан".to_string());
        let city = self.city.clone().unwrap_or_else(|| "не указан".to_string());
        format!(
            "👤 {} {}\n🎂 Возраст: {}\n🏙️ Город: {}\n🔗 Ссылка: {}",
            self.first_name,
            self.last_name,
            age,
            city,
            self.profile_url()
        )
    }
}

/// 过滤候选人：剔除黑名单、已收藏以及封闭资料
///
/// 不变式：黑名单 / 收藏中的候选人绝不进入浏览会话。
pub fn filter_candidates(
    candidates: Vec<Candidate>,
    blacklist: &HashSet<i64>,
    favorites: &HashSet<i64>,
) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| !c.is_closed && !blacklist.contains(&c.vk_id) && !favorites.contains(&c.vk_id))
        .collect()
}
