//! 搜索参数与年龄窗口推导

use crate::config::SearchConfig;
use crate::vk::model::VkUser;
use serde::{Deserialize, Serialize};

/// users.search 的参数集；其序列化结果同时充当缓存键
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchParams {
    /// 性别：1 = 女，2 = 男，0 = 不限
    pub sex: u8,
    /// 城市 ID（资料未填时不限城市）
    pub city_id: Option<i64>,
    pub age_from: u16,
    pub age_to: u16,
    /// 家庭状况筛选（可选，VK status 码）
    pub status: Option<u8>,
    /// 只要有照片的资料
    pub has_photo: bool,
}

impl SearchParams {
    /// 由搜索者的资料推导参数
    ///
    /// 年龄窗口为 [age - N, age + N]，下界不低于 min_age；
    /// 资料隐藏生日时按 default_age 计。性别取异性，城市取资料城市。
    pub fn for_profile(profile: &VkUser, config: &SearchConfig) -> Self {
        let age = profile.age().unwrap_or(config.default_age);
        Self {
            sex: profile.opposite_sex(),
            city_id: profile.city.as_ref().map(|c| c.id),
            age_from: age.saturating_sub(config.age_window).max(config.min_age),
            age_to: age + config.age_window,
            status: None,
            has_photo: true,
        }
    }

    /// 规范化缓存键（字段顺序固定，相同参数必然得到相同键）
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).expect("search params are always serializable")
    }

    /// 转为 users.search 的查询参数
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("age_from", self.age_from.to_string()),
            ("age_to", self.age_to.to_string()),
        ];
        if self.sex != 0 {
            query.push(("sex", self.sex.to_string()));
        }
        if let Some(city_id) = self.city_id {
            query.push(("city", city_id.to_string()));
        }
        if let Some(status) = self.status {
            query.push(("status", status.to_string()));
        }
        if self.has_photo {
            query.push(("has_photo", "1".to_string()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vk::model::VkPlace;
    use chrono::{Datelike, Utc};

    fn profile(age: Option<u16>, sex: u8) -> VkUser {
        // 用"今年 1 月 1 日出生 + N 年前"构造精确年龄
        let bdate = age.map(|a| format!("01.01.{}", Utc::now().year() - a as i32));
        VkUser {
            id: 10,
            first_name: "Пётр".to_string(),
            last_name: "Сидоров".to_string(),
            bdate,
            city: Some(VkPlace {
                id: 1,
                title: "Москва".to_string(),
            }),
            sex: Some(sex),
            is_closed: Some(false),
            has_photo: Some(1),
        }
    }

    #[test]
    fn age_window_around_25() {
        let params = SearchParams::for_profile(&profile(Some(25), 2), &SearchConfig::default());
        assert_eq!(params.age_from, 20);
        assert_eq!(params.age_to, 30);
        assert_eq!(params.sex, 1);
        assert_eq!(params.city_id, Some(1));
    }

    #[test]
    fn age_window_clamps_to_min_age() {
        let params = SearchParams::for_profile(&profile(Some(20), 1), &SearchConfig::default());
        // 20 - 5 = 15，但下界不低于 18
        assert_eq!(params.age_from, 18);
        assert_eq!(params.age_to, 25);
        assert_eq!(params.sex, 2);
    }

    #[test]
    fn hidden_age_falls_back_to_default() {
        let params = SearchParams::for_profile(&profile(None, 2), &SearchConfig::default());
        assert_eq!(params.age_from, 20);
        assert_eq!(params.age_to, 30);
    }

    #[test]
    fn cache_key_is_deterministic() {
        let a = SearchParams::for_profile(&profile(Some(25), 2), &SearchConfig::default());
        let b = SearchParams::for_profile(&profile(Some(25), 2), &SearchConfig::default());
        let c = SearchParams::for_profile(&profile(Some(30), 2), &SearchConfig::default());
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn query_skips_unset_fields() {
        let mut params = SearchParams::for_profile(&profile(Some(25), 2), &SearchConfig::default());
        params.city_id = None;
        params.sex = 0;
        let query = params.to_query();
        assert!(query.iter().all(|(k, _)| *k != "city" && *k != "sex"));
        assert!(query.iter().any(|(k, v)| *k == "has_photo" && v == "1"));
    }
}
