//! VK API 响应模型
//!
//! 所有字段在 API 边界一次性反序列化为显式类型，可选字段用 Option 表达，
//! 不做动态字段探测。

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 列表响应包装（items + count）
#[derive(Debug, Clone, Deserialize)]
pub struct VkItems<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub count: Option<i64>,
}

/// 地点（城市 / 国家）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VkPlace {
    pub id: i64,
    pub title: String,
}

/// VK 用户资料
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VkUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// 生日，格式 dd.mm.yyyy；用户可隐藏年份（dd.mm）
    #[serde(default)]
    pub bdate: Option<String>,
    #[serde(default)]
    pub city: Option<VkPlace>,
    /// 性别：1 = 女，2 = 男，0 = 未指定
    #[serde(default)]
    pub sex: Option<u8>,
    #[serde(default)]
    pub is_closed: Option<bool>,
    #[serde(default)]
    pub has_photo: Option<u8>,
}

impl VkUser {
    /// 按生日计算年龄；隐藏年份或未填生日时返回 None
    pub fn age(&self) -> Option<u16> {
        self.age_on(Utc::now().date_naive())
    }

    /// 在指定日期的年龄
    pub fn age_on(&self, today: NaiveDate) -> Option<u16> {
        let bdate = self.bdate.as_deref()?;
        // 完整生日必须是 dd.mm.yyyy
        if bdate.matches('.').count() != 2 {
            return None;
        }
        let born = NaiveDate::parse_from_str(bdate, "%d.%m.%Y").ok()?;
        let mut age = today.year() - born.year();
        if (today.month(), today.day()) < (born.month(), born.day()) {
            age -= 1;
        }
        u16::try_from(age).ok()
    }

    /// 对立性别（搜索默认找异性；未指定时返回 0 即不限）
    pub fn opposite_sex(&self) -> u8 {
        match self.sex {
            Some(1) => 2,
            Some(2) => 1,
            _ => 0,
        }
    }

    /// 个人主页链接
    pub fn profile_url(&self) -> String {
        format!("https://vk.com/id{}", self.id)
    }
}

/// 照片点赞计数
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VkLikes {
    pub count: i64,
    #[serde(default)]
    pub user_likes: Option<i64>,
}

/// VK 照片
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VkPhoto {
    pub id: i64,
    pub owner_id: i64,
    #[serde(default)]
    pub album_id: Option<i64>,
    #[serde(default)]
    pub likes: Option<VkLikes>,
}

impl VkPhoto {
    /// 点赞数（extended=0 时无 likes 字段，按 0 计）
    pub fn like_count(&self) -> i64 {
        self.likes.as_ref().map(|l| l.count).unwrap_or(0)
    }

    /// 消息附件标识：photo<owner_id>_<photo_id>
    pub fn attachment_id(&self) -> String {
        format!("photo{}_{}", self.owner_id, self.id)
    }
}

/// 按点赞数降序取前 top 张照片（同分保持原始顺序）
pub fn top_by_likes(mut photos: Vec<VkPhoto>, top: usize) -> Vec<VkPhoto> {
    photos.sort_by(|a, b| b.like_count().cmp(&a.like_count()));
    photos.truncate(top);
    photos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_bdate(bdate: Option<&str>) -> VkUser {
        VkUser {
            id: 1,
            first_name: "Анна".to_string(),
            last_name: "Иванова".to_string(),
            bdate: bdate.map(|s| s.to_string()),
            city: None,
            sex: Some(1),
            is_closed: Some(false),
            has_photo: Some(1),
        }
    }

    fn photo(id: i64, likes: i64) -> VkPhoto {
        VkPhoto {
            id,
            owner_id: 100,
            album_id: None,
            likes: Some(VkLikes {
                count: likes,
                user_likes: None,
            }),
        }
    }

    #[test]
    fn age_from_full_bdate() {
        let user = user_with_bdate(Some("15.06.2000"));
        let today = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
        assert_eq!(user.age_on(today), Some(25));
    }

    #[test]
    fn age_before_birthday_this_year() {
        let user = user_with_bdate(Some("15.06.2000"));
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert_eq!(user.age_on(today), Some(24));
    }

    #[test]
    fn age_hidden_year_is_none() {
        let user = user_with_bdate(Some("15.06"));
        let today = NaiveDate::from_ymd_opt(2025, 6, 20).unwrap();
        assert_eq!(user.age_on(today), None);
        assert_eq!(user_with_bdate(None).age_on(today), None);
    }

    #[test]
    fn opposite_sex_mapping() {
        let mut user = user_with_bdate(None);
        assert_eq!(user.opposite_sex(), 2);
        user.sex = Some(2);
        assert_eq!(user.opposite_sex(), 1);
        user.sex = None;
        assert_eq!(user.opposite_sex(), 0);
    }

    #[test]
    fn top_photos_ordered_by_likes() {
        let photos = vec![photo(1, 10), photo(2, 5), photo(3, 20)];
        let top = top_by_likes(photos, 3);
        let counts: Vec<i64> = top.iter().map(|p| p.like_count()).collect();
        assert_eq!(counts, vec![20, 10, 5]);
    }

    #[test]
    fn top_photos_ties_keep_original_order() {
        let photos = vec![photo(1, 7), photo(2, 7), photo(3, 9)];
        let top = top_by_likes(photos, 2);
        let ids: Vec<i64> = top.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn photo_attachment_format() {
        assert_eq!(photo(42, 0).attachment_id(), "photo100_42");
    }

    #[test]
    fn user_deserializes_with_missing_optionals() {
        let user: VkUser =
            serde_json::from_str(r#"{"id": 7, "first_name": "Иван", "last_name": "Петров"}"#)
                .unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.city, None);
        assert_eq!(user.age(), None);
    }
}
