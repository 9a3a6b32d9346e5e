//! VK API 客户端
//!
//! 所有调用走 https://api.vk.com/method/<name>，响应为
//! `{"response": ...}` 或 `{"error": {...}}` 信封。限流（错误码 6）
//! 按固定延迟重试一次，其余错误直接上抛给调用方。

use crate::config::ApiConfig;
use crate::error::{BotError, Result};
use crate::model::search::SearchParams;
use crate::vk::longpoll::LongPollServer;
use crate::vk::model::{top_by_likes, VkItems, VkPhoto, VkUser};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// users.get / users.search 请求的附加字段集
const USER_FIELDS: &str = "bdate,city,sex,is_closed,has_photo";

/// VK API 错误信封体
#[derive(Debug, Deserialize)]
struct VkErrorBody {
    error_code: i64,
    error_msg: String,
}

/// VK API 响应信封
#[derive(Debug, Deserialize)]
struct VkEnvelope<T> {
    response: Option<T>,
    error: Option<VkErrorBody>,
}

/// groups.getById 响应（v5.199 起包装在 groups 数组中）
#[derive(Debug, Deserialize)]
pub struct VkGroups {
    pub groups: Vec<VkGroup>,
}

/// 社群信息
#[derive(Debug, Clone, Deserialize)]
pub struct VkGroup {
    pub id: i64,
    pub name: String,
}

/// likes.add 响应
#[derive(Debug, Deserialize)]
struct VkLikesAdded {
    likes: i64,
}

/// messages.send 只关心是否成功，响应内容忽略
#[derive(Debug, Deserialize)]
struct VkMessageId(#[allow(dead_code)] serde_json::Value);

/// VK API 客户端（每个令牌一个实例）
#[derive(Clone)]
pub struct VkClient {
    http: reqwest::Client,
    token: String,
    config: ApiConfig,
}

impl VkClient {
    /// 创建新的客户端
    pub fn new(token: String, config: ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| BotError::Configuration(format!("HTTP 客户端创建失败: {}", e)))?;

        Ok(Self {
            http,
            token,
            config,
        })
    }

    /// 调用一个 API 方法（限流时重试一次）
    async fn call<T: DeserializeOwned>(&self, name: &str, params: &[(&str, String)]) -> Result<T> {
        let mut retried = false;
        loop {
            match self.call_once(name, params).await {
                Err(e) if e.is_rate_limit() && !retried => {
                    retried = true;
                    warn!(
                        "⏳ VK 限流: {}，{}ms 后重试",
                        name, self.config.rate_limit_retry_ms
                    );
                    tokio::time::sleep(Duration::from_millis(self.config.rate_limit_retry_ms))
                        .await;
                }
                other => return other,
            }
        }
    }

    async fn call_once<T: DeserializeOwned>(
        &self,
        name: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.config.base_url, name);

        let mut form: Vec<(&str, String)> = Vec::with_capacity(params.len() + 2);
        form.extend_from_slice(params);
        form.push(("access_token", self.token.clone()));
        form.push(("v", self.config.version.clone()));

        debug!("→ VK API: {}", name);

        let envelope: VkEnvelope<T> = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| BotError::Serialization(format!("{} 响应解析失败: {}", name, e)))?;

        if let Some(err) = envelope.error {
            return Err(BotError::from_api_code(err.error_code, err.error_msg));
        }
        envelope
            .response
            .ok_or_else(|| BotError::Serialization(format!("{} 响应缺少 response 字段", name)))
    }

    /// 获取单个用户资料
    pub async fn get_user(&self, user_id: i64) -> Result<Option<VkUser>> {
        let users: Vec<VkUser> = self
            .call(
                "users.get",
                &[
                    ("user_ids", user_id.to_string()),
                    ("fields", USER_FIELDS.to_string()),
                ],
            )
            .await?;
        Ok(users.into_iter().next())
    }

    /// 批量获取用户资料
    pub async fn get_users(&self, user_ids: &[i64]) -> Result<Vec<VkUser>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = user_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.call(
            "users.get",
            &[("user_ids", ids), ("fields", USER_FIELDS.to_string())],
        )
        .await
    }

    /// 按条件搜索候选人（单页，固定页大小）
    pub async fn search_users(&self, params: &SearchParams, count: u32) -> Result<Vec<VkUser>> {
        let mut query = params.to_query();
        query.push(("count", count.to_string()));
        query.push(("fields", USER_FIELDS.to_string()));

        let result: VkItems<VkUser> = self.call("users.search", &query).await?;
        Ok(result.items)
    }

    /// 获取用户头像相册中按点赞数排名前 top 的照片
    pub async fn get_top_photos(&self, owner_id: i64, top: usize) -> Result<Vec<VkPhoto>> {
        let result: VkItems<VkPhoto> = self
            .call(
                "photos.get",
                &[
                    ("owner_id", owner_id.to_string()),
                    ("album_id", "profile".to_string()),
                    ("extended", "1".to_string()),
                    ("count", "1000".to_string()),
                ],
            )
            .await?;
        Ok(top_by_likes(result.items, top))
    }

    /// 给照片点赞，返回点赞总数（需用户令牌）
    pub async fn like_photo(&self, owner_id: i64, photo_id: i64) -> Result<i64> {
        let result: VkLikesAdded = self
            .call(
                "likes.add",
                &[
                    ("type", "photo".to_string()),
                    ("owner_id", owner_id.to_string()),
                    ("item_id", photo_id.to_string()),
                ],
            )
            .await?;
        Ok(result.likes)
    }

    /// 发送消息（文本 + 可选键盘 + 可选照片附件）
    pub async fn send_message(
        &self,
        peer_id: i64,
        text: &str,
        keyboard: Option<String>,
        attachment: Option<String>,
    ) -> Result<()> {
        let mut params = vec![
            ("user_id", peer_id.to_string()),
            ("message", text.to_string()),
            ("random_id", fastrand::i32(..).to_string()),
            ("dont_parse_links", "1".to_string()),
        ];
        if let Some(kb) = keyboard {
            params.push(("keyboard", kb));
        }
        if let Some(att) = attachment {
            params.push(("attachment", att));
        }

        let _: VkMessageId = self.call("messages.send", &params).await?;
        Ok(())
    }

    /// 校验社群令牌（groups.getById；授权失败在启动阶段致命）
    pub async fn check_group_token(&self) -> Result<VkGroup> {
        let groups: VkGroups = self.call("groups.getById", &[]).await?;
        groups
            .groups
            .into_iter()
            .next()
            .ok_or_else(|| BotError::Auth("groups.getById 返回空结果".to_string()))
    }

    /// 校验用户令牌（users.get 自身）
    pub async fn check_user_token(&self) -> Result<()> {
        let _: Vec<VkUser> = self.call("users.get", &[]).await?;
        Ok(())
    }

    /// 获取 Bots Long Poll 服务器地址
    pub async fn get_long_poll_server(&self, group_id: u64) -> Result<LongPollServer> {
        self.call(
            "groups.getLongPollServer",
            &[("group_id", group_id.to_string())],
        )
        .await
    }
}
