//! Bots Long Poll 接收端
//!
//! 流程：groups.getLongPollServer 取得 {server, key, ts}，之后循环
//! GET server?act=a_check。`failed=1` 只需刷新 ts，`failed=2|3` 需要
//! 重新获取 key / server。传输层错误上抛，由主循环退避后继续。

use crate::config::LongPollConfig;
use crate::error::{BotError, Result};
use crate::vk::client::VkClient;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Long Poll 服务器会话（groups.getLongPollServer 响应）
#[derive(Debug, Clone, Deserialize)]
pub struct LongPollServer {
    pub key: String,
    pub server: String,
    pub ts: String,
}

/// 入站事件：一条发给社群的新消息
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// 发送者 VK ID
    pub user_id: i64,
    /// 消息文本
    pub text: String,
    /// 键盘按钮携带的结构化 payload（JSON 字符串）
    pub payload: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    updates: Vec<PollUpdate>,
    #[serde(default)]
    failed: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PollUpdate {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    object: Option<PollObject>,
}

#[derive(Debug, Deserialize)]
struct PollObject {
    #[serde(default)]
    message: Option<PollMessage>,
}

#[derive(Debug, Deserialize)]
struct PollMessage {
    from_id: i64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    payload: Option<String>,
}

/// Long Poll 客户端
pub struct LongPollClient {
    api: VkClient,
    http: reqwest::Client,
    group_id: u64,
    config: LongPollConfig,
    server: Option<LongPollServer>,
}

impl LongPollClient {
    /// 创建新的 Long Poll 客户端（服务器地址惰性获取）
    pub fn new(api: VkClient, group_id: u64, config: LongPollConfig) -> Self {
        Self {
            api,
            http: reqwest::Client::new(),
            group_id,
            config,
            server: None,
        }
    }

    async fn ensure_server(&mut self) -> Result<&LongPollServer> {
        if self.server.is_none() {
            let server = self.api.get_long_poll_server(self.group_id).await?;
            info!("📡 Long Poll 服务器已获取: {}", server.server);
            self.server = Some(server);
        }
        Ok(self.server.as_ref().unwrap())
    }

    /// 接收一批事件（阻塞至多 wait_secs 秒）
    ///
    /// 超时返回空列表；会话失效时自行刷新并返回空列表，
    /// 只有传输错误才上抛。
    pub async fn poll(&mut self) -> Result<Vec<InboundEvent>> {
        let wait = self.config.wait_secs;
        let session = self.ensure_server().await?.clone();

        let url = url::Url::parse_with_params(
            &session.server,
            &[
                ("act", "a_check"),
                ("key", session.key.as_str()),
                ("ts", session.ts.as_str()),
                ("wait", &wait.to_string()),
            ],
        )
        .map_err(|e| BotError::LongPoll(format!("服务器地址无效: {}", e)))?;

        let response: PollResponse = self
            .http
            .get(url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| BotError::LongPoll(format!("响应解析失败: {}", e)))?;

        match response.failed {
            Some(1) => {
                // ts 过期，用响应里的新 ts 继续
                if let (Some(server), Some(ts)) = (self.server.as_mut(), response.ts) {
                    server.ts = ts;
                }
                debug!("Long Poll ts 已刷新");
                return Ok(Vec::new());
            }
            Some(2) | Some(3) => {
                // key 失效或会话信息丢失，下次调用重新获取服务器
                warn!("🔁 Long Poll 会话失效，重新获取服务器");
                self.server = None;
                return Ok(Vec::new());
            }
            Some(code) => {
                self.server = None;
                return Err(BotError::LongPoll(format!("failed={}", code)));
            }
            None => {}
        }

        if let (Some(server), Some(ts)) = (self.server.as_mut(), response.ts) {
            server.ts = ts;
        }

        let events = response
            .updates
            .into_iter()
            .filter(|u| u.kind == "message_new")
            .filter_map(|u| u.object.and_then(|o| o.message))
            .filter(|m| m.from_id > 0)
            .map(|m| InboundEvent {
                user_id: m.from_id,
                text: m.text,
                payload: m.payload,
            })
            .collect();

        Ok(events)
    }
}
