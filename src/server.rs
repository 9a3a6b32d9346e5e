//! 机器人主体：组件装配与长轮询主循环

use crate::config::BotConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{BotError, Result};
use crate::infra::Database;
use crate::repository::Storage;
use crate::session::SessionStore;
use crate::vk::{LongPollClient, VkClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// 交友匹配机器人
pub struct MatchBot {
    config: BotConfig,
    dispatcher: Dispatcher,
    long_poll: LongPollClient,
}

impl MatchBot {
    /// 创建机器人：连库、建表、校验令牌、装配分发器
    pub async fn new(config: BotConfig) -> Result<Self> {
        info!("🔧 初始化机器人组件...");

        // 🔌 初始化数据库连接（必须在其他组件之前）
        let database = Database::new(&config.database_url)
            .await
            .map_err(|e| BotError::Database(format!("数据库连接失败: {}", e)))?;

        // 🗄 幂等建表
        database
            .init_schema()
            .await
            .map_err(|e| BotError::Database(format!("建表失败: {}", e)))?;

        // 📦 初始化 Repository 层
        let pool = Arc::new(database.pool().clone());
        let storage = Storage::new(pool);
        info!("✅ Repository 层初始化完成");

        // 🌐 VK API 客户端（社群令牌 + 用户令牌）
        let group_api = VkClient::new(config.group_token.clone(), config.api.clone())?;
        let user_api = VkClient::new(config.user_token.clone(), config.api.clone())?;

        // 🔑 启动阶段校验令牌：授权失败直接致命
        let group = group_api.check_group_token().await.map_err(|e| {
            error!("❌ 社群令牌无效: {}", e);
            e
        })?;
        info!("✅ 成功连接到社群: {} (id={})", group.name, group.id);

        user_api.check_user_token().await.map_err(|e| {
            error!("❌ 用户令牌无效: {}", e);
            e
        })?;
        info!("✅ 用户令牌有效");

        // 🗂 浏览会话存储（容量 + TTL 驱逐）
        let sessions = SessionStore::new(&config.session);

        let dispatcher = Dispatcher::new(
            group_api.clone(),
            user_api,
            storage,
            sessions,
            config.search.clone(),
        );

        let long_poll = LongPollClient::new(group_api, config.group_id, config.long_poll.clone());

        info!("✅ 机器人初始化完成");

        Ok(Self {
            config,
            dispatcher,
            long_poll,
        })
    }

    /// 主循环：单线程协作式，取一批事件、逐个处理完再取下一批
    pub async fn run(&mut self) -> Result<()> {
        info!("🚀 启动 Long Poll 主循环...");

        loop {
            match self.long_poll.poll().await {
                Ok(events) => {
                    for event in events {
                        // 一个事件完整处理完（包括任意次外部调用）才取下一个
                        self.dispatcher.handle_event(event).await;
                    }
                }
                Err(e) => {
                    let backoff = self.config.long_poll.error_backoff_secs;
                    warn!("⚠️ Long Poll 错误: {}，{}s 后继续", e, backoff);
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                }
            }
        }
    }
}
