//! 浏览会话存储
//!
//! 每个用户一份 {候选人列表, 游标}，进程内存驻留，不落库。
//! 用 moka 缓存限定容量并按 TTL 驱逐，作为依赖注入给分发器。

use crate::config::SessionConfig;
use crate::model::candidate::Candidate;
use moka::future::Cache;
use std::time::Duration;

/// 一个用户的浏览会话
#[derive(Debug, Clone)]
pub struct BrowseSession {
    /// 过滤后的候选人快照（有序）
    pub candidates: Vec<Candidate>,
    /// 当前游标
    pub index: usize,
}

impl BrowseSession {
    /// 新会话从第一个候选人开始
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            index: 0,
        }
    }

    /// 当前候选人；游标越界（列表耗尽）时返回 None
    pub fn current(&self) -> Option<&Candidate> {
        self.candidates.get(self.index)
    }

    /// 列表是否已耗尽
    pub fn is_exhausted(&self) -> bool {
        self.index >= self.candidates.len()
    }

    /// 前进一位；已到末尾则停在终点（重复 next 反复报告耗尽）
    pub fn advance(&mut self) {
        if self.index < self.candidates.len() {
            self.index += 1;
        }
    }
}

/// 会话存储（按用户 VK ID 索引）
pub struct SessionStore {
    sessions: Cache<i64, BrowseSession>,
}

impl SessionStore {
    /// 创建会话存储，容量与 TTL 来自配置
    pub fn new(config: &SessionConfig) -> Self {
        let sessions = Cache::builder()
            .max_capacity(config.max_sessions)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .build();
        Self { sessions }
    }

    /// 开始新的浏览会话（覆盖旧会话）
    pub async fn start(&self, user_id: i64, candidates: Vec<Candidate>) -> BrowseSession {
        let session = BrowseSession::new(candidates);
        self.sessions.insert(user_id, session.clone()).await;
        session
    }

    /// 读取会话
    pub async fn get(&self, user_id: i64) -> Option<BrowseSession> {
        self.sessions.get(&user_id).await
    }

    /// 游标前进并写回；无会话返回 None
    pub async fn advance(&self, user_id: i64) -> Option<BrowseSession> {
        let mut session = self.sessions.get(&user_id).await?;
        session.advance();
        self.sessions.insert(user_id, session.clone()).await;
        Some(session)
    }
}
