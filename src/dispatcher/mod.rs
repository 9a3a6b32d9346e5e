//! 事件分发器
//!
//! 每个入站事件只分类一次：先尝试解析为结构化按钮 payload，
//! 不是 JSON 时按文本命令处理，是 JSON 但不认识时回复"未知操作"。
//! 随后路由到固定的一组处理器：开始搜索 / 下一位 / 收藏列表 /
//! 加收藏 / 拉黑 / 点赞。

use crate::config::SearchConfig;
use crate::error::Result;
use crate::model::candidate::{filter_candidates, Candidate};
use crate::model::search::SearchParams;
use crate::model::user::NewUser;
use crate::repository::Storage;
use crate::session::SessionStore;
use crate::vk::keyboard::{ButtonColor, Keyboard};
use crate::vk::longpoll::InboundEvent;
use crate::vk::model::VkUser;
use crate::vk::VkClient;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use tracing::{error, info, warn};

/// 键盘按钮携带的结构化动作
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionPayload {
    /// 收藏当前候选人
    AddFav { user_id: i64 },
    /// 给照片点赞（旧版键盘可能只带 user_id，没有 owner_id）
    Like {
        photo_id: i64,
        #[serde(default)]
        owner_id: Option<i64>,
        #[serde(default)]
        user_id: Option<i64>,
    },
    /// 下一位候选人
    Next,
    /// 拉黑当前候选人
    Block { user_id: i64 },
}

impl ActionPayload {
    /// 点赞动作的照片所有者（owner_id 缺失时回退到 user_id）
    pub fn like_owner(&self) -> Option<i64> {
        match self {
            ActionPayload::Like {
                owner_id, user_id, ..
            } => owner_id.or(*user_id),
            _ => None,
        }
    }
}

/// 文本命令词表（大小写不敏感）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Greeting,
    Search,
    Favorites,
    Unknown,
}

impl Command {
    /// 解析文本命令
    pub fn parse(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "привет" | "начать" | "старт" => Command::Greeting,
            "поиск" => Command::Search,
            "избранное" => Command::Favorites,
            _ => Command::Unknown,
        }
    }
}

/// 分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// 合法的结构化动作
    Payload(ActionPayload),
    /// 是 JSON 但不是已知动作
    InvalidPayload,
    /// 文本命令
    Command(Command),
}

/// 对入站事件做一次性分类
///
/// payload 不是合法 JSON 时退回文本处理（与按钮标签文本兼容）；
/// 是 JSON 但结构不认识时报告未知操作。
pub fn classify(event: &InboundEvent) -> Action {
    if let Some(raw) = &event.payload {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) {
            return match serde_json::from_value::<ActionPayload>(value) {
                Ok(action) => Action::Payload(action),
                Err(e) => {
                    warn!("无法识别的 payload: {} ({})", raw, e);
                    Action::InvalidPayload
                }
            };
        }
    }
    Action::Command(Command::parse(&event.text))
}

/// 事件分发器
pub struct Dispatcher {
    /// 社群令牌客户端：收发消息
    group_api: VkClient,
    /// 用户令牌客户端：资料 / 搜索 / 照片 / 点赞
    user_api: VkClient,
    storage: Storage,
    sessions: SessionStore,
    search_config: SearchConfig,
}

impl Dispatcher {
    /// 创建分发器
    pub fn new(
        group_api: VkClient,
        user_api: VkClient,
        storage: Storage,
        sessions: SessionStore,
        search_config: SearchConfig,
    ) -> Self {
        Self {
            group_api,
            user_api,
            storage,
            sessions,
            search_config,
        }
    }

    /// 处理一个入站事件（错误在此兜底，不会中断主循环）
    pub async fn handle_event(&self, event: InboundEvent) {
        let user_id = event.user_id;
        let result = match classify(&event) {
            Action::Payload(action) => self.handle_payload(user_id, action).await,
            Action::InvalidPayload => {
                self.send(user_id, "⚠️ Неизвестное действие").await;
                Ok(())
            }
            Action::Command(command) => self.handle_text(user_id, command).await,
        };

        if let Err(e) = result {
            error!("处理事件失败 (user {}): {}", user_id, e);
            self.send(
                user_id,
                "❌ Произошла ошибка при обработке команды. Попробуйте позже.",
            )
            .await;
        }
    }

    /// 处理结构化动作
    async fn handle_payload(&self, user_id: i64, action: ActionPayload) -> Result<()> {
        match action {
            ActionPayload::AddFav { user_id: fav_id } => self.add_favorite(user_id, fav_id).await,
            ActionPayload::Like {
                photo_id,
                owner_id,
                user_id: photo_user_id,
            } => {
                // owner_id 缺失时回退到 user_id（旧版键盘 payload）
                let Some(owner_id) = owner_id.or(photo_user_id) else {
                    warn!("like payload 缺少 owner_id: user {}", user_id);
                    self.send(user_id, "❌ Ошибка: не указан владелец фото").await;
                    return Ok(());
                };
                self.like(user_id, owner_id, photo_id).await
            }
            ActionPayload::Next => self.show_next(user_id).await,
            ActionPayload::Block { user_id: block_id } => self.block(user_id, block_id).await,
        }
    }

    /// 处理文本命令
    async fn handle_text(&self, user_id: i64, command: Command) -> Result<()> {
        match command {
            Command::Greeting => {
                self.send_with(
                    user_id,
                    "👋 Привет! Я бот для знакомств.\n\
                     🔍 Начни поиск командой 'поиск'\n\
                     ⭐ Посмотреть избранное: 'избранное'",
                    Some(main_keyboard()),
                    None,
                )
                .await;
                Ok(())
            }
            Command::Search => self.start_search(user_id).await,
            Command::Favorites => self.show_favorites(user_id).await,
            Command::Unknown => {
                self.send_with(
                    user_id,
                    "ℹ️ Используйте кнопки или команды:\n\
                     🔍 'поиск' - начать поиск\n\
                     ⭐ 'избранное' - ваши избранные",
                    Some(main_keyboard()),
                    None,
                )
                .await;
                Ok(())
            }
        }
    }

    /// 开始新搜索：拉资料 → 推导窗口 → 查缓存 → 过滤 → 建会话
    async fn start_search(&self, user_id: i64) -> Result<()> {
        info!("🔍 用户 {} 开始搜索", user_id);

        let Some(profile) = self.user_api.get_user(user_id).await? else {
            self.send(user_id, "❌ Не удалось получить ваши данные").await;
            return Ok(());
        };

        // 首次搜索时入库，重复搜索时覆盖资料
        self.storage
            .users
            .upsert_user(&NewUser::from_profile(&profile))
            .await?;

        let params = SearchParams::for_profile(&profile, &self.search_config);
        let key = params.cache_key();

        let candidates = match self
            .storage
            .search_cache
            .get_cached_results(user_id, &key)
            .await?
        {
            Some(cached) => {
                info!("📦 缓存命中: user {}，{} 个候选人", user_id, cached.len());
                cached
            }
            None => {
                let found = self
                    .user_api
                    .search_users(&params, self.search_config.page_size)
                    .await?;
                let candidates: Vec<Candidate> =
                    found.iter().map(Candidate::from_profile).collect();
                if !candidates.is_empty() {
                    self.storage
                        .search_cache
                        .cache_results(
                            user_id,
                            &key,
                            &candidates,
                            self.search_config.cache_ttl_secs,
                        )
                        .await?;
                }
                candidates
            }
        };

        // 不变式：黑名单 / 已收藏的候选人不得进入会话
        let blacklist: HashSet<i64> = self
            .storage
            .blacklist
            .get_blacklist(user_id)
            .await?
            .into_iter()
            .collect();
        let favorites: HashSet<i64> = self
            .storage
            .favorites
            .get_favorites(user_id)
            .await?
            .into_iter()
            .collect();
        let candidates = filter_candidates(candidates, &blacklist, &favorites);

        if candidates.is_empty() {
            self.send(user_id, "😔 Нет подходящих пользователей").await;
            return Ok(());
        }

        info!("✅ user {}: {} 个候选人进入会话", user_id, candidates.len());
        self.sessions.start(user_id, candidates).await;
        self.show_current(user_id).await
    }

    /// 展示当前候选人卡片；没有照片的候选人按"下一位"跳过
    async fn show_current(&self, user_id: i64) -> Result<()> {
        loop {
            let Some(session) = self.sessions.get(user_id).await else {
                self.send(user_id, "🔍 Начните поиск командой 'поиск'").await;
                return Ok(());
            };

            let Some(candidate) = session.current().cloned() else {
                // 列表耗尽：会话保留，重复 next 重复此消息
                self.send(user_id, "😔 Пользователи закончились").await;
                return Ok(());
            };

            let photos = match self
                .user_api
                .get_top_photos(candidate.vk_id, self.search_config.photo_top)
                .await
            {
                Ok(photos) => photos,
                Err(e) => {
                    warn!("获取照片失败 (候选人 {}): {}", candidate.vk_id, e);
                    Vec::new()
                }
            };

            if photos.is_empty() {
                self.sessions.advance(user_id).await;
                continue;
            }

            let attachment = photos
                .iter()
                .map(|p| p.attachment_id())
                .collect::<Vec<_>>()
                .join(",");
            let keyboard = candidate_keyboard(candidate.vk_id, photos[0].owner_id, photos[0].id);

            self.send_with(
                user_id,
                &candidate.card_text(),
                Some(keyboard),
                Some(attachment),
            )
            .await;
            return Ok(());
        }
    }

    /// 下一位候选人
    async fn show_next(&self, user_id: i64) -> Result<()> {
        if self.sessions.advance(user_id).await.is_none() {
            self.send(user_id, "🔍 Начните поиск командой 'поиск'").await;
            return Ok(());
        }
        self.show_current(user_id).await
    }

    /// 收藏候选人（幂等）
    async fn add_favorite(&self, user_id: i64, fav_id: i64) -> Result<()> {
        if self.storage.favorites.add_favorite(user_id, fav_id).await? {
            self.send(user_id, "✅ Пользователь добавлен в избранное!")
                .await;
        } else {
            self.send(user_id, "⚠️ Пользователь уже в избранном").await;
        }
        Ok(())
    }

    /// 拉黑候选人，成功后等同于"下一位"
    async fn block(&self, user_id: i64, block_id: i64) -> Result<()> {
        if self
            .storage
            .blacklist
            .add_to_blacklist(user_id, block_id)
            .await?
        {
            self.send(user_id, "🚫 Пользователь добавлен в ЧС").await;
            self.show_next(user_id).await
        } else {
            self.send(user_id, "⚠️ Пользователь уже в ЧС").await;
            Ok(())
        }
    }

    /// 给照片点赞：先落库去重，再调 API，重复点赞不触发请求
    ///
    /// API 调用失败时撤销落库记录，否则瞬时故障会永久挡住这次点赞。
    async fn like(&self, user_id: i64, owner_id: i64, photo_id: i64) -> Result<()> {
        if self.storage.likes.has_liked_photo(user_id, photo_id).await? {
            self.send(user_id, "⚠️ Вы уже лайкали это фото").await;
            return Ok(());
        }

        self.storage
            .likes
            .add_like(user_id, owner_id, photo_id)
            .await?;

        match self.user_api.like_photo(owner_id, photo_id).await {
            Ok(_) => self.send(user_id, "❤️ Лайк поставлен!").await,
            Err(e) => {
                error!("点赞失败 (photo {}): {}", photo_id, e);
                if let Err(db_err) = self.storage.likes.remove_like(user_id, photo_id).await {
                    error!("撤销点赞记录失败 (photo {}): {}", photo_id, db_err);
                }
                self.send(user_id, "❌ Не удалось поставить лайк").await;
            }
        }
        Ok(())
    }

    /// 收藏列表（前 10 个，批量拉取资料补上姓名）
    async fn show_favorites(&self, user_id: i64) -> Result<()> {
        let favorites = self.storage.favorites.get_favorites(user_id).await?;
        if favorites.is_empty() {
            self.send(user_id, "⭐ Список избранных пуст").await;
            return Ok(());
        }

        let shown: Vec<i64> = favorites.into_iter().take(10).collect();
        let profiles = match self.user_api.get_users(&shown).await {
            Ok(profiles) => profiles,
            Err(e) => {
                // 资料拉不到就只给链接
                warn!("获取收藏资料失败 (user {}): {}", user_id, e);
                Vec::new()
            }
        };
        let message = format!(
            "⭐ Ваши избранные:\n{}",
            favorites_lines(&shown, &profiles).join("\n")
        );

        self.send_with(user_id, &message, Some(main_keyboard()), None)
            .await;
        Ok(())
    }

    /// 发送纯文本消息（发送失败只记日志，不上抛）
    async fn send(&self, user_id: i64, text: &str) {
        self.send_with(user_id, text, None, None).await;
    }

    /// 发送消息（可带键盘与照片附件）
    async fn send_with(
        &self,
        user_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
        attachment: Option<String>,
    ) {
        let keyboard = keyboard.map(|k| k.to_json());
        if let Err(e) = self
            .group_api
            .send_message(user_id, text, keyboard, attachment)
            .await
        {
            error!("发送消息失败 (user {}): {}", user_id, e);
        }
    }
}

/// 收藏列表行：有资料时显示姓名，没有时只给链接
fn favorites_lines(vk_ids: &[i64], profiles: &[VkUser]) -> Vec<String> {
    vk_ids
        .iter()
        .enumerate()
        .map(|(i, vk_id)| match profiles.iter().find(|p| p.id == *vk_id) {
            Some(p) => format!(
                "{}. {} {} - vk.com/id{}",
                i + 1,
                p.first_name,
                p.last_name,
                vk_id
            ),
            None => format!("{}. vk.com/id{}", i + 1, vk_id),
        })
        .collect()
}

/// 主键盘：搜索 / 收藏
fn main_keyboard() -> Keyboard {
    Keyboard::new(false)
        .add_button("Поиск", ButtonColor::Primary, None)
        .add_button("Избранное", ButtonColor::Positive, None)
}

/// 候选人卡片的内联键盘
fn candidate_keyboard(candidate_vk_id: i64, photo_owner_id: i64, photo_id: i64) -> Keyboard {
    Keyboard::inline()
        .add_button(
            "❤️ Лайк",
            ButtonColor::Positive,
            Some(json!({"type": "like", "photo_id": photo_id, "owner_id": photo_owner_id})),
        )
        .add_button(
            "⭐ В избранное",
            ButtonColor::Primary,
            Some(json!({"type": "add_fav", "user_id": candidate_vk_id})),
        )
        .add_row()
        .add_button(
            "🚫 В ЧС",
            ButtonColor::Negative,
            Some(json!({"type": "block", "user_id": candidate_vk_id})),
        )
        .add_button(
            "➡️ Далее",
            ButtonColor::Secondary,
            Some(json!({"type": "next"})),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(text: &str, payload: Option<&str>) -> InboundEvent {
        InboundEvent {
            user_id: 1,
            text: text.to_string(),
            payload: payload.map(|s| s.to_string()),
        }
    }

    #[test]
    fn classify_add_fav_payload() {
        let action = classify(&event("", Some(r#"{"type": "add_fav", "user_id": 42}"#)));
        assert_eq!(
            action,
            Action::Payload(ActionPayload::AddFav { user_id: 42 })
        );
    }

    #[test]
    fn classify_like_with_owner_fallback() {
        let action = classify(&event("", Some(r#"{"type": "like", "photo_id": 5, "user_id": 9}"#)));
        let Action::Payload(payload) = action else {
            panic!("expected payload");
        };
        assert_eq!(payload.like_owner(), Some(9));
    }

    #[test]
    fn classify_next_and_block() {
        assert_eq!(
            classify(&event("", Some(r#"{"type": "next"}"#))),
            Action::Payload(ActionPayload::Next)
        );
        assert_eq!(
            classify(&event("", Some(r#"{"type": "block", "user_id": 3}"#))),
            Action::Payload(ActionPayload::Block { user_id: 3 })
        );
    }

    #[test]
    fn classify_unknown_json_payload() {
        let action = classify(&event("", Some(r#"{"type": "self_destruct"}"#)));
        assert_eq!(action, Action::InvalidPayload);
    }

    #[test]
    fn classify_non_json_payload_falls_back_to_text() {
        let action = classify(&event("поиск", Some("not json")));
        assert_eq!(action, Action::Command(Command::Search));
    }

    #[test]
    fn commands_are_case_insensitive() {
        assert_eq!(Command::parse("Поиск"), Command::Search);
        assert_eq!(Command::parse("ИЗБРАННОЕ"), Command::Favorites);
        assert_eq!(Command::parse("Привет"), Command::Greeting);
        assert_eq!(Command::parse("старт"), Command::Greeting);
    }

    #[test]
    fn unknown_text_maps_to_help() {
        assert_eq!(Command::parse("что ты умеешь?"), Command::Unknown);
        assert_eq!(Command::parse(""), Command::Unknown);
    }

    #[test]
    fn favorites_lines_show_names_when_profiles_known() {
        let profile = VkUser {
            id: 42,
            first_name: "Анна".to_string(),
            last_name: "Иванова".to_string(),
            bdate: None,
            city: None,
            sex: Some(1),
            is_closed: Some(false),
            has_photo: Some(1),
        };
        let lines = favorites_lines(&[42, 99], &[profile]);
        assert_eq!(lines[0], "1. Анна Иванова - vk.com/id42");
        // 资料缺失的收藏退化为纯链接
        assert_eq!(lines[1], "2. vk.com/id99");
    }

    #[test]
    fn candidate_keyboard_payloads_round_trip() {
        let kb = candidate_keyboard(42, 100, 7).to_json();
        let value: serde_json::Value = serde_json::from_str(&kb).unwrap();
        let like_raw = value["buttons"][0][0]["action"]["payload"].as_str().unwrap();
        let like: ActionPayload = serde_json::from_str(like_raw).unwrap();
        assert_eq!(like.like_owner(), Some(100));

        let block_raw = value["buttons"][1][0]["action"]["payload"].as_str().unwrap();
        let block: ActionPayload = serde_json::from_str(block_raw).unwrap();
        assert_eq!(block, ActionPayload::Block { user_id: 42 });
    }
}
