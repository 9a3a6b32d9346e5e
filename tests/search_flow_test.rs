//! 搜索流程逻辑测试（不触网、不连库）
//!
//! 覆盖从入站事件分类、搜索参数推导、候选人过滤到浏览游标的完整链路。

use std::collections::HashSet;
use vkmatch_bot::config::{SearchConfig, SessionConfig};
use vkmatch_bot::dispatcher::{classify, Action, Command};
use vkmatch_bot::model::candidate::{filter_candidates, Candidate};
use vkmatch_bot::model::search::SearchParams;
use vkmatch_bot::session::SessionStore;
use vkmatch_bot::vk::longpoll::InboundEvent;
use vkmatch_bot::vk::model::{VkPlace, VkUser};

fn seeker() -> VkUser {
    VkUser {
        id: 1,
        first_name: "Мария".to_string(),
        last_name: "Петрова".to_string(),
        bdate: None,
        city: Some(VkPlace {
            id: 2,
            title: "Санкт-Петербург".to_string(),
        }),
        sex: Some(1),
        is_closed: Some(false),
        has_photo: Some(1),
    }
}

fn found(vk_id: i64, is_closed: bool) -> Candidate {
    Candidate {
        vk_id,
        first_name: "Иван".to_string(),
        last_name: "Иванов".to_string(),
        age: Some(27),
        city: Some("Санкт-Петербург".to_string()),
        is_closed,
    }
}

#[tokio::test]
async fn search_command_to_first_card() {
    // "поиск" 触发搜索
    let event = InboundEvent {
        user_id: 1,
        text: "Поиск".to_string(),
        payload: None,
    };
    assert_eq!(classify(&event), Action::Command(Command::Search));

    // 隐藏生日的资料按默认年龄推导窗口，性别取异性，城市取资料城市
    let config = SearchConfig::default();
    let params = SearchParams::for_profile(&seeker(), &config);
    assert_eq!(params.sex, 2);
    assert_eq!(params.city_id, Some(2));
    assert_eq!(params.age_from, 20);
    assert_eq!(params.age_to, 30);

    // 黑名单、已收藏和封闭资料在入会话前剔除
    let blacklist: HashSet<i64> = [20].into_iter().collect();
    let favorites: HashSet<i64> = [30].into_iter().collect();
    let candidates = filter_candidates(
        vec![found(10, false), found(20, false), found(30, false), found(40, true)],
        &blacklist,
        &favorites,
    );
    let ids: Vec<i64> = candidates.iter().map(|c| c.vk_id).collect();
    assert_eq!(ids, vec![10]);

    // 会话从第一个候选人开始
    let store = SessionStore::new(&SessionConfig::default());
    let session = store.start(1, candidates).await;
    assert_eq!(session.current().unwrap().vk_id, 10);
}

#[tokio::test]
async fn repeated_search_with_same_params_hits_same_cache_key() {
    let config = SearchConfig::default();
    let first = SearchParams::for_profile(&seeker(), &config);
    let second = SearchParams::for_profile(&seeker(), &config);
    assert_eq!(first.cache_key(), second.cache_key());

    // 资料变化（换城市）产生不同的键，旧缓存不会被错误复用
    let mut moved = seeker();
    moved.city = Some(VkPlace {
        id: 1,
        title: "Москва".to_string(),
    });
    let third = SearchParams::for_profile(&moved, &config);
    assert_ne!(first.cache_key(), third.cache_key());
}

#[tokio::test]
async fn browsing_past_the_end_reports_exhaustion_repeatedly() {
    let store = SessionStore::new(&SessionConfig::default());
    store.start(1, vec![found(10, false), found(11, false)]).await;

    store.advance(1).await;
    let session = store.advance(1).await.unwrap();
    assert!(session.is_exhausted());

    // 会话保留，重复 next 反复得到"已耗尽"
    for _ in 0..3 {
        let session = store.advance(1).await.unwrap();
        assert!(session.is_exhausted());
        assert!(session.current().is_none());
    }
}
