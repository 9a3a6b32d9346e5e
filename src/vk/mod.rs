//! VK API 接入层：HTTP 客户端、Long Poll 接收端、键盘构建与响应模型

pub mod client;
pub mod keyboard;
pub mod longpoll;
pub mod model;

pub use client::{VkClient, VkGroup};
pub use keyboard::{ButtonColor, Keyboard};
pub use longpoll::{InboundEvent, LongPollClient, LongPollServer};
pub use model::{top_by_likes, VkItems, VkLikes, VkPhoto, VkPlace, VkUser};
