//! VK 消息键盘构建器
//!
//! 生成 messages.send 的 keyboard 参数 JSON。按钮 payload 是一个
//! JSON 字符串（VK 的约定），机器人在 message_new 事件中原样收回。

use serde_json::{json, Value};

/// 按钮颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonColor {
    Primary,
    Secondary,
    Positive,
    Negative,
}

impl ButtonColor {
    fn as_str(self) -> &'static str {
        match self {
            ButtonColor::Primary => "primary",
            ButtonColor::Secondary => "secondary",
            ButtonColor::Positive => "positive",
            ButtonColor::Negative => "negative",
        }
    }
}

/// 键盘构建器
#[derive(Debug, Clone)]
pub struct Keyboard {
    one_time: bool,
    inline: bool,
    rows: Vec<Vec<Value>>,
}

impl Keyboard {
    /// 创建新键盘
    pub fn new(one_time: bool) -> Self {
        Self {
            one_time,
            inline: false,
            rows: vec![Vec::new()],
        }
    }

    /// 内联键盘（附在消息下方）
    pub fn inline() -> Self {
        Self {
            one_time: false,
            inline: true,
            rows: vec![Vec::new()],
        }
    }

    /// 在当前行追加一个文本按钮
    pub fn add_button(mut self, label: &str, color: ButtonColor, payload: Option<Value>) -> Self {
        let mut action = json!({
            "type": "text",
            "label": label,
        });
        if let Some(payload) = payload {
            // payload 必须是字符串形式的 JSON
            action["payload"] = Value::String(payload.to_string());
        }
        let button = json!({
            "action": action,
            "color": color.as_str(),
        });
        self.rows
            .last_mut()
            .expect("keyboard always has a current row")
            .push(button);
        self
    }

    /// 换行
    pub fn add_row(mut self) -> Self {
        self.rows.push(Vec::new());
        self
    }

    /// 序列化为 messages.send 的 keyboard 参数
    pub fn to_json(&self) -> String {
        let rows: Vec<&Vec<Value>> = self.rows.iter().filter(|r| !r.is_empty()).collect();
        let mut keyboard = json!({
            "one_time": self.one_time,
            "buttons": rows,
        });
        if self.inline {
            keyboard["inline"] = Value::Bool(true);
            // inline 键盘不允许 one_time 字段
            keyboard.as_object_mut().unwrap().remove("one_time");
        }
        keyboard.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_json_shape() {
        let kb = Keyboard::new(false)
            .add_button("Поиск", ButtonColor::Primary, None)
            .add_button("Избранное", ButtonColor::Positive, None);
        let value: Value = serde_json::from_str(&kb.to_json()).unwrap();

        assert_eq!(value["one_time"], Value::Bool(false));
        let buttons = value["buttons"].as_array().unwrap();
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].as_array().unwrap().len(), 2);
        assert_eq!(buttons[0][0]["action"]["label"], "Поиск");
        assert_eq!(buttons[0][0]["color"], "primary");
    }

    #[test]
    fn inline_keyboard_payload_is_string() {
        let kb = Keyboard::inline().add_button(
            "❤️",
            ButtonColor::Positive,
            Some(json!({"type": "like", "photo_id": 5, "owner_id": 9})),
        );
        let value: Value = serde_json::from_str(&kb.to_json()).unwrap();

        assert_eq!(value["inline"], Value::Bool(true));
        assert!(value.get("one_time").is_none());
        let payload = value["buttons"][0][0]["action"]["payload"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed["type"], "like");
        assert_eq!(parsed["photo_id"], 5);
    }

    #[test]
    fn empty_rows_are_dropped() {
        let kb = Keyboard::new(true)
            .add_button("Ок", ButtonColor::Secondary, None)
            .add_row();
        let value: Value = serde_json::from_str(&kb.to_json()).unwrap();
        assert_eq!(value["buttons"].as_array().unwrap().len(), 1);
    }
}
