//! Player-facing messages in the supported languages

use crate::food::FoodKind;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zh" | "zh-cn" | "cn" => Ok(Language::Zh),
            "en" | "en-us" => Ok(Language::En),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Zh => write!(f, "zh"),
            Language::En => write!(f, "en"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    WalletNotConnected,
    InvalidAccount,
    UserRejected,
    InsufficientFunds,
    AccountNotEmpty,
    CloseFailed(String),
    Closing(String),
    Closed(String),
    LoadFailed,
    NoTokens,
    GameOver(u32),
    Score(u32),
    ClickToClose,
    FoodName(FoodKind),
}

impl Message {
    pub fn text(&self, language: Language) -> String {
        match language {
            Language::Zh => self.zh(),
            Language::En => self.en(),
        }
    }

    fn en(&self) -> String {
        match self {
            Message::WalletNotConnected => "Wallet not connected".to_string(),
            Message::InvalidAccount => "Invalid token account address".to_string(),
            Message::UserRejected => "Transaction was rejected in the wallet".to_string(),
            Message::InsufficientFunds => {
                "Insufficient SOL to pay the transaction fee".to_string()
            }
            Message::AccountNotEmpty => {
                "Token account still holds a balance and cannot be closed".to_string()
            }
            Message::CloseFailed(detail) => format!("Failed to close token account: {detail}"),
            Message::Closing(name) => format!("Closing {name}..."),
            Message::Closed(name) => format!("{name} devoured, rent reclaimed"),
            Message::LoadFailed => "Failed to load tokens".to_string(),
            Message::NoTokens => "No tokens found in this wallet".to_string(),
            Message::GameOver(score) => format!("Game over! Your score: {score}"),
            Message::Score(score) => format!("Score: {score}"),
            Message::ClickToClose => "CLICK TO CLOSE".to_string(),
            Message::FoodName(kind) => match kind {
                FoodKind::Burger => "burger",
                FoodKind::Pizza => "pizza",
                FoodKind::Fries => "fries",
                FoodKind::Sushi => "sushi",
                FoodKind::Cake => "cake",
                FoodKind::IceCream => "ice cream",
            }
            .to_string(),
        }
    }

    fn zh(&self) -> String {
        match self {
            Message::WalletNotConnected => "钱包未连接".to_string(),
            Message::InvalidAccount => "无效的代币账户地址".to_string(),
            Message::UserRejected => "用户拒绝了交易".to_string(),
            Message::InsufficientFunds => "SOL 余额不足以支付交易费用".to_string(),
            Message::AccountNotEmpty => "代币账户仍有余额，无法关闭".to_string(),
            Message::CloseFailed(detail) => format!("关闭代币账户失败: {detail}"),
            Message::Closing(name) => format!("正在关闭 {name}..."),
            Message::Closed(name) => format!("{name} 已被吃掉，租金已退回"),
            Message::LoadFailed => "获取代币失败".to_string(),
            Message::NoTokens => "钱包中没有代币".to_string(),
            Message::GameOver(score) => format!("游戏结束！你的得分：{score}"),
            Message::Score(score) => format!("得分: {score}"),
            Message::ClickToClose => "点击关闭".to_string(),
            Message::FoodName(kind) => match kind {
                FoodKind::Burger => "汉堡",
                FoodKind::Pizza => "披萨",
                FoodKind::Fries => "薯条",
                FoodKind::Sushi => "寿司",
                FoodKind::Cake => "蛋糕",
                FoodKind::IceCream => "冰淇淋",
            }
            .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parsing() {
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert_eq!("zh".parse::<Language>().unwrap(), Language::Zh);
        assert!("fr".parse::<Language>().is_err());
        assert_eq!(Language::default(), Language::Zh);
    }

    #[test]
    fn test_messages_differ_per_language() {
        let msg = Message::GameOver(7);
        assert_eq!(msg.text(Language::En), "Game over! Your score: 7");
        assert_eq!(msg.text(Language::Zh), "游戏结束！你的得分：7");
    }

    #[test]
    fn test_food_names_follow_language() {
        let msg = Message::FoodName(FoodKind::IceCream);
        assert_eq!(msg.text(Language::Zh), "冰淇淋");
        assert_eq!(msg.text(Language::En), "ice cream");
    }
}
