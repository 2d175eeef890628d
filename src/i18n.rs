use serde::{Deserialize, Serialize};

use crate::llm::client::ChatMessage;

/// 报告语言类型
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub enum ReportLanguage {
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "en")]
    #[default]
    English,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "ru")]
    Russian,
}

impl std::fmt::Display for ReportLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportLanguage::Chinese => write!(f, "zh"),
            ReportLanguage::English => write!(f, "en"),
            ReportLanguage::Japanese => write!(f, "ja"),
            ReportLanguage::Korean => write!(f, "ko"),
            ReportLanguage::Russian => write!(f, "ru"),
        }
    }
}

impl std::str::FromStr for ReportLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zh" | "chinese" | "中文" => Ok(ReportLanguage::Chinese),
            "en" | "english" | "英文" => Ok(ReportLanguage::English),
            "ja" | "japanese" | "日文" => Ok(ReportLanguage::Japanese),
            "ko" | "korean" | "韩文" => Ok(ReportLanguage::Korean),
            "ru" | "russian" | "俄文" => Ok(ReportLanguage::Russian),
            _ => Err(format!("Unknown report language: {}", s)),
        }
    }
}

impl ReportLanguage {
    /// 从人类消息历史中检测输入语言。
    /// 语言判定只看用户消息，不看研究简报——简报可能已被规范化为其它语言。
    pub fn detect_from_messages(messages: &[ChatMessage]) -> Self {
        let mut han = 0usize;
        let mut kana = 0usize;
        let mut hangul = 0usize;
        let mut cyrillic = 0usize;
        let mut latin = 0usize;

        for message in messages {
            let ChatMessage::User { content } = message else {
                continue;
            };
            for c in content.chars() {
                match c as u32 {
                    0x4E00..=0x9FFF | 0x3400..=0x4DBF => han += 1,
                    0x3040..=0x309F | 0x30A0..=0x30FF => kana += 1,
                    0xAC00..=0xD7AF | 0x1100..=0x11FF => hangul += 1,
                    0x0400..=0x04FF => cyrillic += 1,
                    _ => {
                        if c.is_ascii_alphabetic() {
                            latin += 1;
                        }
                    }
                }
            }
        }

        // 假名、谚文出现即强信号；汉字需压过拉丁字母才判定为中文
        if kana > 0 && kana * 4 >= han {
            return ReportLanguage::Japanese;
        }
        if hangul > 0 {
            return ReportLanguage::Korean;
        }
        if han > 0 && han * 2 >= latin {
            return ReportLanguage::Chinese;
        }
        if cyrillic > latin {
            return ReportLanguage::Russian;
        }
        ReportLanguage::English
    }

    /// 获取语言的描述性名称
    pub fn display_name(&self) -> &'static str {
        match self {
            ReportLanguage::Chinese => "中文",
            ReportLanguage::English => "English",
            ReportLanguage::Japanese => "日本語",
            ReportLanguage::Korean => "한국어",
            ReportLanguage::Russian => "Русский",
        }
    }

    /// 获取语言的提示词指令，拼接到最终报告提示词中
    pub fn prompt_instruction(&self) -> &'static str {
        match self {
            ReportLanguage::Chinese => "用户的消息是中文的，请务必使用中文撰写整份报告，确保语言表达准确、专业、易于理解。",
            ReportLanguage::English => {
                "The user's messages are in English. Write the entire report in English, ensuring accurate, professional, and easy-to-understand language."
            }
            ReportLanguage::Japanese => {
                "ユーザーのメッセージは日本語です。レポート全体を必ず日本語で作成してください。"
            }
            ReportLanguage::Korean => {
                "사용자의 메시지는 한국어입니다. 보고서 전체를 반드시 한국어로 작성해 주세요."
            }
            ReportLanguage::Russian => {
                "Сообщения пользователя написаны на русском языке. Обязательно напишите весь отчёт на русском языке."
            }
        }
    }
}
