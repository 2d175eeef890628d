/// Token估算器，用于估算文本的token数量并推导截断预算
pub struct TokenEstimator {
    rules: TokenCalculationRules,
}

/// Token计算规则
#[derive(Debug, Clone)]
pub struct TokenCalculationRules {
    /// 英文字符的平均token比例（字符数/token数）
    pub english_char_per_token: f64,
    /// 中文字符的平均token比例
    pub chinese_char_per_token: f64,
    /// 基础token开销（系统prompt等）
    pub base_token_overhead: usize,
}

impl Default for TokenCalculationRules {
    fn default() -> Self {
        Self {
            // 基于GPT系列模型的经验值
            english_char_per_token: 4.0,
            chinese_char_per_token: 1.5,
            base_token_overhead: 50,
        }
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenEstimator {
    pub fn new() -> Self {
        Self {
            rules: TokenCalculationRules::default(),
        }
    }

    /// 估算文本的token数量
    pub fn estimate_tokens(&self, text: &str) -> usize {
        let chinese_count = text.chars().filter(|c| is_cjk_char(*c)).count();
        let other_count = text.chars().count() - chinese_count;

        let chinese_tokens =
            (chinese_count as f64 / self.rules.chinese_char_per_token).ceil() as usize;
        let other_tokens = (other_count as f64 / self.rules.english_char_per_token).ceil() as usize;

        chinese_tokens + other_tokens + self.rules.base_token_overhead
    }

    /// 检查文本是否超过token限制
    pub fn exceeds_limit(&self, text: &str, limit: usize) -> bool {
        self.estimate_tokens(text) > limit
    }

    /// 从token预算推导字符预算。
    /// 采用宽松的 4字符/token 近似，后续重试会按比例继续收缩。
    pub fn char_budget(&self, token_limit: usize) -> usize {
        token_limit.saturating_mul(self.rules.english_char_per_token as usize)
    }
}

/// 按字符边界截断文本到指定字符数
pub fn truncate_to_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

/// 判断是否为CJK字符
fn is_cjk_char(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF |  // CJK统一汉字
        0x3400..=0x4DBF |  // CJK扩展A
        0x20000..=0x2A6DF | // CJK扩展B
        0x3040..=0x30FF |   // 平假名、片假名
        0xAC00..=0xD7AF     // 谚文音节
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_mixed_text() {
        let estimator = TokenEstimator::new();
        let english_only = estimator.estimate_tokens("hello world");
        let chinese_only = estimator.estimate_tokens("你好世界你好世界你好世");

        // 同字符数下中文的token密度更高
        assert!(chinese_only > english_only);
    }

    #[test]
    fn test_exceeds_limit() {
        let estimator = TokenEstimator::new();
        assert!(!estimator.exceeds_limit("short", 100));
        assert!(estimator.exceeds_limit(&"长文本".repeat(200), 100));
    }

    #[test]
    fn test_truncate_to_chars_respects_boundaries() {
        let truncated = truncate_to_chars("研究发现abc", 4);
        assert_eq!(truncated, "研究发现");
        assert_eq!(truncate_to_chars("abc", 10), "abc");
    }
}
