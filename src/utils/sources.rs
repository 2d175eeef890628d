//! 引用编号规范化 - 保证来源列表从1开始连续编号

use regex::Regex;

/// 规范化文本中的引用编号。
///
/// 压缩和报告生成阶段会丢弃重复来源，模型输出的来源列表可能出现
/// 编号空洞（如 [1][3][4]）。本函数按来源列表的出现顺序重新分配
/// 连续编号，并同步改写正文中的内联引用，不丢弃任何来源条目。
pub fn normalize_citations(text: &str) -> String {
    let Ok(entry_re) = Regex::new(r"(?m)^\s*\[(\d+)\]\s+\S") else {
        return text.to_string();
    };

    // 按来源列表条目的出现顺序收集旧编号
    let mut order: Vec<usize> = Vec::new();
    for cap in entry_re.captures_iter(text) {
        if let Some(number) = cap.get(1).and_then(|m| m.as_str().parse::<usize>().ok())
            && !order.contains(&number)
        {
            order.push(number);
        }
    }

    if order.is_empty() {
        return text.to_string();
    }

    // 已经是从1开始的连续编号则原样返回
    let already_contiguous = order.iter().enumerate().all(|(i, n)| *n == i + 1);
    if already_contiguous {
        return text.to_string();
    }

    let Ok(citation_re) = Regex::new(r"\[(\d+)\]") else {
        return text.to_string();
    };

    citation_re
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let old: usize = caps[1].parse().unwrap_or(0);
            match order.iter().position(|n| *n == old) {
                Some(index) => format!("[{}]", index + 1),
                // 正文引用了列表中不存在的编号，保持原样
                None => caps[0].to_string(),
            }
        })
        .to_string()
}

/// 校验文本末尾来源列表是否从1开始连续编号
pub fn citations_are_contiguous(text: &str) -> bool {
    let Ok(entry_re) = Regex::new(r"(?m)^\s*\[(\d+)\]\s+\S") else {
        return true;
    };

    let mut numbers: Vec<usize> = Vec::new();
    for cap in entry_re.captures_iter(text) {
        if let Some(number) = cap.get(1).and_then(|m| m.as_str().parse::<usize>().ok())
            && !numbers.contains(&number)
        {
            numbers.push(number);
        }
    }

    numbers.iter().enumerate().all(|(i, n)| *n == i + 1)
}
