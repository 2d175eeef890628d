//! 网络搜索工具 - Serper与Tavily搜索集成

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{ResearchTool, ToolDescriptor, ToolError};
use crate::config::SearchConfig;

const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";
const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

/// 搜索结果条目
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultItem {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source: String,
}

/// 搜索工具参数
#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    num_results: Option<usize>,
}

/// 将搜索结果格式化为编号文本，供模型阅读
fn format_results(results: &[SearchResultItem]) -> String {
    if results.is_empty() {
        return "未找到相关搜索结果".to_string();
    }

    let mut formatted = Vec::new();
    for (i, result) in results.iter().enumerate() {
        formatted.push(format!(
            "结果 {}:\n标题: {}\n链接: {}\n摘要: {}\n来源: {}",
            i + 1,
            result.title,
            result.url,
            result.snippet,
            result.source
        ));
    }
    formatted.join("\n\n")
}

fn search_parameters_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "要执行的搜索查询"
            },
            "num_results": {
                "type": "integer",
                "description": "返回结果数量（可选）"
            }
        },
        "required": ["query"]
    })
}

/// Serper搜索工具 - 基于Serper API的Google搜索集成
pub struct SerperSearch {
    config: SearchConfig,
    client: reqwest::Client,
}

impl SerperSearch {
    pub fn new(config: SearchConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResultItem>, ToolError> {
        if self.config.serper_api_key.is_empty() {
            return Err(ToolError::Execution(
                "未配置SERPER_API_KEY，无法执行搜索".to_string(),
            ));
        }

        let payload = serde_json::json!({
            "q": query,
            "num": num_results,
        });

        let response = self
            .client
            .post(SERPER_ENDPOINT)
            .header("X-API-KEY", &self.config.serper_api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ToolError::Execution(format!("搜索请求失败: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Execution(format!(
                "Serper API错误 {}: {}",
                status, body
            )));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ToolError::Execution(format!("解析搜索响应失败: {}", e)))?;

        Ok(parse_serper_results(&data))
    }
}

/// 解析Serper返回的原始数据，覆盖有机结果、知识图谱与相关问题
pub(crate) fn parse_serper_results(data: &serde_json::Value) -> Vec<SearchResultItem> {
    let mut results = Vec::new();

    if let Some(organic) = data.get("organic").and_then(|v| v.as_array()) {
        for item in organic {
            results.push(SearchResultItem {
                title: text_field(item, "title"),
                url: text_field(item, "link"),
                snippet: text_field(item, "snippet"),
                source: "organic".to_string(),
            });
        }
    }

    if let Some(kg) = data.get("knowledgeGraph") {
        results.push(SearchResultItem {
            title: text_field(kg, "title"),
            url: text_field(kg, "website"),
            snippet: text_field(kg, "description"),
            source: "knowledge_graph".to_string(),
        });
    }

    if let Some(questions) = data.get("peopleAlsoAsk").and_then(|v| v.as_array()) {
        for item in questions {
            results.push(SearchResultItem {
                title: text_field(item, "question"),
                url: text_field(item, "link"),
                snippet: text_field(item, "snippet"),
                source: "people_also_ask".to_string(),
            });
        }
    }

    results
}

fn text_field(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl ResearchTool for SerperSearch {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "serper_search".to_string(),
            description: "使用Google搜索收集网络信息，返回带标题、链接与摘要的结果列表。".to_string(),
            parameters: search_parameters_schema(),
        }
    }

    async fn call(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let args: SearchArgs =
            serde_json::from_value(args).map_err(|e| ToolError::InvalidArgs(e.to_string()))?;
        let num_results = args.num_results.unwrap_or(self.config.max_results).max(1);

        println!("   🔍 搜索: {}", args.query);

        let results = self.search(&args.query, num_results).await?;
        Ok(format_results(&results))
    }
}

/// Tavily搜索工具
pub struct TavilySearch {
    config: SearchConfig,
    client: reqwest::Client,
}

impl TavilySearch {
    pub fn new(config: SearchConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    async fn search(&self, query: &str, num_results: usize) -> Result<Vec<SearchResultItem>, ToolError> {
        if self.config.tavily_api_key.is_empty() {
            return Err(ToolError::Execution(
                "未配置TAVILY_API_KEY，无法执行搜索".to_string(),
            ));
        }

        let payload = serde_json::json!({
            "api_key": self.config.tavily_api_key,
            "query": query,
            "max_results": num_results,
        });

        let response = self
            .client
            .post(TAVILY_ENDPOINT)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ToolError::Execution(format!("搜索请求失败: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::Execution(format!(
                "Tavily API错误 {}: {}",
                status, body
            )));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ToolError::Execution(format!("解析搜索响应失败: {}", e)))?;

        Ok(parse_tavily_results(&data))
    }
}

/// 解析Tavily返回的原始数据，按URL去重
pub(crate) fn parse_tavily_results(data: &serde_json::Value) -> Vec<SearchResultItem> {
    let mut results: Vec<SearchResultItem> = Vec::new();

    if let Some(items) = data.get("results").and_then(|v| v.as_array()) {
        for item in items {
            let url = text_field(item, "url");
            if results.iter().any(|r| r.url == url) {
                continue;
            }
            results.push(SearchResultItem {
                title: text_field(item, "title"),
                url,
                snippet: text_field(item, "content"),
                source: "tavily".to_string(),
            });
        }
    }

    results
}

#[async_trait]
impl ResearchTool for TavilySearch {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "tavily_search".to_string(),
            description: "专为全面、准确和可信结果优化的搜索引擎，适合回答有关当前事件的问题。".to_string(),
            parameters: search_parameters_schema(),
        }
    }

    async fn call(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let args: SearchArgs =
            serde_json::from_value(args).map_err(|e| ToolError::InvalidArgs(e.to_string()))?;
        let num_results = args.num_results.unwrap_or(self.config.max_results).max(1);

        println!("   🔍 搜索: {}", args.query);

        let results = self.search(&args.query, num_results).await?;
        Ok(format_results(&results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serper_results() {
        let data = serde_json::json!({
            "organic": [
                {"title": "厂商A定价", "link": "https://a.example.com", "snippet": "每月100元"},
                {"title": "厂商B定价", "link": "https://b.example.com", "snippet": "每月80元"}
            ],
            "knowledgeGraph": {
                "title": "厂商A", "website": "https://a.example.com", "description": "云服务厂商"
            },
            "peopleAlsoAsk": [
                {"question": "哪家更便宜?", "link": "https://qa.example.com", "snippet": "视用量而定"}
            ]
        });

        let results = parse_serper_results(&data);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].source, "organic");
        assert_eq!(results[2].source, "knowledge_graph");
        assert_eq!(results[3].source, "people_also_ask");
        assert_eq!(results[0].url, "https://a.example.com");
    }

    #[test]
    fn test_parse_serper_results_empty() {
        let results = parse_serper_results(&serde_json::json!({}));
        assert!(results.is_empty());
        assert_eq!(format_results(&results), "未找到相关搜索结果");
    }

    #[test]
    fn test_parse_tavily_results_deduplicates() {
        let data = serde_json::json!({
            "results": [
                {"title": "报告", "url": "https://x.example.com", "content": "内容1"},
                {"title": "报告(重复)", "url": "https://x.example.com", "content": "内容2"},
                {"title": "其它", "url": "https://y.example.com", "content": "内容3"}
            ]
        });

        let results = parse_tavily_results(&data);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_format_results_numbering() {
        let results = vec![
            SearchResultItem {
                title: "t1".into(),
                url: "u1".into(),
                snippet: "s1".into(),
                source: "organic".into(),
            },
            SearchResultItem {
                title: "t2".into(),
                url: "u2".into(),
                snippet: "s2".into(),
                source: "organic".into(),
            },
        ];
        let text = format_results(&results);
        assert!(text.contains("结果 1:"));
        assert!(text.contains("结果 2:"));
    }
}
