#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use crate::config::{LLMProvider, SearchProvider};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn test_args_default_values() {
        let args = Args::try_parse_from(["deepresearch-rs", "研究问题"]).unwrap();

        assert_eq!(args.question, "研究问题");
        assert!(args.config.is_none());
        assert!(args.max_concurrent_research_units.is_none());
        assert!(!args.no_clarification);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_requires_question() {
        assert!(Args::try_parse_from(["deepresearch-rs"]).is_err());
    }

    #[test]
    fn test_args_research_options() {
        let args = Args::try_parse_from([
            "deepresearch-rs",
            "question",
            "--max-concurrent-research-units", "2",
            "--max-researcher-iterations", "1",
            "--max-react-tool-calls", "3",
            "--no-clarification",
            "--search-provider", "tavily",
            "--mcp-server-id", "postgres",
            "--mcp-server-id", "files",
        ])
        .unwrap();

        assert_eq!(args.max_concurrent_research_units, Some(2));
        assert_eq!(args.max_researcher_iterations, Some(1));
        assert_eq!(args.max_react_tool_calls, Some(3));
        assert!(args.no_clarification);
        assert_eq!(args.search_provider, Some("tavily".to_string()));
        assert_eq!(args.mcp_server_id, vec!["postgres", "files"]);
    }

    #[test]
    fn test_args_llm_options() {
        let args = Args::try_parse_from([
            "deepresearch-rs",
            "question",
            "--llm-provider", "deepseek",
            "--llm-api-key", "test-key",
            "--llm-api-base-url", "https://api.deepseek.com",
            "--model-efficient", "deepseek-chat",
            "--model-powerful", "deepseek-reasoner",
            "--max-tokens", "2048",
            "--temperature", "0.7",
        ])
        .unwrap();

        assert_eq!(args.llm_provider, Some("deepseek".to_string()));
        assert_eq!(args.llm_api_key, Some("test-key".to_string()));
        assert_eq!(args.llm_api_base_url, Some("https://api.deepseek.com".to_string()));
        assert_eq!(args.model_efficient, Some("deepseek-chat".to_string()));
        assert_eq!(args.model_powerful, Some("deepseek-reasoner".to_string()));
        assert_eq!(args.max_tokens, Some(2048));
        assert_eq!(args.temperature, Some(0.7));
    }

    #[test]
    fn test_into_config_basic() {
        let args = Args::try_parse_from(["deepresearch-rs", "question"]).unwrap();
        let config = args.into_config();

        assert_eq!(config.research.max_concurrent_research_units, 3);
        assert!(config.research.allow_clarification);
        assert!(!config.verbose);
    }

    #[test]
    fn test_into_config_with_overrides() {
        let args = Args::try_parse_from([
            "deepresearch-rs",
            "question",
            "--max-concurrent-research-units", "2",
            "--no-clarification",
            "--search-provider", "none",
            "--llm-provider", "moonshot",
            "--model-efficient", "kimi-k2-0711-preview",
            "-v",
        ])
        .unwrap();

        let config = args.into_config();

        assert_eq!(config.research.max_concurrent_research_units, 2);
        assert!(!config.research.allow_clarification);
        assert_eq!(config.research.search_provider, SearchProvider::None);
        assert_eq!(config.llm.provider, LLMProvider::Moonshot);
        assert_eq!(config.llm.model_efficient, "kimi-k2-0711-preview");
        assert!(config.verbose);
    }

    #[test]
    fn test_into_config_invalid_provider_keeps_default() {
        let args = Args::try_parse_from([
            "deepresearch-rs",
            "question",
            "--llm-provider", "invalid",
            "--search-provider", "bing",
        ])
        .unwrap();

        let config = args.into_config();

        assert_eq!(config.llm.provider, LLMProvider::OpenAI);
        assert_eq!(config.research.search_provider, SearchProvider::Serper);
    }

    #[test]
    fn test_into_config_mcp_server_ids() {
        let args = Args::try_parse_from([
            "deepresearch-rs",
            "question",
            "--mcp-server-id", "postgres",
        ])
        .unwrap();

        let config = args.into_config();
        assert_eq!(config.research.mcp_server_ids, vec!["postgres".to_string()]);
    }

    #[test]
    fn test_config_option_paths() {
        let args = Args::try_parse_from([
            "deepresearch-rs",
            "question",
            "-c", "/config.toml",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("/config.toml")));
    }
}
