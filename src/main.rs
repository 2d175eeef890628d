use anyhow::Result;
use clap::Parser;

use crate::research::ResearchOutcome;

mod cli;
mod config;
mod i18n;
mod llm;
mod progress;
mod research;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let question = args.question.clone();
    let config = args.into_config();

    match research::launch(&config, &question).await? {
        ResearchOutcome::Clarification { question } => {
            println!("❓ 需要补充信息后重新提交:\n{}", question);
        }
        ResearchOutcome::Report {
            final_report,
            notes,
            ..
        } => {
            println!("\n{}", final_report);
            if config.verbose {
                eprintln!("\n--- 共 {} 条研究发现 ---", notes.len());
            }
        }
    }

    Ok(())
}
