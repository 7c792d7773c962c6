// issue-agent-bridge - Azure OpenAI / SWE Agent 呼び出しツール

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use log::{error, info};
use simple_logger::SimpleLogger;

use issue_agent_bridge::{
    AgentConfig, AgentJobClient, AzureChatConfig, CancellationToken, ChatCompletionClient,
};

// コマンドライン引数の定義

#[derive(Parser, Debug)]
#[clap(
    name = "issue-agent-bridge",
    about = "Azure OpenAI のチャット補完と SWE Agent へのジョブ投入を行うツール",
    version = "0.1.0"
)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// チャット補完を1回実行する
    Chat {
        /// システムプロンプト
        #[clap(
            long,
            env = "CHAT_SYSTEM_PROMPT",
            default_value = "You are a helpful assistant."
        )]
        system: String,

        /// ユーザープロンプト
        prompt: String,
    },

    /// GitHub issue を SWE Agent に投入する
    Agent {
        /// リポジトリのオーナー
        #[clap(long, env = "REPO_OWNER")]
        owner: String,

        /// リポジトリ名
        #[clap(long, env = "REPO_NAME")]
        repo: String,

        /// issue 番号
        #[clap(long, env = "ISSUE_NUMBER")]
        issue: u64,
    },
}

// Ctrl-C で実行中のリクエストを中断する
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("中断要求を受け付けました");
            child.cancel();
        }
    });
    token
}

async fn run(command: Command, cancel: &CancellationToken) -> Result<()> {
    match command {
        Command::Chat { system, prompt } => {
            let config = AzureChatConfig::from_env()?;
            let client = ChatCompletionClient::new()?;

            let content = client
                .complete(&config, &system, &prompt, cancel)
                .await
                .context("チャット補完に失敗しました")?;
            println!("{}", content);
        }
        Command::Agent { owner, repo, issue } => {
            let config = AgentConfig::from_env()?;
            let client = AgentJobClient::new()?;

            let result = client
                .submit(&config, &owner, &repo, issue, cancel)
                .await
                .context("SWE Agent へのジョブ投入に失敗しました")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // .envファイルを読み込み
    dotenv().ok();

    // ロガー初期化（RUST_LOG で上書き可能）
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()?;

    let args = Args::parse();
    let cancel = cancel_on_ctrl_c();

    if let Err(e) = run(args.command, &cancel).await {
        error!("❌ {:#}", e);
        return Err(e);
    }

    info!("✅ 完了");
    Ok(())
}
