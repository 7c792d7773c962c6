// issue-agent-bridge - Azure OpenAI と SWE Agent への呼び出し層
//
// 設定の検証、リクエスト作成、レスポンスのデコード、エラー分類まで。
// リトライやジョブの追跡は呼び出し側の責務。

pub mod config;
pub mod error;
mod http;
pub mod llm;

pub use config::{AgentConfig, AzureChatConfig};
pub use error::{BridgeError, ErrorKind, Result, Service, TransportError};
pub use llm::azure_openai::ChatCompletionClient;
pub use llm::schemas::swe_agent::AgentRunResult;
pub use llm::swe_agent::AgentJobClient;
pub use tokio_util::sync::CancellationToken;
