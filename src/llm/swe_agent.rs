// SWE Agent ジョブ投入クライアント

use std::collections::BTreeMap;

use log::{info, warn};
use tokio_util::sync::CancellationToken;

use super::schemas::swe_agent::{
    AgentActions, AgentEnv, AgentModel, AgentRunRequest, AgentRunResult, ModelConfig,
    ProblemStatement, RepoRef,
};
use crate::config::AgentConfig;
use crate::error::{BridgeError, Result, Service};
use crate::http::HttpTransport;

/// issue の URL（owner / repo はそのまま埋め込む）
pub fn issue_url(owner: &str, repo: &str, issue_number: u64) -> String {
    format!("https://github.com/{}/{}/issues/{}", owner, repo, issue_number)
}

/// リポジトリの URL
pub fn repository_url(owner: &str, repo: &str) -> String {
    format!("https://github.com/{}/{}", owner, repo)
}

/// /run エンドポイントの URL（末尾のスラッシュは1つだけ取り除く）
pub fn run_url(endpoint: &str) -> String {
    format!("{}/run", endpoint.strip_suffix('/').unwrap_or(endpoint))
}

fn build_run_request<'a>(
    config: &'a AgentConfig,
    owner: &str,
    repo: &str,
    issue_number: u64,
) -> AgentRunRequest<'a> {
    AgentRunRequest {
        agent: AgentModel {
            model: ModelConfig {
                name: config.model_name(),
                api_base: config.model_api_base(),
                api_version: config.api_version(),
                api_key: config.model_api_key(),
            },
        },
        problem_statement: ProblemStatement {
            kind: "github",
            github_url: issue_url(owner, repo, issue_number),
        },
        env: AgentEnv {
            repo: RepoRef {
                github_url: repository_url(owner, repo),
            },
        },
        actions: AgentActions { open_pr: true },
        env_vars: BTreeMap::from([("GITHUB_TOKEN", config.github_token())]),
    }
}

/// SWE Agent クライアント
#[derive(Clone, Debug)]
pub struct AgentJobClient {
    http: HttpTransport,
}

impl AgentJobClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: HttpTransport::new(Service::SweAgent)?,
        })
    }

    /// GitHub issue の対応ジョブを投入する
    ///
    /// エラー時はステータスと生のレスポンスボディをそのまま返す。
    /// 返ってきたジョブの状態は解釈しない。
    pub async fn submit(
        &self,
        config: &AgentConfig,
        owner: &str,
        repo: &str,
        issue_number: u64,
        cancel: &CancellationToken,
    ) -> Result<AgentRunResult> {
        let payload = build_run_request(config, owner, repo, issue_number);
        let url = run_url(config.endpoint());

        info!(
            "SWE Agent へジョブ投入: {}/{}#{} -> {}",
            owner, repo, issue_number, url
        );

        let response = self
            .http
            .post_json(Service::SweAgent, &url, &[], &payload, cancel)
            .await?;

        if !response.is_success() {
            let body = response.body_text();
            warn!("SWE Agent エラー: ステータス {}", response.status);
            return Err(BridgeError::UpstreamStatus {
                service: Service::SweAgent,
                status: response.status,
                message: body,
            });
        }

        let result: AgentRunResult =
            serde_json::from_slice(&response.body).map_err(|source| BridgeError::Decode {
                service: Service::SweAgent,
                source,
            })?;

        info!(
            "SWE Agent ジョブ受付: job_id={}, status={}",
            result.job_id, result.status
        );

        Ok(result)
    }
}
