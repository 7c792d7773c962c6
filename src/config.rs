// 外部サービスの接続設定
//
// 環境変数（または任意の名前付き入力）から設定を読み込み、検証済みの
// 不変な設定オブジェクトを作る。

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::{BridgeError, Result};

/// 1回の呼び出し全体のタイムアウト
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// チャット補完のサンプリング温度
pub const CHAT_TEMPERATURE: f64 = 0.2;

/// SWE_AGENT_ENDPOINT 未設定時の接続先
pub const DEFAULT_SWE_AGENT_ENDPOINT: &str = "http://localhost:8000";

// Azure OpenAI (チャット補完) 用の環境変数名
pub const AZURE_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const AZURE_OPENAI_DEPLOYMENT: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const AZURE_OPENAI_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const AZURE_OPENAI_API_KEY: &str = "AZURE_OPENAI_API_KEY";

// SWE Agent 用の環境変数名
pub const SWE_AGENT_ENDPOINT: &str = "SWE_AGENT_ENDPOINT";
pub const AZURE_OPENAI_API_BASE: &str = "AZURE_OPENAI_API_BASE";
pub const AZURE_OPENAI_MODEL: &str = "AZURE_OPENAI_MODEL";
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// 名前付き入力を読み、前後の空白を除いた値を返す
fn read_trimmed<F>(lookup: &F, name: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// 空の項目名を宣言順に集める
fn collect_missing(fields: &[(&'static str, &str)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect()
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Azure OpenAI チャット補完の設定
pub struct AzureChatConfig {
    endpoint: Url,
    deployment: String,
    api_version: String,
    api_key: SecretString,
}

impl AzureChatConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// 名前付き入力から設定を組み立てる
    ///
    /// 欠落している項目はまとめて報告する。エンドポイントの構文エラーは
    /// 欠落とは別のエラーになる。
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = read_trimmed(&lookup, AZURE_OPENAI_ENDPOINT);
        let deployment = read_trimmed(&lookup, AZURE_OPENAI_DEPLOYMENT);
        let api_version = read_trimmed(&lookup, AZURE_OPENAI_API_VERSION);
        let api_key = read_trimmed(&lookup, AZURE_OPENAI_API_KEY);

        let missing = collect_missing(&[
            (AZURE_OPENAI_ENDPOINT, endpoint.as_str()),
            (AZURE_OPENAI_DEPLOYMENT, deployment.as_str()),
            (AZURE_OPENAI_API_VERSION, api_version.as_str()),
            (AZURE_OPENAI_API_KEY, api_key.as_str()),
        ]);
        if !missing.is_empty() {
            return Err(BridgeError::MissingConfig {
                scope: "Azure OpenAI",
                missing,
            });
        }

        let endpoint = Url::parse(&endpoint).map_err(|source| BridgeError::InvalidEndpoint {
            name: AZURE_OPENAI_ENDPOINT,
            source,
        })?;

        Ok(Self {
            endpoint,
            deployment,
            api_version,
            api_key: SecretString::from(api_key),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

impl fmt::Debug for AzureChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureChatConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// SWE Agent REST API の設定
pub struct AgentConfig {
    endpoint: String,
    model_api_base: String,
    model_api_key: SecretString,
    model_name: String,
    api_version: String,
    github_token: SecretString,
}

impl AgentConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// 名前付き入力から設定を組み立てる
    ///
    /// エンドポイントは省略可能で、空なら DEFAULT_SWE_AGENT_ENDPOINT を使う。
    /// URL の構文チェックは行わない。
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut endpoint = read_trimmed(&lookup, SWE_AGENT_ENDPOINT);
        if endpoint.is_empty() {
            endpoint = DEFAULT_SWE_AGENT_ENDPOINT.to_string();
        }

        let model_api_base = read_trimmed(&lookup, AZURE_OPENAI_API_BASE);
        let model_api_key = read_trimmed(&lookup, AZURE_OPENAI_API_KEY);
        let model_name = read_trimmed(&lookup, AZURE_OPENAI_MODEL);
        let api_version = read_trimmed(&lookup, AZURE_OPENAI_API_VERSION);
        let github_token = read_trimmed(&lookup, GITHUB_TOKEN);

        let missing = collect_missing(&[
            (AZURE_OPENAI_API_BASE, model_api_base.as_str()),
            (AZURE_OPENAI_API_KEY, model_api_key.as_str()),
            (AZURE_OPENAI_MODEL, model_name.as_str()),
            (AZURE_OPENAI_API_VERSION, api_version.as_str()),
            (GITHUB_TOKEN, github_token.as_str()),
        ]);
        if !missing.is_empty() {
            return Err(BridgeError::MissingConfig {
                scope: "SWE Agent",
                missing,
            });
        }

        Ok(Self {
            endpoint,
            model_api_base,
            model_api_key: SecretString::from(model_api_key),
            model_name,
            api_version,
            github_token: SecretString::from(github_token),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model_api_base(&self) -> &str {
        &self.model_api_base
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub(crate) fn model_api_key(&self) -> &str {
        self.model_api_key.expose_secret()
    }

    pub(crate) fn github_token(&self) -> &str {
        self.github_token.expose_secret()
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("endpoint", &self.endpoint)
            .field("model_api_base", &self.model_api_base)
            .field("model_api_key", &"[REDACTED]")
            .field("model_name", &self.model_name)
            .field("api_version", &self.api_version)
            .field("github_token", &"[REDACTED]")
            .finish()
    }
}
