// Azure OpenAI チャット補完クライアント

use log::{info, warn};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::error_body::extract_error_message;
use super::schemas::openai_request::ChatCompletionRequest;
use super::schemas::openai_response::ChatCompletionResponse;
use crate::config::{AzureChatConfig, CHAT_TEMPERATURE};
use crate::error::{BridgeError, Result, Service};
use crate::http::HttpTransport;

const API_VERSION_PARAM: &str = "api-version";

/// チャット補完のエンドポイントURLを組み立てる
///
/// 既存のパスの後ろに `openai/deployments/<deployment>/chat/completions` を繋げて正規化し、
/// `api-version` だけを上書きする（他のクエリパラメータは残す）。
pub fn completion_url(config: &AzureChatConfig) -> Result<Url> {
    // 設定時に検証済みだが、ここでも改めてパースする
    let mut url = Url::parse(config.endpoint().as_str()).map_err(|e| {
        BridgeError::RequestConstruction {
            service: Service::AzureOpenAi,
            reason: format!("エンドポイントが不正です: {}", e),
        }
    })?;

    // 空のセグメントと "." を詰め、".." は一つ上に戻る。
    // デプロイメント名に含まれる "/" もパスの区切りとして扱う。
    let base = url
        .path_segments()
        .ok_or_else(|| BridgeError::RequestConstruction {
            service: Service::AzureOpenAi,
            reason: format!("パスを追加できないエンドポイントです: {}", config.endpoint()),
        })?;
    let mut segments: Vec<String> = Vec::new();
    for segment in base
        .chain(["openai", "deployments"])
        .chain(config.deployment().split('/'))
        .chain(["chat", "completions"])
    {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s.to_string()),
        }
    }

    url.path_segments_mut()
        .map_err(|_| BridgeError::RequestConstruction {
            service: Service::AzureOpenAi,
            reason: format!("パスを追加できないエンドポイントです: {}", config.endpoint()),
        })?
        .clear()
        .extend(&segments);

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != API_VERSION_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(API_VERSION_PARAM, config.api_version());

    Ok(url)
}

/// Azure OpenAI クライアント
///
/// 保持するのはタイムアウト付きの HTTP クライアントだけで、
/// 設定は呼び出しごとに受け取る。
#[derive(Clone, Debug)]
pub struct ChatCompletionClient {
    http: HttpTransport,
}

impl ChatCompletionClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: HttpTransport::new(Service::AzureOpenAi)?,
        })
    }

    /// system / user の2メッセージでチャット補完を1回実行する
    ///
    /// レスポンスは JSON デコードを先に行い、その後でステータスを判定する。
    /// そのため JSON でないエラーボディはステータスエラーではなく
    /// デコードエラーになる。
    pub async fn complete(
        &self,
        config: &AzureChatConfig,
        system_prompt: &str,
        user_prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let url = completion_url(config)?;
        let payload = ChatCompletionRequest::new(system_prompt, user_prompt, CHAT_TEMPERATURE);

        info!(
            "Azure OpenAI へリクエスト送信: deployment={}, api-version={}",
            config.deployment(),
            config.api_version()
        );

        let response = self
            .http
            .post_json(
                Service::AzureOpenAi,
                url.as_str(),
                &[("api-key", config.api_key())],
                &payload,
                cancel,
            )
            .await?;

        let decoded: ChatCompletionResponse =
            serde_json::from_slice(&response.body).map_err(|source| BridgeError::Decode {
                service: Service::AzureOpenAi,
                source,
            })?;

        if !response.is_success() {
            let message = extract_error_message(decoded.error.as_ref(), &response.body_text());
            warn!("Azure OpenAI エラー: ステータス {}, {}", response.status, message);
            return Err(BridgeError::UpstreamStatus {
                service: Service::AzureOpenAi,
                status: response.status,
                message,
            });
        }

        match decoded.first_content() {
            None => Err(BridgeError::NoCompletion),
            Some("") => Err(BridgeError::EmptyCompletion),
            Some(content) => Ok(content.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AZURE_OPENAI_API_KEY, AZURE_OPENAI_API_VERSION, AZURE_OPENAI_DEPLOYMENT,
        AZURE_OPENAI_ENDPOINT,
    };

    fn config_with_endpoint(endpoint: &str) -> AzureChatConfig {
        config_with(endpoint, "gpt-4o")
    }

    fn config_with(endpoint: &str, deployment: &str) -> AzureChatConfig {
        AzureChatConfig::from_lookup(|name| match name {
            AZURE_OPENAI_ENDPOINT => Some(endpoint.to_string()),
            AZURE_OPENAI_DEPLOYMENT => Some(deployment.to_string()),
            AZURE_OPENAI_API_VERSION => Some("2024-02-01".to_string()),
            AZURE_OPENAI_API_KEY => Some("secret".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn appends_deployment_path() {
        let url = completion_url(&config_with_endpoint("https://res.openai.azure.com")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://res.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-02-01"
        );
    }

    #[test]
    fn keeps_existing_base_path() {
        let url = completion_url(&config_with_endpoint("https://gw.example.com/azure/")).unwrap();
        assert_eq!(
            url.path(),
            "/azure/openai/deployments/gpt-4o/chat/completions"
        );
    }

    #[test]
    fn cleans_empty_segments_and_splits_deployment() {
        let url = completion_url(&config_with("https://x/a//", "team/gpt")).unwrap();
        assert_eq!(url.path(), "/a/openai/deployments/team/gpt/chat/completions");

        let url = completion_url(&config_with("https://x/a/./b/../", "gpt-4o")).unwrap();
        assert_eq!(url.path(), "/a/openai/deployments/gpt-4o/chat/completions");
    }

    #[test]
    fn overrides_api_version_and_keeps_other_params() {
        let url = completion_url(&config_with_endpoint(
            "https://gw.example.com/base?api-version=old&tenant=a",
        ))
        .unwrap();

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("tenant".to_string(), "a".to_string()),
                ("api-version".to_string(), "2024-02-01".to_string()),
            ]
        );
    }

    #[test]
    fn cannot_be_a_base_endpoint_fails_construction() {
        let err = completion_url(&config_with_endpoint("mailto:ops@example.com")).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::RequestConstruction {
                service: Service::AzureOpenAi,
                ..
            }
        ));
    }
}
