// エラー型の定義
//
// 外部呼び出しの失敗はすべて BridgeError として呼び出し元へ返す。
// リトライや表示方法は呼び出し元が決める。

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// このクレートの Result 型
pub type Result<T> = std::result::Result<T, BridgeError>;

/// 呼び出し先のサービス
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Service {
    AzureOpenAi,
    SweAgent,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AzureOpenAi => write!(f, "Azure OpenAI"),
            Self::SweAgent => write!(f, "SWE Agent"),
        }
    }
}

/// エラーの大分類（呼び出し元でのルーティング用）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// 必須設定の欠落、またはエンドポイントURLの構文エラー
    Configuration,
    /// リクエストの組み立てに失敗
    RequestConstruction,
    /// 通信失敗（タイムアウト・キャンセルを含む）
    Transport,
    /// レスポンスボディが期待した JSON ではない
    Decode,
    /// 2xx 以外のステータス
    UpstreamStatus,
    /// 2xx だが必要な内容がない
    Semantic,
}

/// 通信レベルの失敗
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("呼び出し元によってキャンセルされました")]
    Cancelled,

    #[error("{0:?} 以内に応答がありませんでした")]
    TimedOut(Duration),

    #[error(transparent)]
    Network(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{scope} の設定が不足しています: {}", .missing.join(", "))]
    MissingConfig {
        scope: &'static str,
        missing: Vec<&'static str>,
    },

    #[error("{name} が不正なURLです: {source}")]
    InvalidEndpoint {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("{service} のリクエスト作成に失敗: {reason}")]
    RequestConstruction { service: Service, reason: String },

    #[error("{service} へのリクエストに失敗: {source}")]
    Transport {
        service: Service,
        #[source]
        source: TransportError,
    },

    #[error("{service} のレスポンスのデコードに失敗: {source}")]
    Decode {
        service: Service,
        #[source]
        source: serde_json::Error,
    },

    #[error("{service} が {status} を返しました: {message}")]
    UpstreamStatus {
        service: Service,
        status: StatusCode,
        message: String,
    },

    #[error("Azure OpenAI が候補を返しませんでした")]
    NoCompletion,

    #[error("Azure OpenAI が空のコンテンツを返しました")]
    EmptyCompletion,
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingConfig { .. } | Self::InvalidEndpoint { .. } => ErrorKind::Configuration,
            Self::RequestConstruction { .. } => ErrorKind::RequestConstruction,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::UpstreamStatus { .. } => ErrorKind::UpstreamStatus,
            Self::NoCompletion | Self::EmptyCompletion => ErrorKind::Semantic,
        }
    }

    /// キャンセルによる失敗かどうか
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                source: TransportError::Cancelled,
                ..
            }
        )
    }

    pub(crate) fn transport(service: Service, err: reqwest::Error, timeout: Duration) -> Self {
        // URL不正などは送信前に失敗するので組み立てエラーとして扱う
        if err.is_builder() {
            return Self::RequestConstruction {
                service,
                reason: err.to_string(),
            };
        }

        let source = if err.is_timeout() {
            TransportError::TimedOut(timeout)
        } else {
            TransportError::Network(err)
        };
        Self::Transport { service, source }
    }
}
