// 外部API呼び出し用の HTTP トランスポート
//
// JSON を POST してボディを最後まで読み、ステータスと生ボディを返すところまで。
// ステータスの解釈は各クライアント側で行う。

use std::time::Duration;

use log::{debug, warn};
use reqwest::{StatusCode, header};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::REQUEST_TIMEOUT;
use crate::error::{BridgeError, Result, Service, TransportError};

/// ボディまで読み終えたレスポンス
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// ボディを文字列として返す
    ///
    /// UTF-8 として不正なバイトは U+FFFD に置き換わるため、その場合は
    /// バイト単位で元のボディと一致しない。UTF-8 のボディはそのまま。
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// タイムアウト付きの HTTP クライアント
///
/// 呼び出しごとの設定は引数で受け取るので、可変な状態は持たない。
#[derive(Clone, Debug)]
pub(crate) struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(service: Service) -> Result<Self> {
        Self::with_timeout(service, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(service: Service, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::RequestConstruction {
                service,
                reason: format!("HTTPクライアントの作成に失敗: {}", e),
            })?;

        Ok(Self { client, timeout })
    }

    /// JSON ボディを POST し、レスポンスを最後まで読む
    ///
    /// キャンセルとタイムアウトのどちらか早い方で打ち切る。
    pub async fn post_json<T: Serialize>(
        &self,
        service: Service,
        url: &str,
        headers: &[(&'static str, &str)],
        payload: &T,
        cancel: &CancellationToken,
    ) -> Result<RawResponse> {
        let body = serde_json::to_vec(payload).map_err(|e| BridgeError::RequestConstruction {
            service,
            reason: format!("リクエストのシリアライズに失敗: {}", e),
        })?;

        let mut request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(RawResponse {
                status,
                body: body.to_vec(),
            })
        };

        // select! で負けた側の future は drop され、接続も解放される
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("{} へのリクエストがキャンセルされました", service);
                return Err(BridgeError::Transport {
                    service,
                    source: TransportError::Cancelled,
                });
            }
            result = exchange => result,
        };

        match result {
            Ok(raw) => {
                debug!(
                    "{} 応答: ステータス {}, {} バイト",
                    service,
                    raw.status,
                    raw.body.len()
                );
                Ok(raw)
            }
            Err(e) => {
                warn!("{} へのリクエストでエラー: {}", service, e);
                Err(BridgeError::transport(service, e, self.timeout))
            }
        }
    }
}
