// 外部APIのリクエスト・レスポンスのスキーマ定義

use serde::{Deserialize, Deserializer};

// null も欠落と同じくデフォルト値として読む
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Azure OpenAI チャット補完のリクエストに関するスキーマ
pub mod openai_request {
    use serde::Serialize;

    // メッセージの役割
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        System,
        User,
    }

    // チャットメッセージ
    #[derive(Clone, Debug, PartialEq, Serialize)]
    pub struct ChatMessage<'a> {
        pub role: Role,
        pub content: &'a str,
    }

    // チャット補完リクエスト（system → user の2件固定）
    #[derive(Clone, Debug, Serialize)]
    pub struct ChatCompletionRequest<'a> {
        pub messages: [ChatMessage<'a>; 2],
        pub temperature: f64,
    }

    impl<'a> ChatCompletionRequest<'a> {
        pub fn new(system_prompt: &'a str, user_prompt: &'a str, temperature: f64) -> Self {
            Self {
                messages: [
                    ChatMessage {
                        role: Role::System,
                        content: system_prompt,
                    },
                    ChatMessage {
                        role: Role::User,
                        content: user_prompt,
                    },
                ],
                temperature,
            }
        }
    }
}

// Azure OpenAI チャット補完のレスポンスに関するスキーマ
pub mod openai_response {
    use serde::Deserialize;

    // 応答メッセージ（role は "assistant" など任意の文字列）
    #[derive(Clone, Debug, Default, Deserialize)]
    pub struct ResponseMessage {
        #[serde(default)]
        pub role: Option<String>,
        #[serde(default)]
        pub content: Option<String>,
    }

    // 選択肢
    #[derive(Clone, Debug, Deserialize)]
    pub struct Choice {
        #[serde(default, deserialize_with = "super::null_as_default")]
        pub message: ResponseMessage,
    }

    // エラー時の本文 {"error": {"message": ...}}
    #[derive(Clone, Debug, Default, Deserialize)]
    pub struct ErrorEnvelope {
        #[serde(default)]
        pub message: Option<String>,
    }

    // チャット補完レスポンス
    #[derive(Clone, Debug, Deserialize)]
    pub struct ChatCompletionResponse {
        #[serde(default, deserialize_with = "super::null_as_default")]
        pub choices: Vec<Choice>,
        #[serde(default)]
        pub error: Option<ErrorEnvelope>,
    }

    impl ChatCompletionResponse {
        /// 先頭の選択肢の本文（前後の空白を除く）
        pub fn first_content(&self) -> Option<&str> {
            self.choices
                .first()
                .map(|choice| choice.message.content.as_deref().unwrap_or("").trim())
        }
    }
}

// SWE Agent REST API に関するスキーマ
pub mod swe_agent {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};

    // /run リクエスト
    //
    // APIキーやトークンを借用して運ぶので Debug は実装しない
    #[derive(Serialize)]
    pub struct AgentRunRequest<'a> {
        pub agent: AgentModel<'a>,
        pub problem_statement: ProblemStatement,
        pub env: AgentEnv,
        pub actions: AgentActions,
        pub env_vars: BTreeMap<&'static str, &'a str>,
    }

    #[derive(Serialize)]
    pub struct AgentModel<'a> {
        pub model: ModelConfig<'a>,
    }

    // 使用するモデルと認証情報
    #[derive(Serialize)]
    pub struct ModelConfig<'a> {
        pub name: &'a str,
        pub api_base: &'a str,
        pub api_version: &'a str,
        pub api_key: &'a str,
    }

    // 対応すべき課題（GitHub issue）
    #[derive(Clone, Debug, Serialize)]
    pub struct ProblemStatement {
        #[serde(rename = "type")]
        pub kind: &'static str,
        pub github_url: String,
    }

    #[derive(Clone, Debug, Serialize)]
    pub struct AgentEnv {
        pub repo: RepoRef,
    }

    // 対象リポジトリ
    #[derive(Clone, Debug, Serialize)]
    pub struct RepoRef {
        pub github_url: String,
    }

    #[derive(Clone, Debug, Serialize)]
    pub struct AgentActions {
        pub open_pr: bool,
    }

    /// /run のレスポンス（ジョブハンドル）
    ///
    /// 中身は解釈せずにそのまま呼び出し元へ返す。
    #[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(default)]
    pub struct AgentRunResult {
        #[serde(deserialize_with = "super::null_as_default")]
        pub job_id: String,
        #[serde(deserialize_with = "super::null_as_default")]
        pub status: String,
        #[serde(deserialize_with = "super::null_as_default")]
        pub message: String,
    }
}

#[cfg(test)]
mod tests {
    use super::openai_request::ChatCompletionRequest;
    use super::openai_response::ChatCompletionResponse;
    use super::swe_agent::AgentRunResult;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn chat_request_wire_shape() {
        let request = ChatCompletionRequest::new("be terse", "hi", 0.2);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "messages": [
                    {"role": "system", "content": "be terse"},
                    {"role": "user", "content": "hi"}
                ],
                "temperature": 0.2
            })
        );
    }

    #[test]
    fn chat_response_tolerates_missing_fields() {
        let decoded: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(decoded.choices.is_empty());
        assert!(decoded.error.is_none());

        let decoded: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
                .unwrap();
        assert_eq!(decoded.first_content(), Some(""));
    }

    #[test]
    fn chat_response_reads_null_as_empty() {
        let decoded: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":null,"error":{"message":"content filtered"}}"#)
                .unwrap();
        assert!(decoded.choices.is_empty());
        assert_eq!(decoded.first_content(), None);
        assert_eq!(
            decoded.error.and_then(|e| e.message).as_deref(),
            Some("content filtered")
        );

        let decoded: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":null}]}"#).unwrap();
        assert_eq!(decoded.first_content(), Some(""));
    }

    #[test]
    fn chat_response_rejects_non_object_body() {
        assert!(serde_json::from_str::<ChatCompletionResponse>("internal failure").is_err());
        assert!(serde_json::from_str::<ChatCompletionResponse>("").is_err());
        assert!(serde_json::from_str::<ChatCompletionResponse>(r#""quoted""#).is_err());
    }

    #[test]
    fn agent_result_keeps_unknown_status_verbatim() {
        let decoded: AgentRunResult =
            serde_json::from_str(r#"{"job_id":"j-1","status":"something-new","extra":1}"#).unwrap();

        assert_eq!(
            decoded,
            AgentRunResult {
                job_id: "j-1".to_string(),
                status: "something-new".to_string(),
                message: String::new(),
            }
        );
    }

    #[test]
    fn agent_result_reads_null_fields_as_empty() {
        let decoded: AgentRunResult =
            serde_json::from_str(r#"{"job_id":"abc","status":null,"message":null}"#).unwrap();

        assert_eq!(decoded.job_id, "abc");
        assert_eq!(decoded.status, "");
        assert_eq!(decoded.message, "");
    }
}
