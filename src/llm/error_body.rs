// エラーレスポンスからメッセージを取り出す

use super::schemas::openai_response::ErrorEnvelope;

/// エラーメッセージを組み立てる
///
/// `{"error":{"message":...}}` の message が空でなければそれを、
/// なければ生のボディを、それぞれ前後の空白を除いて返す。
pub fn extract_error_message(envelope: Option<&ErrorEnvelope>, raw_body: &str) -> String {
    let message = envelope
        .and_then(|e| e.message.as_deref())
        .map(str::trim)
        .unwrap_or("");

    if message.is_empty() {
        raw_body.trim().to_string()
    } else {
        message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(message: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn prefers_envelope_message() {
        let env = envelope(Some("  rate limited \n"));
        assert_eq!(
            extract_error_message(Some(&env), r#"{"error":{"message":"rate limited"}}"#),
            "rate limited"
        );
    }

    #[test]
    fn falls_back_to_raw_body() {
        let raw = "  {\"error\":{\"message\":\"   \"}} ";
        assert_eq!(
            extract_error_message(Some(&envelope(Some("   "))), raw),
            "{\"error\":{\"message\":\"   \"}}"
        );
        assert_eq!(extract_error_message(Some(&envelope(None)), " {} "), "{}");
        assert_eq!(extract_error_message(None, "\n{\"detail\":1}\n"), "{\"detail\":1}");
    }
}
