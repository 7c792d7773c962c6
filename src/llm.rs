// LLM関連の外部API呼び出しをまとめたモジュール

pub mod azure_openai;
pub mod error_body;
pub mod schemas;
pub mod swe_agent;
