//! Chinese word segmentation, backed by jieba-rs.
//!
//! Built in but injected like any other capability: the registry only adds it
//! when the setting is on, and it goes through the same init/claim/tokenize contract.

use async_trait::async_trait;
use jieba_rs::Jieba;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::capability::{CapabilityError, TokenizerCapability};

static PUNCTUATION_OR_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{P}\s]+$").expect("punctuation class is valid"));

/// Segments runs of CJK unified ideographs into search-mode words.
#[derive(Default)]
pub struct ChineseTokenizer {
    jieba: Option<Jieba>,
}

impl ChineseTokenizer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Whether `text` contains a CJK unified ideograph.
pub fn contains_chinese(text: &str) -> bool {
    text.chars().any(|c| matches!(c, '\u{4e00}'..='\u{9fff}'))
}

fn is_punctuation_or_space(token: &str) -> bool {
    PUNCTUATION_OR_SPACE.is_match(token)
}

#[async_trait]
impl TokenizerCapability for ChineseTokenizer {
    fn name(&self) -> &str {
        "chinese"
    }

    async fn init(&mut self) -> Result<(), CapabilityError> {
        if self.jieba.is_some() {
            return Ok(());
        }
        // Building the dictionary takes a while; keep it off the async workers.
        let jieba = tokio::task::spawn_blocking(Jieba::new)
            .await
            .map_err(|e| CapabilityError::Init(e.to_string()))?;
        tracing::info!("chinese tokenizer dictionary loaded");
        self.jieba = Some(jieba);
        Ok(())
    }

    fn is_tokenizable(&self, text: &str) -> Result<bool, CapabilityError> {
        Ok(contains_chinese(text))
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>, CapabilityError> {
        let jieba = self.jieba.as_ref().ok_or(CapabilityError::NotInitialized)?;
        Ok(jieba
            .cut_for_search(text, true)
            .into_iter()
            .filter(|t| !is_punctuation_or_space(t))
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ValidatedTokenizer;

    #[test]
    fn detects_chinese() {
        assert!(contains_chinese("测试"));
        assert!(contains_chinese("test测试"));
        assert!(!contains_chinese("test"));
        assert!(!contains_chinese("テスト"));
    }

    #[test]
    fn punctuation_only_tokens_are_recognized() {
        for token in ["，", "。", "·", "‧", "「」", " ", "、 "] {
            assert!(is_punctuation_or_space(token), "{token:?}");
        }
        for token in ["中华", "a", "·a", "1"] {
            assert!(!is_punctuation_or_space(token), "{token:?}");
        }
    }

    #[test]
    fn tokenize_before_init_errors() {
        let t = ChineseTokenizer::new();
        assert!(matches!(t.tokenize("中文"), Err(CapabilityError::NotInitialized)));
    }

    #[tokio::test]
    async fn segments_a_run_of_characters() {
        let t = ValidatedTokenizer::initialize(Box::new(ChineseTokenizer::new()))
            .await
            .unwrap();
        let tokens = t.try_tokenization("中华人民共和国，你好").unwrap();
        assert!(tokens.len() > 1);
        assert!(tokens.iter().any(|t| t == "中华"));
        assert!(!tokens.iter().any(|t| t == "，"));
    }

    #[tokio::test]
    async fn latin_words_are_not_claimed() {
        let t = ValidatedTokenizer::initialize(Box::new(ChineseTokenizer::new()))
            .await
            .unwrap();
        assert_eq!(t.try_tokenization("hello"), None);
    }
}
