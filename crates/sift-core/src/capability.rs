//! Language tokenizers plugged into the pipeline.
//!
//! A capability is authored outside the core (a shared library, or a built-in
//! segmenter that is injected the same way). The core only talks to it through
//! [`ValidatedTokenizer`], which turns every failure into "no contribution".

use std::panic::{catch_unwind, AssertUnwindSafe};

use async_trait::async_trait;
use thiserror::Error;

/// The contract a language tokenizer fulfils.
///
/// `init` is the only suspension point. `is_tokenizable` and `tokenize` run
/// synchronously on the caller's thread and are expected to be fast; nothing
/// here enforces that.
#[async_trait]
pub trait TokenizerCapability: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// One-time setup. Called exactly once before any other method.
    async fn init(&mut self) -> Result<(), CapabilityError>;

    /// Whether this tokenizer claims `text`.
    fn is_tokenizable(&self, text: &str) -> Result<bool, CapabilityError>;

    /// Segments `text` into tokens.
    fn tokenize(&self, text: &str) -> Result<Vec<String>, CapabilityError>;
}

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("tokenizer is not initialized")]
    NotInitialized,
    #[error("init failed: {0}")]
    Init(String),
    #[error("module returned status {0}")]
    Status(i32),
    #[error("{0}")]
    Other(String),
}

/// An initialized capability whose calls can't take the pipeline down.
pub struct ValidatedTokenizer {
    inner: Box<dyn TokenizerCapability>,
}

impl std::fmt::Debug for ValidatedTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedTokenizer")
            .field("name", &self.inner.name())
            .finish()
    }
}

impl ValidatedTokenizer {
    /// Runs the capability's `init` once. Returns `None` (and logs) if it fails.
    pub async fn initialize(mut capability: Box<dyn TokenizerCapability>) -> Option<Self> {
        match capability.init().await {
            Ok(()) => {
                tracing::debug!(tokenizer = capability.name(), "tokenizer initialized");
                Some(Self { inner: capability })
            }
            Err(e) => {
                tracing::warn!(tokenizer = capability.name(), error = %e, "tokenizer init failed, skipping");
                None
            }
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Tokenizes `text` if the capability claims it.
    ///
    /// Returns `None` when the text is not claimed, or when either call errors
    /// or panics. Blank tokens are dropped.
    pub fn try_tokenization(&self, text: &str) -> Option<Vec<String>> {
        let inner = &self.inner;
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            if !inner.is_tokenizable(text)? {
                return Ok(None);
            }
            inner.tokenize(text).map(Some)
        }));

        match outcome {
            Ok(Ok(Some(tokens))) => Some(
                tokens
                    .into_iter()
                    .filter(|t| !t.trim().is_empty())
                    .collect(),
            ),
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                tracing::warn!(tokenizer = self.name(), error = %e, "tokenizer failed, ignoring its output");
                None
            }
            Err(_) => {
                tracing::warn!(tokenizer = self.name(), "tokenizer panicked, ignoring its output");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Claims words starting with `@` and splits them into single chars.
    pub(crate) struct CharSplitter;

    #[async_trait]
    impl TokenizerCapability for CharSplitter {
        fn name(&self) -> &str {
            "char-splitter"
        }

        async fn init(&mut self) -> Result<(), CapabilityError> {
            Ok(())
        }

        fn is_tokenizable(&self, text: &str) -> Result<bool, CapabilityError> {
            Ok(text.starts_with('@'))
        }

        fn tokenize(&self, text: &str) -> Result<Vec<String>, CapabilityError> {
            Ok(text.chars().skip(1).map(String::from).chain([" ".to_string()]).collect())
        }
    }

    /// Claims everything and then misbehaves.
    pub(crate) struct Broken {
        pub(crate) panics: bool,
    }

    #[async_trait]
    impl TokenizerCapability for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn init(&mut self) -> Result<(), CapabilityError> {
            Ok(())
        }

        fn is_tokenizable(&self, _text: &str) -> Result<bool, CapabilityError> {
            Ok(true)
        }

        fn tokenize(&self, _text: &str) -> Result<Vec<String>, CapabilityError> {
            if self.panics {
                panic!("segmenter blew up");
            }
            Err(CapabilityError::Other("bad input".into()))
        }
    }

    struct FailsInit;

    #[async_trait]
    impl TokenizerCapability for FailsInit {
        fn name(&self) -> &str {
            "fails-init"
        }

        async fn init(&mut self) -> Result<(), CapabilityError> {
            Err(CapabilityError::Init("missing dictionary".into()))
        }

        fn is_tokenizable(&self, _text: &str) -> Result<bool, CapabilityError> {
            Ok(true)
        }

        fn tokenize(&self, text: &str) -> Result<Vec<String>, CapabilityError> {
            Ok(vec![text.to_string()])
        }
    }

    #[tokio::test]
    async fn claimed_text_is_tokenized_without_blanks() {
        let t = ValidatedTokenizer::initialize(Box::new(CharSplitter)).await.unwrap();
        assert_eq!(t.try_tokenization("@ab"), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(t.try_tokenization("plain"), None);
    }

    #[tokio::test]
    async fn errors_and_panics_become_none() {
        let erroring = ValidatedTokenizer::initialize(Box::new(Broken { panics: false }))
            .await
            .unwrap();
        assert_eq!(erroring.try_tokenization("anything"), None);

        let panicking = ValidatedTokenizer::initialize(Box::new(Broken { panics: true }))
            .await
            .unwrap();
        assert_eq!(panicking.try_tokenization("anything"), None);
    }

    #[tokio::test]
    async fn failed_init_is_excluded() {
        assert!(ValidatedTokenizer::initialize(Box::new(FailsInit)).await.is_none());
    }
}
