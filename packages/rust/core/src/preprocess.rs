//! Preprocessor pipeline.
//!
//! Preprocessors rewrite the source text before it reaches the renderer. They
//! run strictly in registration order, each receiving the previous stage's
//! output and the same [`PreprocessorContext`], which lives for one compile.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use stylepress_shared::CompileError;

/// Scratch state shared by the preprocessors of a single compile.
#[derive(Debug, Default)]
pub struct PreprocessorContext {
    values: HashMap<String, Value>,
}

impl PreprocessorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Store a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// A content transformer run before rendering.
#[async_trait]
pub trait Preprocessor: Send + Sync {
    /// Human-readable name for tracing.
    fn name(&self) -> &str;

    /// Transform `content`. Returning an error aborts the compile.
    async fn process(
        &self,
        content: String,
        ctx: &mut PreprocessorContext,
    ) -> Result<String, CompileError>;
}

// ---------------------------------------------------------------------------
// Closure adapter
// ---------------------------------------------------------------------------

/// A synchronous closure used as a [`Preprocessor`].
pub struct FnPreprocessor<F> {
    name: String,
    f: F,
}

/// Wrap a synchronous closure as a named preprocessor.
pub fn preprocessor_fn<F>(name: impl Into<String>, f: F) -> FnPreprocessor<F>
where
    F: Fn(String, &mut PreprocessorContext) -> Result<String, CompileError> + Send + Sync,
{
    FnPreprocessor {
        name: name.into(),
        f,
    }
}

#[async_trait]
impl<F> Preprocessor for FnPreprocessor<F>
where
    F: Fn(String, &mut PreprocessorContext) -> Result<String, CompileError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        content: String,
        ctx: &mut PreprocessorContext,
    ) -> Result<String, CompileError> {
        (self.f)(content, ctx)
    }
}

// ---------------------------------------------------------------------------
// Built-in: banner
// ---------------------------------------------------------------------------

/// Prepends a `/* ... */` banner and records its text under `banner`.
#[derive(Debug, Clone)]
pub struct BannerPreprocessor {
    text: String,
}

impl BannerPreprocessor {
    /// Context key the banner text is stored under.
    pub const CONTEXT_KEY: &'static str = "banner";

    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl Preprocessor for BannerPreprocessor {
    fn name(&self) -> &str {
        "banner"
    }

    async fn process(
        &self,
        content: String,
        ctx: &mut PreprocessorContext,
    ) -> Result<String, CompileError> {
        // `*/` inside the banner would close the comment early.
        let text = self.text.replace("*/", "* /");
        ctx.insert(Self::CONTEXT_KEY, text.clone());
        Ok(format!("/* {text} */\n{content}"))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Append-only, ordered list of preprocessors.
#[derive(Clone, Default)]
pub struct PreprocessorRegistry {
    stages: Vec<Arc<dyn Preprocessor>>,
}

impl PreprocessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a preprocessor; it runs after every one registered before it.
    pub fn register(&mut self, preprocessor: impl Preprocessor + 'static) {
        self.stages.push(Arc::new(preprocessor));
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over `content` with a fresh context.
    #[instrument(skip_all, fields(stages = self.stages.len()))]
    pub async fn run(&self, content: String) -> Result<String, CompileError> {
        let mut ctx = PreprocessorContext::new();
        let mut content = content;

        for stage in &self.stages {
            content = stage.process(content, &mut ctx).await?;
            debug!(stage = stage.name(), len = content.len(), "preprocessor done");
        }

        Ok(content)
    }
}

impl std::fmt::Debug for PreprocessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreprocessorRegistry")
            .field("stages", &self.names())
            .finish()
    }
}
