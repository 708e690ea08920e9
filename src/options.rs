// src/options.rs

use genus_sema::AnalyzerOptions;

/// Pipeline options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub analyzer: AnalyzerOptions,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_analyzer(mut self, analyzer: AnalyzerOptions) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Defaults overridden by `GENUS_SPECIALIZE` and
    /// `GENUS_MAX_SPECIALIZATIONS`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut analyzer = AnalyzerOptions::default();
        if let Some(value) = var("GENUS_SPECIALIZE") {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => analyzer.specialize = true,
                "0" | "false" | "off" => analyzer.specialize = false,
                _ => tracing::warn!(%value, "ignoring malformed GENUS_SPECIALIZE"),
            }
        }
        if let Some(value) = var("GENUS_MAX_SPECIALIZATIONS") {
            match value.trim().parse::<usize>() {
                Ok(max) => analyzer.max_specializations = max,
                Err(error) => {
                    tracing::warn!(%value, %error, "ignoring malformed GENUS_MAX_SPECIALIZATIONS")
                }
            }
        }
        Self { analyzer }
    }
}
