// options.rs

/// Knobs for the checker's back half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Emit specialized bodies for call sites with concrete type arguments.
    pub specialize: bool,
    /// Upper bound on specialized bodies per unit; further call sites use
    /// the general form.
    pub max_specializations: usize,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            specialize: true,
            max_specializations: 256,
        }
    }
}

impl AnalyzerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_specialize(mut self, specialize: bool) -> Self {
        self.specialize = specialize;
        self
    }

    pub fn with_max_specializations(mut self, max: usize) -> Self {
        self.max_specializations = max;
        self
    }
}
