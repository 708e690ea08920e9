// src/lib.rs
pub mod logging;
pub mod options;

pub use genus_frontend as frontend;
pub use genus_identity as identity;
pub use genus_runtime as runtime;
pub use genus_sema as sema;

pub use logging::init_logging;
pub use options::CompileOptions;

use genus_frontend::Program;
use genus_identity::Interner;
use genus_runtime::DescriptorRegistry;
use genus_sema::{
    AnalysisOutput, Analyzer, BridgeError, SemanticError, Specialization, TypeError, specialize,
};
use miette::Diagnostic;
use thiserror::Error;

/// A checked unit and its compiled bodies.
#[derive(Debug)]
pub struct Compiled {
    pub analysis: AnalysisOutput,
    pub specialization: Specialization,
}

#[derive(Error, Debug, Diagnostic)]
pub enum CompileError {
    #[error("{} semantic error(s)", .errors.len())]
    #[diagnostic(code(E3000))]
    Semantic {
        errors: Vec<TypeError>,
        #[related]
        diagnostics: Vec<SemanticError>,
    },

    #[error(transparent)]
    #[diagnostic(code(E3900))]
    Lowering(#[from] BridgeError),
}

impl CompileError {
    fn semantic(errors: Vec<TypeError>) -> Self {
        let diagnostics = errors.iter().map(|e| e.error.clone()).collect();
        CompileError::Semantic {
            errors,
            diagnostics,
        }
    }

    /// Collected checker errors; empty for other failures.
    pub fn type_errors(&self) -> &[TypeError] {
        match self {
            CompileError::Semantic { errors, .. } => errors,
            CompileError::Lowering(_) => &[],
        }
    }
}

/// Check `program` and compile its bodies against the process-wide
/// descriptor registry.
pub fn compile(program: &Program, interner: &Interner, options: &CompileOptions) -> Result<Compiled, CompileError> {
    compile_with(program, interner, options, genus_runtime::global())
}

pub fn compile_with(
    program: &Program,
    interner: &Interner,
    options: &CompileOptions,
    registry: &DescriptorRegistry,
) -> Result<Compiled, CompileError> {
    let mut analysis = {
        let _span = tracing::info_span!("sema").entered();
        Analyzer::builder(program, interner).build().analyze()
    };
    if analysis.has_errors() {
        tracing::debug!(errors = analysis.errors.len(), "semantic analysis failed");
        return Err(CompileError::semantic(analysis.errors));
    }

    let specialization = {
        let _span = tracing::info_span!("specialize", enabled = options.analyzer.specialize).entered();
        specialize(&mut analysis, registry, options.analyzer)?
    };
    Ok(Compiled {
        analysis,
        specialization,
    })
}
