//! Compiled path-expression memo table

use std::collections::HashMap;
use std::sync::Arc;

use jmespath::Expression;
use tracing::trace;

/// Compiled expression, shareable across router tasks
pub type CompiledExpression = Arc<Expression<'static>>;

/// Memo table keyed by the literal expression text
///
/// Owned by the pipeline for the lifetime of one configuration. Identical
/// expressions used by several routes compile once.
#[derive(Default)]
pub struct ExpressionCache {
    expressions: HashMap<String, CompiledExpression>,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile an expression, or return the memoized one
    pub fn compile(
        &mut self,
        expression: &str,
    ) -> Result<CompiledExpression, jmespath::JmespathError> {
        if let Some(compiled) = self.expressions.get(expression) {
            trace!(expression, "expression cache hit");
            return Ok(compiled.clone());
        }

        let compiled = Arc::new(jmespath::compile(expression)?);
        self.expressions.insert(expression.to_string(), compiled.clone());
        Ok(compiled)
    }

    /// Number of distinct compiled expressions
    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}

impl std::fmt::Debug for ExpressionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionCache")
            .field("expressions", &self.expressions.keys().collect::<Vec<_>>())
            .finish()
    }
}
