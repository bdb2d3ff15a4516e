//! Request context handed to every provider, resource and data source call
//!
//! Calls are single-shot with no deadlines or cancellation, so the context
//! carries no state. It stays in every trait signature so handlers share one
//! calling convention.

/// Context passed as the first parameter to all async trait methods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context;

impl Context {
    pub fn new() -> Self {
        Context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_new_matches_default() {
        let ctx = Context::new();
        let copy = ctx;
        assert_eq!(ctx, Context::default());
        assert_eq!(copy, ctx);
    }
}
