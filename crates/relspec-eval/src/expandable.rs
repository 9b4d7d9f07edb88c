//! Ready-made [`Expandable`] implementations.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

use relspec_types::{
    Context, DynEvaluator, DynExpandable, EvalResult, Evaluation, Expandable, ReferenceId, Value,
};

/// Returns the same result at every depth.
pub struct StaticExpandable<R: ReferenceId> {
    result: Evaluation<R>,
}

impl<R: ReferenceId> StaticExpandable<R> {
    pub fn new(result: Evaluation<R>) -> Self {
        Self { result }
    }

    /// Wrap a plain value with no references.
    pub fn of(value: Value<R>) -> Self {
        Self::new(Evaluation::new(value))
    }
}

impl<R: ReferenceId> Expandable<R> for StaticExpandable<R> {
    fn expand(&self, _ctx: &Context, _depth: i32) -> EvalResult<Evaluation<R>> {
        Ok(self.result.clone())
    }
}

impl<R: ReferenceId> fmt::Debug for StaticExpandable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StaticExpandable").field(&self.result.value).finish()
    }
}

/// Caches the delegate's outcome per depth.
///
/// All negative depths share one slot. Failures are cached too.
pub struct MemoizedExpandable<R: ReferenceId> {
    delegate: DynExpandable<R>,
    cache: RefCell<BTreeMap<i32, EvalResult<Evaluation<R>>>>,
}

impl<R: ReferenceId> MemoizedExpandable<R> {
    pub fn new(delegate: DynExpandable<R>) -> Self {
        Self {
            delegate,
            cache: RefCell::new(BTreeMap::new()),
        }
    }
}

impl<R: ReferenceId> Expandable<R> for MemoizedExpandable<R> {
    fn expand(&self, ctx: &Context, depth: i32) -> EvalResult<Evaluation<R>> {
        let slot = depth.max(-1);
        if let Some(cached) = self.cache.borrow().get(&slot) {
            return cached.clone();
        }
        let result = self.delegate.expand(ctx, depth);
        // Cancellation belongs to this call, not to the value.
        if !matches!(&result, Err(e) if e.is_canceled()) {
            self.cache.borrow_mut().insert(slot, result.clone());
        }
        result
    }
}

/// A value evaluated lazily by a given evaluator.
pub struct ValueExpandable<R: ReferenceId> {
    value: Value<R>,
    evaluator: DynEvaluator<R>,
}

impl<R: ReferenceId> ValueExpandable<R> {
    pub fn new(value: Value<R>, evaluator: DynEvaluator<R>) -> Self {
        Self { value, evaluator }
    }
}

impl<R: ReferenceId> Expandable<R> for ValueExpandable<R> {
    fn expand(&self, ctx: &Context, depth: i32) -> EvalResult<Evaluation<R>> {
        self.evaluator.evaluate(ctx, &self.value, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relspec_types::{EvalError, DEPTH_FULL};
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counting {
        calls: Rc<Cell<usize>>,
    }

    impl Expandable<String> for Counting {
        fn expand(&self, _ctx: &Context, depth: i32) -> EvalResult<Evaluation<String>> {
            self.calls.set(self.calls.get() + 1);
            if depth == 5 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Evaluation::new(Value::Int(depth.into())))
        }
    }

    #[test]
    fn test_memoized_caches_per_depth() {
        let calls = Rc::new(Cell::new(0));
        let memo = MemoizedExpandable::new(Rc::new(Counting {
            calls: Rc::clone(&calls),
        }));
        let ctx = Context::new();
        assert_eq!(memo.expand(&ctx, 1).unwrap().value, Value::Int(1));
        assert_eq!(memo.expand(&ctx, 1).unwrap().value, Value::Int(1));
        assert_eq!(calls.get(), 1);

        memo.expand(&ctx, DEPTH_FULL).unwrap();
        memo.expand(&ctx, -7).unwrap();
        assert_eq!(calls.get(), 2);

        assert!(memo.expand(&ctx, 5).is_err());
        assert!(memo.expand(&ctx, 5).is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_static_ignores_depth() {
        let s = StaticExpandable::<String>::of(Value::from("x"));
        let ctx = Context::new();
        assert_eq!(s.expand(&ctx, 0).unwrap().value, Value::from("x"));
        assert_eq!(s.expand(&ctx, DEPTH_FULL).unwrap().value, Value::from("x"));
    }
}
