//! Stack headroom for the recursive parser and evaluator
//!
//! Deeply nested source or deep user recursion would otherwise run the
//! host thread out of stack. `stacker` moves the work onto a freshly
//! allocated segment whenever the remaining stack drops below a red zone.

/// Minimum stack space to keep available (128KB red zone)
const RED_ZONE: usize = 128 * 1024;

/// Stack space to allocate when growing (1MB)
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, growing the stack first if it is close to exhausted
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
