//! Nested Diagnostic Context
//!
//! A per-thread stack of free-form messages rendered by `%x`, entries joined
//! by single spaces. The stack is independent of the component stack kept by
//! [`LogContext`](super::LogContext): entering a component changes the logger
//! name, not the NDC. An empty NDC renders as `null`.
//!
//! # Example
//!
//! ```
//! use hierarchical_logger::ndc;
//!
//! assert_eq!(ndc::get(), None);
//! {
//!     let _outer = ndc::push("client=10.0.0.7");
//!     let _inner = ndc::push("txn=42");
//!     assert_eq!(ndc::get().as_deref(), Some("client=10.0.0.7 txn=42"));
//! }
//! assert_eq!(ndc::depth(), 0);
//! ```

use std::cell::RefCell;
use std::marker::PhantomData;

/// What `%x` renders for a thread with an empty NDC
pub const EMPTY_NDC: &str = "null";

thread_local! {
    static THREAD_NDC: RefCell<NdcStack> = const {
        RefCell::new(NdcStack {
            entries: Vec::new(),
            next_id: 0,
        })
    };
}

struct NdcStack {
    entries: Vec<(u64, String)>,
    next_id: u64,
}

fn with_stack<R>(default: R, f: impl FnOnce(&mut NdcStack) -> R) -> R {
    THREAD_NDC
        .try_with(|stack| f(&mut stack.borrow_mut()))
        .unwrap_or(default)
}

/// Push a message for the lifetime of the returned guard
pub fn push(message: impl Into<String>) -> NdcGuard {
    let message = message.into();
    let ticket = with_stack(None, move |stack| {
        let id = stack.next_id;
        stack.next_id += 1;
        stack.entries.push((id, message));
        Some((stack.entries.len(), id))
    });
    NdcGuard {
        ticket,
        _thread_bound: PhantomData,
    }
}

/// Remove and return the innermost message
pub fn pop() -> Option<String> {
    with_stack(None, |stack| stack.entries.pop().map(|(_, message)| message))
}

/// Innermost message without removing it
pub fn peek() -> Option<String> {
    with_stack(None, |stack| stack.entries.last().map(|(_, message)| message.clone()))
}

/// All messages joined by spaces, `None` when the stack is empty
pub fn get() -> Option<String> {
    with_stack(None, |stack| {
        if stack.entries.is_empty() {
            return None;
        }
        let messages: Vec<&str> = stack.entries.iter().map(|(_, m)| m.as_str()).collect();
        Some(messages.join(" "))
    })
}

pub fn depth() -> usize {
    with_stack(0, |stack| stack.entries.len())
}

pub fn clear() {
    with_stack((), |stack| stack.entries.clear());
}

/// RAII guard returned by [`push`]
///
/// Dropping it truncates the stack back to the depth it had before the push,
/// which also discards anything pushed after it and not yet popped. If its
/// entry was already popped or cleared, dropping it does nothing.
pub struct NdcGuard {
    ticket: Option<(usize, u64)>,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for NdcGuard {
    fn drop(&mut self) {
        let Some((depth, id)) = self.ticket else {
            return;
        };
        with_stack((), |stack| {
            let index = depth - 1;
            if stack.entries.get(index).is_some_and(|(entry, _)| *entry == id) {
                stack.entries.truncate(index);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_render() {
        std::thread::spawn(|| {
            assert_eq!(get(), None);
            let _a = push("a");
            let _b = push("b c");
            assert_eq!(get().as_deref(), Some("a b c"));
            assert_eq!(peek().as_deref(), Some("b c"));
            assert_eq!(depth(), 2);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_guard_truncates_inner_entries() {
        std::thread::spawn(|| {
            let outer = push("outer");
            let _inner = push("inner");
            drop(outer);
            assert_eq!(depth(), 0);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_pop_and_clear() {
        std::thread::spawn(|| {
            let _guard = push("x");
            assert_eq!(pop().as_deref(), Some("x"));
            assert_eq!(pop(), None);
            let a = push("y");
            let _b = push("z");
            clear();
            assert_eq!(get(), None);

            // Guards of cleared entries leave newer entries alone
            let _c = push("c");
            drop(a);
            assert_eq!(get().as_deref(), Some("c"));
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_thread_isolation() {
        std::thread::spawn(|| {
            let _guard = push("here");
            let other = std::thread::spawn(get).join().unwrap();
            assert_eq!(other, None);
        })
        .join()
        .unwrap();
    }
}
