//! Per-thread component context
//!
//! Each thread keeps a stack of component names. The dotted join of the stack
//! is the thread's context path, and context-bound logging (the macros without
//! an explicit logger) goes to the logger of that name. Pushing returns a
//! [`ContextGuard`]; dropping the guard pops the frame, including during
//! unwinding.
//!
//! A push may also install a level on the context's logger. The displaced
//! level is restored when the frame is popped.
//!
//! ```
//! use hierarchical_logger::{LogContext, LogLevel};
//!
//! {
//!     let _comp = LogContext::push("component", None);
//!     let sub = LogContext::push("subcomponent", LogLevel::Trace);
//!     assert_eq!(LogContext::current_path(), "component.subcomponent");
//!     assert_eq!(sub.level(), Some(LogLevel::Trace));
//! }
//! assert_eq!(LogContext::current_path(), "");
//! ```

use super::{log_level::LogLevel, logger::Logger, registry::Registry};
use std::cell::RefCell;
use std::marker::PhantomData;

thread_local! {
    static CONTEXT: RefCell<ContextStack> = RefCell::new(ContextStack::new());
}

/// Level installed by a frame, with the value to put back on pop
#[derive(Debug)]
struct LevelOverride {
    logger: Logger,
    displaced: Option<LogLevel>,
}

#[derive(Debug)]
pub struct ContextFrame {
    id: u64,
    component: String,
    saved_path: String,
    logger: Logger,
    level_override: Option<LevelOverride>,
}

impl ContextFrame {
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Logger named by the path this frame introduced
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Context path before this frame was pushed
    pub fn saved_path(&self) -> &str {
        &self.saved_path
    }

    fn restore(self) {
        if let Some(level_override) = self.level_override {
            level_override
                .logger
                .replace_level(level_override.displaced);
        }
    }
}

/// Identifies one pushed frame; ids are never reused within a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameTicket {
    depth: usize,
    id: u64,
}

/// Stack of components for one thread
#[derive(Debug, Default)]
pub struct ContextStack {
    frames: Vec<ContextFrame>,
    path: String,
    next_id: u64,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dotted join of the pushed components; empty at depth zero
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|frame| frame.component.as_str())
    }

    /// Path that pushing `component` would produce
    pub fn child_path(&self, component: &str) -> String {
        if self.path.is_empty() {
            component.to_string()
        } else {
            format!("{}.{}", self.path, component)
        }
    }

    /// Logger of the innermost frame, or the root at depth zero
    ///
    /// `None` when the innermost frame belongs to another registry.
    pub fn current_logger(&self, registry: &Registry) -> Option<Logger> {
        match self.frames.last() {
            None => Some(registry.root()),
            Some(frame) if frame.logger.registry().ptr_eq(registry) => Some(frame.logger.clone()),
            Some(_) => None,
        }
    }

    fn push(
        &mut self,
        component: &str,
        logger: Logger,
        level_override: Option<LevelOverride>,
    ) -> FrameTicket {
        let child = self.child_path(component);
        let saved_path = std::mem::replace(&mut self.path, child);
        let id = self.next_id;
        self.next_id += 1;
        self.frames.push(ContextFrame {
            id,
            component: component.to_string(),
            saved_path,
            logger,
            level_override,
        });
        FrameTicket {
            depth: self.frames.len(),
            id,
        }
    }

    /// Pop the ticket's frame and everything above it
    ///
    /// Nothing is popped when the frame is already gone, even if newer
    /// frames now occupy its depth.
    fn pop_frame(&mut self, ticket: FrameTicket) -> Vec<ContextFrame> {
        let live = ticket
            .depth
            .checked_sub(1)
            .and_then(|index| self.frames.get(index))
            .is_some_and(|frame| frame.id == ticket.id);
        if live {
            self.unwind_to(ticket.depth - 1)
        } else {
            Vec::new()
        }
    }

    /// Pop frames until `depth` remain, innermost first
    fn unwind_to(&mut self, depth: usize) -> Vec<ContextFrame> {
        let mut popped = Vec::new();
        while self.frames.len() > depth {
            if let Some(frame) = self.frames.pop() {
                self.path = frame.saved_path.clone();
                popped.push(frame);
            }
        }
        popped
    }
}

/// Context path of the calling thread
pub fn current_path() -> String {
    CONTEXT
        .try_with(|stack| stack.borrow().path().to_string())
        .unwrap_or_default()
}

/// Number of frames on the calling thread's stack
pub fn depth() -> usize {
    CONTEXT.try_with(|stack| stack.borrow().depth()).unwrap_or(0)
}

/// Cached logger for the calling thread's context in `registry`
pub(crate) fn current_logger(registry: &Registry) -> Option<Logger> {
    CONTEXT
        .try_with(|stack| stack.borrow().current_logger(registry))
        .ok()
        .flatten()
}

/// Entry points for pushing context frames
pub struct LogContext;

impl LogContext {
    /// Push `component` onto this thread's context in the global registry
    ///
    /// When `level` is given it becomes the explicit level of the context's
    /// logger until the guard is dropped.
    #[must_use = "the context is popped as soon as the guard is dropped"]
    pub fn push(component: &str, level: impl Into<Option<LogLevel>>) -> ContextGuard {
        Self::push_in(Registry::global(), component, level)
    }

    /// Push a frame whose logger lives in `registry`
    #[must_use = "the context is popped as soon as the guard is dropped"]
    pub fn push_in(
        registry: &Registry,
        component: &str,
        level: impl Into<Option<LogLevel>>,
    ) -> ContextGuard {
        let path = CONTEXT
            .try_with(|stack| stack.borrow().child_path(component))
            .unwrap_or_else(|_| component.to_string());
        let logger = registry.get_logger(&path);
        let level_override = level.into().map(|level| LevelOverride {
            logger: logger.clone(),
            displaced: logger.replace_level(Some(level)),
        });

        let ticket = CONTEXT
            .try_with(|stack| {
                stack
                    .borrow_mut()
                    .push(component, logger.clone(), level_override)
            })
            .ok();

        ContextGuard {
            ticket,
            logger,
            _thread_bound: PhantomData,
        }
    }

    pub fn current_path() -> String {
        current_path()
    }

    pub fn depth() -> usize {
        depth()
    }
}

/// RAII guard for one context frame
///
/// Dropping the guard pops its frame and any frames pushed after it that are
/// still open, restoring displaced levels innermost first. A guard whose
/// frame was already popped by an outer guard does nothing. The guard is
/// tied to the thread that created it.
pub struct ContextGuard {
    ticket: Option<FrameTicket>,
    logger: Logger,
    _thread_bound: PhantomData<*const ()>,
}

impl ContextGuard {
    /// Context path this frame introduced
    pub fn path(&self) -> &str {
        self.logger.name()
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn level(&self) -> Option<LogLevel> {
        self.logger.level()
    }

    /// Set the context logger's level; the change outlives the frame
    pub fn set_level(&self, level: impl Into<Option<LogLevel>>) {
        self.logger.set_level(level);
    }

    pub fn effective_level(&self) -> LogLevel {
        self.logger.effective_level()
    }

    pub fn is_enabled_for(&self, level: LogLevel) -> bool {
        self.logger.is_enabled_for(level)
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket else {
            return;
        };
        let popped = CONTEXT
            .try_with(|stack| stack.borrow_mut().pop_frame(ticket))
            .unwrap_or_default();
        for frame in popped {
            frame.restore();
        }
    }
}
