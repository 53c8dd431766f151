//! Indented tracing for recursive passes.

use std::cell::Cell;
use std::fmt::Arguments;
use std::rc::Rc;

use crate::Level;

/// Prints indented trace lines while enabled.
///
/// Depth is shared through an `Rc`, so a [`TraceGuard`] does not borrow the
/// tracer and the owner stays free to be borrowed mutably while a traced
/// region is open.
///
/// # Example
///
/// ```
/// use pea_log::Tracer;
///
/// let tracer = Tracer::new(false);
/// {
///     let _g = tracer.enter(format_args!("gather {}", "List"));
///     assert_eq!(tracer.depth(), 0);
/// }
///
/// let tracer = Tracer::new(true);
/// let g = tracer.enter(format_args!("outer"));
/// assert_eq!(tracer.depth(), 1);
/// drop(g);
/// assert_eq!(tracer.depth(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Tracer {
    enabled: bool,
    depth: Rc<Cell<usize>>,
}

impl Tracer {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Tracer {
            enabled,
            depth: Rc::new(Cell::new(0)),
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Switches tracing on or off, returning the previous setting.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        std::mem::replace(&mut self.enabled, enabled)
    }

    /// Current nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Prints one line at the current depth.
    pub fn line(&self, args: Arguments<'_>) {
        if self.enabled {
            let indent = "  ".repeat(self.depth.get());
            crate::__write(Level::Trace, "pea", format_args!("{indent}{args}"));
        }
    }

    /// Prints a line and indents everything traced until the guard drops.
    #[must_use = "the indentation ends when the guard is dropped"]
    pub fn enter(&self, args: Arguments<'_>) -> TraceGuard {
        if !self.enabled {
            return TraceGuard { depth: None };
        }
        self.line(args);
        self.depth.set(self.depth.get() + 1);
        TraceGuard {
            depth: Some(Rc::clone(&self.depth)),
        }
    }
}

/// Restores the trace depth on drop.
#[derive(Debug)]
pub struct TraceGuard {
    depth: Option<Rc<Cell<usize>>>,
}

impl Drop for TraceGuard {
    fn drop(&mut self) {
        if let Some(depth) = &self.depth {
            depth.set(depth.get().saturating_sub(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_tracer_does_not_indent() {
        let tracer = Tracer::new(false);
        let _a = tracer.enter(format_args!("a"));
        let _b = tracer.enter(format_args!("b"));
        assert_eq!(tracer.depth(), 0);
    }

    #[test]
    fn test_nested_guards() {
        let tracer = Tracer::new(true);
        let a = tracer.enter(format_args!("a"));
        {
            let _b = tracer.enter(format_args!("b"));
            assert_eq!(tracer.depth(), 2);
        }
        assert_eq!(tracer.depth(), 1);
        drop(a);
        assert_eq!(tracer.depth(), 0);
    }

    #[test]
    fn test_set_enabled_returns_previous() {
        let mut tracer = Tracer::new(true);
        assert!(tracer.set_enabled(false));
        assert!(!tracer.enabled());
        assert!(!tracer.set_enabled(true));
    }

    #[test]
    fn test_guard_survives_disable() {
        let mut tracer = Tracer::new(true);
        let g = tracer.enter(format_args!("open"));
        tracer.set_enabled(false);
        drop(g);
        assert_eq!(tracer.depth(), 0);
    }
}
