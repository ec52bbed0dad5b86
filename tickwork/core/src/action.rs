//! Deferred actions and work items

use core::fmt;

/// A zero-argument procedure that can be stored in a fixed slot and run later.
///
/// Capturing closures normally need a heap allocation; here the capture is
/// either a context word handed to a function pointer or a closure that lives
/// in static storage. All variants are `Copy`, so an action can be read out of
/// a table inside a critical section and invoked after the section ends.
#[derive(Clone, Copy)]
pub enum Action {
    /// Plain function pointer
    Fn(fn()),
    /// Function pointer plus a context word
    WithArg(fn(usize), usize),
    /// Closure in static storage
    Static(&'static (dyn Fn() + Sync)),
}

impl Action {
    /// Create an action from a plain function
    pub const fn from_fn(f: fn()) -> Self {
        Action::Fn(f)
    }

    /// Create an action that passes `arg` to `f`
    pub const fn with_arg(f: fn(usize), arg: usize) -> Self {
        Action::WithArg(f, arg)
    }

    /// Create an action from a statically stored closure
    pub const fn from_static(f: &'static (dyn Fn() + Sync)) -> Self {
        Action::Static(f)
    }

    /// Run the action
    #[inline]
    pub fn invoke(&self) {
        match *self {
            Action::Fn(f) => f(),
            Action::WithArg(f, arg) => f(arg),
            Action::Static(f) => f(),
        }
    }
}

impl From<fn()> for Action {
    fn from(f: fn()) -> Self {
        Action::Fn(f)
    }
}

impl From<&'static (dyn Fn() + Sync)> for Action {
    fn from(f: &'static (dyn Fn() + Sync)) -> Self {
        Action::Static(f)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Fn(func) => write!(f, "Action::Fn({:p})", *func as *const ()),
            Action::WithArg(func, arg) => {
                write!(f, "Action::WithArg({:p}, {})", *func as *const (), arg)
            }
            Action::Static(_) => write!(f, "Action::Static"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Action {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Action::Fn(_) => defmt::write!(fmt, "Fn"),
            Action::WithArg(_, arg) => defmt::write!(fmt, "WithArg({})", arg),
            Action::Static(_) => defmt::write!(fmt, "Static"),
        }
    }
}

/// Entry of the deferred work queue
#[derive(Debug, Clone, Copy)]
pub struct WorkItem {
    /// What to run
    pub action: Action,
    /// Optional diagnostic tag
    pub tag: Option<&'static str>,
}

impl WorkItem {
    /// Create an untagged work item
    pub const fn new(action: Action) -> Self {
        Self { action, tag: None }
    }

    /// Create a work item carrying a diagnostic tag
    pub const fn tagged(action: Action, tag: &'static str) -> Self {
        Self {
            action,
            tag: Some(tag),
        }
    }

    /// Run the contained action
    #[inline]
    pub fn run(&self) {
        self.action.invoke();
    }
}

impl From<Action> for WorkItem {
    fn from(action: Action) -> Self {
        WorkItem::new(action)
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            Some(tag) => write!(f, "work[{}]", tag),
            None => write!(f, "work[-]"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for WorkItem {
    fn format(&self, fmt: defmt::Formatter) {
        match self.tag {
            Some(tag) => defmt::write!(fmt, "work[{=str}]", tag),
            None => defmt::write!(fmt, "work[-]"),
        }
    }
}
