//! Single-use resolution sinks.
//!
//! Every suspended browser-engine operation (certificate error, auth
//! challenge, file chooser, confirmation dialog) is resumed through exactly one
//! [`ResolutionSink`]. Resolving consumes the sink, so a second invocation
//! does not compile. Dropping a sink without resolving it is a defect:
//!
//! - debug builds panic, naming the sink;
//! - release builds log at `error` and resolve with `T::default()` (the
//!   deny side of every answer type) so the engine never hangs.
//!
//! Sinks bound to a [`SinkScope`] go inert once the scope is dropped: the
//! shell has been torn down and nothing may be resumed any more.

use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, error};

/// Capability that resumes one suspended engine operation with a final answer.
pub struct ResolutionSink<T: Default + 'static> {
    label: &'static str,
    callback: Option<Box<dyn FnOnce(T)>>,
    scope: Option<Weak<()>>,
}

impl<T: Default + 'static> ResolutionSink<T> {
    /// Wraps the engine's continuation. `label` identifies the sink in logs.
    pub fn new(label: &'static str, callback: impl FnOnce(T) + 'static) -> Self {
        Self {
            label,
            callback: Some(Box::new(callback)),
            scope: None,
        }
    }

    /// Ties the sink to the lifetime of `scope`.
    pub fn bind(mut self, scope: &SinkScope) -> Self {
        self.scope = Some(Rc::downgrade(&scope.alive));
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Resumes the engine operation with `value`.
    pub fn resolve(mut self, value: T) {
        let Some(callback) = self.callback.take() else {
            return;
        };
        if self.is_torn_down() {
            debug!(sink = self.label, "Scope torn down, resolution discarded");
            return;
        }
        callback(value);
    }

    fn is_torn_down(&self) -> bool {
        self.scope
            .as_ref()
            .is_some_and(|scope| scope.upgrade().is_none())
    }
}

impl<T: Default + 'static> Drop for ResolutionSink<T> {
    fn drop(&mut self) {
        let Some(callback) = self.callback.take() else {
            return;
        };
        if self.is_torn_down() {
            return;
        }

        error!(sink = self.label, "Resolution sink dropped without being resolved");
        if cfg!(debug_assertions) && !std::thread::panicking() {
            panic!("resolution sink `{}` dropped without being resolved", self.label);
        }
        callback(T::default());
    }
}

impl<T: Default + 'static> fmt::Debug for ResolutionSink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionSink")
            .field("label", &self.label)
            .field("pending", &self.callback.is_some())
            .finish()
    }
}

/// Liveness token of the component that owns pending sinks.
///
/// Dropping the scope turns every sink bound to it into a no-op.
#[derive(Debug, Default)]
pub struct SinkScope {
    alive: Rc<()>,
}

impl SinkScope {
    pub fn new() -> Self {
        Self::default()
    }
}
