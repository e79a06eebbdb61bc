//! # Observable State Primitives
//!
//! Every store in the vault core holds its state inside an
//! [`Observable<T>`]: a shared value with a version counter that bumps on
//! each mutation. Frontends obtain a [`Watcher`] and poll it from their
//! render loop; a poll returns the new state only when the version moved,
//! so bursts of mutations coalesce into a single observed update.
//!
//! The primitives are runtime-agnostic on purpose: only std locks and
//! atomics, no channels and no executor coupling. Async layers that want
//! push semantics can wrap a `Watcher` in their own polling task.

mod observable;

pub use observable::{Observable, Watcher};
