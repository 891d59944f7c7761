//! Caller-facing error conditions for the Fibonacci heap.
//!
//! These are programming errors: once a call returns `Ok`, the heap
//! guarantees progress for the remainder of that call. None of them are
//! meant to be retried.

use thiserror::Error;

/// Errors surfaced by operations that accept a node handle or another heap.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// The handle passed to `decrease_key`/`delete` was not produced by this
    /// heap instance, or the node it once pointed to has already been
    /// extracted.
    #[error("node handle does not belong to this heap instance")]
    WrongHandleKind,

    /// The replacement key given to `decrease_key` compares strictly greater
    /// than the node's current key.
    #[error("replacement key is not smaller than or equal to the current key")]
    KeyNotDecreased,

    /// The heap passed to `merge` is not compatible with the receiver.
    #[error("argument heap is not compatible with this heap")]
    WrongHeapKind,
}
