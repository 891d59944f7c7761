//! A generic Fibonacci heap.
//!
//! [`FibonacciHeap`] is a mergeable priority queue backed by an intrusive
//! forest of heap-ordered trees: `insert`, [`FibonacciHeap::minimum`],
//! [`FibonacciHeap::merge`] and [`FibonacciHeap::decrease_key`] run in
//! amortized O(1); [`FibonacciHeap::extract_min`] and
//! [`FibonacciHeap::delete`] run in amortized O(log n). The heap is generic
//! over the element type and, optionally, over a caller-supplied total
//! order via [`Comparator`] — the default, [`NaturalOrder`], just defers to
//! `T: Ord`.
//!
//! ```
//! use fibheap::FibonacciHeap;
//!
//! let mut heap = FibonacciHeap::new();
//! heap.insert(5);
//! let three = heap.insert(3);
//! heap.insert(8);
//!
//! heap.decrease_key(&three, 1).unwrap();
//! assert_eq!(heap.extract_min().map(|n| n.into_element()), Some(1));
//! ```

mod comparator;
mod error;
mod fibonacci_heap;

pub use comparator::{Comparator, NaturalOrder};
pub use error::HeapError;
pub use fibonacci_heap::{ExtractedNode, FibonacciHeap, NodeHandle};
