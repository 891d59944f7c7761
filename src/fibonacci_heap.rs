//! Fibonacci Heap
//!
//! A mergeable priority queue backed by an intrusive forest of heap-ordered
//! trees. Roots and every child list form a circular doubly linked list
//! (`left`/`right`), so a node spliced into a list of one becomes its own
//! `left`/`right`. `insert`, `minimum`, `merge` and `decrease_key` are
//! amortized O(1); `extract_min` and `delete` are amortized O(log n), paid
//! for by the consolidation pass that runs after every extraction.
//!
//! ---------------------------------------------------------------------------

use std::cmp::Ordering;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::comparator::{Comparator, NaturalOrder};
use crate::error::HeapError;

static NEXT_HEAP_ID: AtomicU64 = AtomicU64::new(0);

/// An intrusive tree node. `left`/`right` are never meaningless: a solitary
/// node is its own `left` and `right`.
struct Node<T> {
    element: T,
    node_id: u64,
    degree: usize,
    marked: bool,
    parent: Option<usize>,
    child: Option<usize>,
    left: usize,
    right: usize,
}

impl<T> Node<T> {
    fn new(element: T, node_id: u64, idx: usize) -> Self {
        Node {
            element,
            node_id,
            degree: 0,
            marked: false,
            parent: None,
            child: None,
            left: idx,
            right: idx,
        }
    }
}

/// Opaque reference to a node owned by one particular [`FibonacciHeap`].
///
/// Valid from the moment it is returned by [`FibonacciHeap::insert`] until
/// the node is removed by [`FibonacciHeap::extract_min`] or
/// [`FibonacciHeap::delete`]. Passing a handle to a heap other than the one
/// that produced it, or a handle whose node has already been removed,
/// yields [`HeapError::WrongHandleKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle {
    index: usize,
    node_id: u64,
    heap_id: u64,
}

impl NodeHandle {
    /// Borrows the element this handle refers to, or `None` if the handle
    /// is stale (already extracted) or belongs to a different heap.
    pub fn element<'a, T, C: Comparator<T>>(&self, heap: &'a FibonacciHeap<T, C>) -> Option<&'a T> {
        let idx = heap.validate(self).ok()?;
        Some(&heap.node(idx).element)
    }

    /// The advisory `<element> | [* ]↓<degree>` representation used by the
    /// display collaborator. `None` under the same conditions as
    /// [`NodeHandle::element`].
    pub fn describe<T, C>(&self, heap: &FibonacciHeap<T, C>) -> Option<String>
    where
        T: fmt::Display,
        C: Comparator<T>,
    {
        let idx = heap.validate(self).ok()?;
        let node = heap.node(idx);
        Some(format!(
            "{} | {}\u{2193}{}",
            node.element,
            if node.marked { "* " } else { "" },
            node.degree
        ))
    }
}

/// A node handed back by [`FibonacciHeap::extract_min`] or
/// [`FibonacciHeap::delete`].
///
/// Unlike [`NodeHandle`] this owns its element outright: once a node is
/// extracted the heap has no further claim on it, so there is nothing left
/// to look up in the arena.
#[derive(Debug, Clone)]
pub struct ExtractedNode<T> {
    element: T,
    degree: usize,
    was_marked: bool,
}

impl<T> ExtractedNode<T> {
    /// Borrows the extracted element.
    pub fn element(&self) -> &T {
        &self.element
    }

    /// Consumes the handle, yielding the extracted element.
    pub fn into_element(self) -> T {
        self.element
    }

    /// Degree the node had immediately before it was removed from the forest.
    pub fn degree(&self) -> usize {
        self.degree
    }
}

impl<T: fmt::Display> fmt::Display for ExtractedNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {}\u{2193}{}",
            self.element,
            if self.was_marked { "* " } else { "" },
            self.degree
        )
    }
}

/// A Fibonacci heap over `T`, ordered by `C` (defaults to `T`'s own `Ord`).
pub struct FibonacciHeap<T, C = NaturalOrder> {
    nodes: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    min: Option<usize>,
    size: usize,
    roots: usize,
    cmp: C,
    heap_id: u64,
    next_node_id: u64,
}

impl<T: Ord> FibonacciHeap<T, NaturalOrder> {
    /// Creates an empty heap ordered by `T`'s own `Ord` implementation.
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<T: Ord> Default for FibonacciHeap<T, NaturalOrder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> FromIterator<T> for FibonacciHeap<T, NaturalOrder> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut heap = Self::new();
        for element in iter {
            heap.insert(element);
        }
        heap
    }
}

impl<T, C: Comparator<T>> FibonacciHeap<T, C> {
    /// Creates an empty heap ordered by a caller-supplied comparator.
    pub fn with_comparator(cmp: C) -> Self {
        FibonacciHeap {
            nodes: Vec::new(),
            free: Vec::new(),
            min: None,
            size: 0,
            roots: 0,
            cmp,
            heap_id: NEXT_HEAP_ID.fetch_add(1, AtomicOrdering::SeqCst),
            next_node_id: 0,
        }
    }

    // ------------------------------------------------------------------
    // Public API
    // ------------------------------------------------------------------

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of trees currently in the root list.
    pub fn root_count(&self) -> usize {
        self.roots
    }

    /// Borrows the minimum element under `cmp`, or `None` if the heap is
    /// empty. O(1).
    pub fn minimum(&self) -> Option<&T> {
        self.min.map(|m| &self.node(m).element)
    }

    /// Drops every node. O(1) from the heap's point of view; dropping the
    /// individual elements may of course cost O(n).
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.min = None;
        self.size = 0;
        self.roots = 0;
    }

    /// Inserts `element` and returns a handle to its node. O(1) amortized.
    pub fn insert(&mut self, element: T) -> NodeHandle {
        let idx = self.reserve_slot();
        let node_id = self.next_node_id;
        self.next_node_id += 1;
        self.nodes[idx] = Some(Node::new(element, node_id, idx));

        self.add_to_root(idx);
        self.size += 1;
        self.roots += 1;
        self.update_min(idx);

        tracing::trace!(heap_id = self.heap_id, idx, "insert");

        NodeHandle {
            index: idx,
            node_id,
            heap_id: self.heap_id,
        }
    }

    /// Absorbs `other` into `self`, leaving `other` empty.
    ///
    /// Mixing heaps built with incompatible comparators is undefined;
    /// within this crate `C` is fixed at compile time, so that case cannot
    /// arise here. The `Result` is kept for parity with
    /// `decrease_key`/`delete`'s error surface and for forward
    /// compatibility with a type-erased comparator.
    pub fn merge(&mut self, mut other: Self) -> Result<(), HeapError> {
        if other.size == 0 {
            return Ok(());
        }

        tracing::trace!(
            heap_id = self.heap_id,
            other_heap_id = other.heap_id,
            self_size = self.size,
            other_size = other.size,
            "merge"
        );

        // Each heap owns a private arena, so indices coming from `other`
        // must be rebased before its nodes can live alongside ours.
        let offset = self.nodes.len();
        for slot in other.nodes.iter_mut() {
            if let Some(node) = slot {
                node.left += offset;
                node.right += offset;
                node.parent = node.parent.map(|p| p + offset);
                node.child = node.child.map(|c| c + offset);
            }
        }
        let other_min = other.min.map(|m| m + offset);
        self.free.extend(other.free.iter().map(|f| f + offset));
        self.nodes.append(&mut other.nodes);

        match (self.min, other_min) {
            (None, _) => self.min = other_min,
            (Some(_), None) => {}
            (Some(min_idx), Some(other_min_idx)) => {
                // Splice other's root ring in between `min` and its right
                // neighbor: the genuine O(1) pointer swap the textbook
                // algorithm describes.
                let min_right = self.node(min_idx).right;
                let other_min_left = self.node(other_min_idx).left;
                self.node_mut(min_idx).right = other_min_idx;
                self.node_mut(other_min_idx).left = min_idx;
                self.node_mut(other_min_left).right = min_right;
                self.node_mut(min_right).left = other_min_left;

                if self.cmp.compare(&self.node(other_min_idx).element, &self.node(min_idx).element)
                    == Ordering::Less
                {
                    self.min = Some(other_min_idx);
                }
            }
        }

        self.size += other.size;
        self.roots += other.roots;

        other.nodes = Vec::new();
        other.free = Vec::new();
        other.min = None;
        other.size = 0;
        other.roots = 0;

        Ok(())
    }

    /// Decreases (or keeps equal) the key at `handle`. O(1) amortized.
    ///
    /// Returns [`HeapError::WrongHandleKind`] if `handle` is not live in
    /// this heap, and [`HeapError::KeyNotDecreased`] if `element` compares
    /// strictly greater than the node's current element.
    pub fn decrease_key(&mut self, handle: &NodeHandle, element: T) -> Result<(), HeapError> {
        let idx = self.validate(handle)?;

        if self.cmp.compare(&element, &self.node(idx).element) == Ordering::Greater {
            return Err(HeapError::KeyNotDecreased);
        }

        self.node_mut(idx).element = element;
        tracing::trace!(heap_id = self.heap_id, idx, "decrease_key");
        self.rearrange(idx, false);
        Ok(())
    }

    /// Removes and returns the minimum node, or `None` if empty. O(log n)
    /// amortized.
    pub fn extract_min(&mut self) -> Option<ExtractedNode<T>> {
        if self.min.is_none() {
            return None;
        }
        Some(self.extract_min_unchecked())
    }

    /// Removes `handle`'s node from the heap regardless of its key, treating
    /// it as negative infinity. O(log n) amortized.
    pub fn delete(&mut self, handle: &NodeHandle) -> Result<ExtractedNode<T>, HeapError> {
        let idx = self.validate(handle)?;
        tracing::trace!(heap_id = self.heap_id, idx, "delete");
        self.rearrange(idx, true);
        debug_assert_eq!(self.min, Some(idx));
        Ok(self.extract_min_unchecked())
    }

    // ------------------------------------------------------------------
    // Internal: arena access
    // ------------------------------------------------------------------

    fn node(&self, idx: usize) -> &Node<T> {
        self.nodes[idx]
            .as_ref()
            .expect("arena slot referenced by a live link must be occupied")
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<T> {
        self.nodes[idx]
            .as_mut()
            .expect("arena slot referenced by a live link must be occupied")
    }

    fn reserve_slot(&mut self) -> usize {
        if let Some(idx) = self.free.pop() {
            idx
        } else {
            self.nodes.push(None);
            self.nodes.len() - 1
        }
    }

    fn validate(&self, handle: &NodeHandle) -> Result<usize, HeapError> {
        if handle.heap_id != self.heap_id {
            return Err(HeapError::WrongHandleKind);
        }
        match self.nodes.get(handle.index).and_then(|slot| slot.as_ref()) {
            Some(node) if node.node_id == handle.node_id => Ok(handle.index),
            _ => Err(HeapError::WrongHandleKind),
        }
    }

    fn update_min(&mut self, idx: usize) {
        match self.min {
            None => self.min = Some(idx),
            Some(m) if self.cmp.compare(&self.node(idx).element, &self.node(m).element) == Ordering::Less => {
                self.min = Some(idx);
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Internal: circular sibling list primitives
    // ------------------------------------------------------------------

    /// Splices `idx` into the root list immediately to the right of `min`
    /// (or makes it the sole root if the heap was empty). Does not touch
    /// `roots`/`size`/`min` bookkeeping beyond `min` itself; callers own
    /// the rest.
    fn add_to_root(&mut self, idx: usize) {
        match self.min {
            None => {
                self.node_mut(idx).left = idx;
                self.node_mut(idx).right = idx;
                self.min = Some(idx);
            }
            Some(min_idx) => {
                let left = self.node(min_idx).left;
                self.node_mut(idx).left = left;
                self.node_mut(idx).right = min_idx;
                self.node_mut(left).right = idx;
                self.node_mut(min_idx).left = idx;
            }
        }
    }

    /// Removes `idx` from whichever circular list it currently sits in and
    /// leaves it as a self-looped singleton.
    fn detach(&mut self, idx: usize) {
        let l = self.node(idx).left;
        let r = self.node(idx).right;
        self.node_mut(l).right = r;
        self.node_mut(r).left = l;
        self.node_mut(idx).left = idx;
        self.node_mut(idx).right = idx;
    }

    /// Makes `child` a child of `parent`, detaching it from wherever it
    /// currently lives first.
    fn link(&mut self, child: usize, parent: usize) {
        self.detach(child);
        match self.node(parent).child {
            Some(c) => {
                let left = self.node(c).left;
                self.node_mut(child).left = left;
                self.node_mut(child).right = c;
                self.node_mut(left).right = child;
                self.node_mut(c).left = child;
            }
            None => {
                self.node_mut(parent).child = Some(child);
            }
        }
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).degree += 1;
        self.node_mut(child).marked = false;
    }

    // ------------------------------------------------------------------
    // Internal: cut / cascading cut / rearrange
    // ------------------------------------------------------------------

    /// Detaches `idx` from its parent `parent` into the root list. Clears
    /// `marked` unconditionally: a node that becomes a root can no longer
    /// owe a cascading cut to anyone (invariant 7 — only non-root nodes may
    /// be marked).
    fn cut(&mut self, idx: usize, parent: usize) {
        tracing::trace!(heap_id = self.heap_id, idx, parent, "cut");
        if self.node(parent).child == Some(idx) {
            let right = self.node(idx).right;
            self.node_mut(parent).child = if right != idx { Some(right) } else { None };
        }
        self.detach(idx);
        self.node_mut(parent).degree -= 1;

        self.node_mut(idx).parent = None;
        self.node_mut(idx).marked = false;
        self.add_to_root(idx);
        self.roots += 1;
    }

    fn cascading_cut(&mut self, mut idx: usize) {
        loop {
            let parent = match self.node(idx).parent {
                Some(p) => p,
                None => break,
            };
            if !self.node(idx).marked {
                self.node_mut(idx).marked = true;
                break;
            }
            self.cut(idx, parent);
            idx = parent;
        }
    }

    /// Shared by `decrease_key` (`force = false`) and `delete`
    /// (`force = true`, treats `idx` as negative infinity).
    fn rearrange(&mut self, idx: usize, force: bool) {
        if let Some(parent) = self.node(idx).parent {
            let violates = force
                || self.cmp.compare(&self.node(idx).element, &self.node(parent).element) == Ordering::Less;
            if violates {
                self.cut(idx, parent);
                self.cascading_cut(parent);
            }
        }

        let becomes_min = force
            || match self.min {
                Some(m) => self.cmp.compare(&self.node(idx).element, &self.node(m).element) == Ordering::Less,
                None => true,
            };
        if becomes_min {
            self.min = Some(idx);
        }
    }

    // ------------------------------------------------------------------
    // Internal: extraction and consolidation
    // ------------------------------------------------------------------

    fn extract_min_unchecked(&mut self) -> ExtractedNode<T> {
        let z = self.min.expect("extract_min_unchecked requires a non-empty heap");
        tracing::trace!(heap_id = self.heap_id, idx = z, "extract_min");

        // Promote every child of z into the root list. Marks are cleared
        // here too: a promoted child is now a root, and only non-root nodes
        // may be marked (invariant 7).
        if let Some(first_child) = self.node(z).child {
            let mut cur = first_child;
            loop {
                let next = self.node(cur).right; // snapshot before detach
                self.node_mut(cur).parent = None;
                self.node_mut(cur).marked = false;
                self.detach(cur);
                self.add_to_root(cur);
                self.roots += 1;
                if next == first_child {
                    break;
                }
                cur = next;
            }
            self.node_mut(z).child = None;
        }

        let successor = self.node(z).right;
        self.detach(z);
        self.roots -= 1;
        self.size -= 1;

        let freed = self.nodes[z].take().expect("z must still be occupied");
        self.free.push(z);

        if successor == z {
            // z had no children and no other roots: the heap is now empty.
            self.min = None;
        } else {
            self.min = Some(successor);
            self.consolidate();
        }

        ExtractedNode {
            element: freed.element,
            degree: freed.degree,
            was_marked: freed.marked,
        }
    }

    /// Merges root trees of equal degree until every root has a distinct
    /// degree, then recomputes `min` from what remains. Invoked only when
    /// the heap is non-empty.
    fn consolidate(&mut self) {
        let phi = (1.0_f64 + 5.0_f64.sqrt()) / 2.0;
        let table_size = ((self.size.max(1) as f64).log(phi).ceil() as usize + 1).max(1);
        tracing::debug!(heap_id = self.heap_id, roots = self.roots, table_size, "consolidate");
        let mut table: Vec<Option<usize>> = vec![None; table_size];

        let start = self.min.expect("consolidate requires a non-empty heap");
        let mut roots = Vec::with_capacity(self.roots);
        let mut w = start;
        loop {
            roots.push(w);
            w = self.node(w).right; // pre-mutation snapshot of the whole ring
            if w == start {
                break;
            }
        }

        for mut x in roots {
            let mut d = self.node(x).degree;
            while let Some(mut y) = table[d].take() {
                if self.cmp.compare(&self.node(y).element, &self.node(x).element) == Ordering::Less {
                    std::mem::swap(&mut x, &mut y);
                }
                self.link(y, x);
                d += 1;
                if d >= table.len() {
                    table.resize(d + 1, None);
                }
            }
            table[d] = Some(x);
        }

        self.min = None;
        self.roots = 0;
        for idx in table.into_iter().flatten() {
            self.node_mut(idx).left = idx;
            self.node_mut(idx).right = idx;
            self.add_to_root(idx);
            self.roots += 1;
            self.update_min(idx);
        }
    }
}

impl<T, C> FibonacciHeap<T, C>
where
    T: fmt::Display,
    C: Comparator<T>,
{
    /// Walks the forest and renders the advisory per-node representation
    /// indented by tree depth, one node per line. Read-only: never mutates
    /// the heap. This is the contract the external display/logging
    /// collaborator relies on.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        if let Some(start) = self.min {
            let mut w = start;
            loop {
                self.write_subtree(w, 0, &mut out);
                w = self.node(w).right;
                if w == start {
                    break;
                }
            }
        }
        out
    }

    fn write_subtree(&self, idx: usize, depth: usize, out: &mut String) {
        let node = self.node(idx);
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!(
            "{} | {}\u{2193}{}\n",
            node.element,
            if node.marked { "* " } else { "" },
            node.degree
        ));
        if let Some(first_child) = node.child {
            let mut c = first_child;
            loop {
                self.write_subtree(c, depth + 1, out);
                c = self.node(c).right;
                if c == first_child {
                    break;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
