//! An intrusive, allocation-free AVL tree.
//!
//! Nodes carry their own [`Links`] and are handed to the tree through the [`cordyceps::Linked`]
//! trait, so linking a node never allocates. Every operation other than whole-tree walks completes
//! in _O(log(n))_ time, which makes the tree usable in hard-real-time and `no_std` contexts.
#![cfg_attr(not(any(test, feature = "std")), no_std)]

// Conventions used in comments:
// - The height of a subtree rooted at `x` is denoted `h(x)`; an empty subtree has height 0.
// - The balance factor of a node `x` is denoted `b(x)`, and is defined as
//   `h(right(x)) - h(left(x))`.
// - The parent of a node `x` is denoted `p(x)`.
// - A node is `left-heavy` if `b(x) < 0` and `right-heavy` if `b(x) > 0`.
//
// The fundamental invariants of an AVL tree are:
// 1. For every node `x`, `b(x) ∈ {-1, 0, 1}`.
// 2. The stored balance factor of every node equals its actual balance factor.
//
// Both may be violated transiently while a rotation or a retrace is in progress, but hold again
// once a public method returns.

mod balance;
mod cursor;
mod entry;
mod iter;
pub mod offset;
mod traverse;
mod utils;

#[cfg(any(test, feature = "model"))]
pub mod model;


use core::{cell::UnsafeCell, cmp::Ordering, fmt, marker::PhantomPinned, mem, ops::Not, pin::Pin, ptr::NonNull};

use cordyceps::Linked;

pub use crate::{
    cursor::{Cursor, CursorMut},
    entry::{Entry, OccupiedEntry, VacantEntry},
    iter::Iter,
    traverse::{Direction, Traversal},
};
use crate::{
    entry::InsertAs,
    utils::{find_extremum, links, links_mut, which_child},
};

/// An intrusive AVL tree.
///
/// The tree never allocates: nodes are supplied by the caller as [`Linked::Handle`]s and handed
/// back when they are removed. Whether dropping the tree frees its nodes is therefore decided by
/// the handle type; a `Box` handle frees them, a `NonNull` handle does not.
pub struct AvlTree<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
}

/// Links to other nodes in an [`AvlTree`].
///
/// A type must embed a `Links` in order to be stored in an `AvlTree`. At rest (before insertion
/// and after removal) all links are empty and the balance factor is zero.
pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Dir {
    Left = 0,
    Right = 1,
}

impl Dir {
    /// The balance factor delta caused by this side growing by one level.
    #[inline]
    fn delta(self) -> i8 {
        match self {
            Dir::Left => -1,
            Dir::Right => 1,
        }
    }
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    balance: i8,
    _unpin: PhantomPinned,
}

type Link<T> = Option<NonNull<T>>;

/// Outcome of descending the tree with a comparator.
enum Search<T: ?Sized> {
    Found(NonNull<T>),
    Vacant(InsertAs<T>),
}

impl<T> AvlTree<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> AvlTree<T> {
        AvlTree { root: None, len: 0 }
    }

    /// Returns `true` if the tree contains no elements.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len() == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns a reference to the root element, if any.
    pub fn root(&self) -> Option<Pin<&T>> {
        self.root.map(|root| unsafe { Pin::new_unchecked(root.as_ref()) })
    }

    /// Checks the structural invariants of the whole tree, panicking on the first violation.
    ///
    /// Ordering is not checked here since the tree has no notion of keys; compare an in-order
    /// traversal against the expected order instead.
    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let mut count = 0;

        if let Some(root) = self.root {
            unsafe {
                assert_eq!(links(root).parent(), None, "root must not have a parent");
                self.assert_invariants_at(root, &mut count);
            }
        }

        assert_eq!(count, self.len, "element count does not match `len`");
    }

    // Returns the height of the subtree rooted at `node`.
    #[allow(clippy::only_used_in_recursion)]
    unsafe fn assert_invariants_at(&self, node: NonNull<T>, count: &mut usize) -> i32 {
        *count += 1;

        unsafe {
            let mut heights = [0; 2];

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = links(node).child(dir) {
                    // Ensure child's parent link points to this node.
                    let parent = links(child)
                        .parent()
                        .expect("child parent pointer not set");
                    assert_eq!(node, parent, "child parent pointer does not point at its parent");

                    heights[dir as usize] = self.assert_invariants_at(child, count);
                }
            }

            let balance = links(node).balance();
            assert!((-1..=1).contains(&balance), "balance factor {balance} out of range");
            assert_eq!(
                i32::from(balance),
                heights[Dir::Right as usize] - heights[Dir::Left as usize],
                "stored balance factor does not match subtree heights"
            );

            1 + heights[0].max(heights[1])
        }
    }

    /// Returns a reference to the element for which `cmp` returns [`Ordering::Equal`].
    ///
    /// `cmp` is called with candidate elements and must return the ordering of the sought key
    /// relative to the candidate. The tree is never modified.
    pub fn find<F>(&self, cmp: F) -> Option<Pin<&T>>
    where
        F: FnMut(&T) -> Ordering,
    {
        let ptr = self.find_raw(cmp)?;
        unsafe { Some(Pin::new_unchecked(ptr.as_ref())) }
    }

    /// Like [`find`](Self::find), but returns a pointer suitable for [`remove`](Self::remove).
    pub fn find_raw<F>(&self, cmp: F) -> Option<NonNull<T>>
    where
        F: FnMut(&T) -> Ordering,
    {
        match self.search(cmp) {
            Search::Found(node) => Some(node),
            Search::Vacant(_) => None,
        }
    }

    fn search<F>(&self, mut cmp: F) -> Search<T>
    where
        F: FnMut(&T) -> Ordering,
    {
        let Some(mut cur) = self.root else {
            return Search::Vacant(InsertAs::Root);
        };

        loop {
            let dir = match cmp(unsafe { cur.as_ref() }) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return Search::Found(cur),
                Ordering::Greater => Dir::Right,
            };

            match unsafe { links(cur).child(dir) } {
                // Descend.
                Some(child) => cur = child,
                None => return Search::Vacant(InsertAs::Child { parent: cur, dir }),
            }
        }
    }

    /// Returns the element matched by `cmp`, inserting one built by `factory` if there is none.
    ///
    /// - If a matching element exists it is returned and `factory` is not called.
    /// - Otherwise `factory` is called once. If it returns a node, the node is linked into the
    ///   tree and returned; if it returns `None`, the tree is left untouched and `None` is
    ///   returned.
    ///
    /// The node returned by `factory` must compare equal under `cmp` and must not be linked into
    /// any tree.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn find_or_insert_with<C, F>(&mut self, cmp: C, factory: F) -> Option<NonNull<T>>
    where
        C: FnMut(&T) -> Ordering,
        F: FnOnce() -> Option<T::Handle>,
    {
        match self.search(cmp) {
            Search::Found(node) => Some(node),
            Search::Vacant(insert_as) => {
                let ptr = T::into_ptr(factory()?);
                unsafe { self.insert_at(insert_as, ptr) };
                Some(ptr)
            }
        }
    }

    /// Returns the entry matched by `cmp`, which is either occupied or vacant.
    pub fn entry<F>(&mut self, cmp: F) -> Entry<'_, T>
    where
        F: FnMut(&T) -> Ordering,
    {
        match self.search(cmp) {
            Search::Found(node) => unsafe { Entry::occupied(self, node) },
            Search::Vacant(insert_as) => unsafe { Entry::vacant(self, insert_as) },
        }
    }

    // Links `ptr` into the empty slot described by `insert_as` and rebalances.
    //
    // # Safety
    //
    // `insert_as` must have been produced by `search` on this tree with no mutation since, and
    // `ptr` must not be linked into any tree.
    pub(crate) unsafe fn insert_at(&mut self, insert_as: InsertAs<T>, ptr: NonNull<T>) {
        unsafe {
            debug_assert!(links(ptr).is_unlinked(), "node is already linked into a tree");
            links_mut(ptr).clear();

            match insert_as {
                InsertAs::Root => {
                    debug_assert!(self.root.is_none(), "tree is not empty");
                    self.root = Some(ptr);
                }

                InsertAs::Child { parent, dir } => {
                    debug_assert!(links(parent).child(dir).is_none(), "slot is occupied");

                    links_mut(ptr).set_parent(Some(parent));
                    links_mut(parent).set_child(dir, Some(ptr));

                    if let Some(root) = balance::retrace_on_growth(ptr) {
                        self.root = Some(root);
                    }
                }
            }
        }

        self.len += 1;
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<Pin<&T>> {
        self.first_raw()
            .map(|first| unsafe { Pin::new_unchecked(first.as_ref()) })
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<Pin<&T>> {
        self.last_raw()
            .map(|last| unsafe { Pin::new_unchecked(last.as_ref()) })
    }

    #[inline]
    pub(crate) fn first_raw(&self) -> Link<T> {
        self.root.map(|root| unsafe { find_extremum(root, Dir::Left) })
    }

    #[inline]
    pub(crate) fn last_raw(&self) -> Link<T> {
        self.root.map(|root| unsafe { find_extremum(root, Dir::Right) })
    }

    /// Removes and returns the minimum element of the tree.
    pub fn pop_first(&mut self) -> Option<T::Handle> {
        let first = self.first_raw()?;
        unsafe { Some(self.remove_at(first)) }
    }

    /// Removes and returns the maximum element of the tree.
    pub fn pop_last(&mut self) -> Option<T::Handle> {
        let last = self.last_raw()?;
        unsafe { Some(self.remove_at(last)) }
    }

    /// Returns the element at position `index` in ascending order.
    ///
    /// This operation completes in _O(index + log(n))_ time.
    pub fn get_index(&self, index: usize) -> Option<Pin<&T>> {
        if index >= self.len {
            return None;
        }

        let mut cur = self.first_raw()?;
        for _ in 0..index {
            cur = self.successor_raw(cur)?;
        }

        unsafe { Some(Pin::new_unchecked(cur.as_ref())) }
    }

    /// Returns the element following `node` in ascending order.
    ///
    /// `node` must be an element of this tree.
    pub fn successor(&self, node: &T) -> Option<Pin<&T>> {
        self.successor_raw(NonNull::from(node))
            .map(|next| unsafe { Pin::new_unchecked(next.as_ref()) })
    }

    /// Returns the element preceding `node` in ascending order.
    ///
    /// `node` must be an element of this tree.
    pub fn predecessor(&self, node: &T) -> Option<Pin<&T>> {
        self.predecessor_raw(NonNull::from(node))
            .map(|prev| unsafe { Pin::new_unchecked(prev.as_ref()) })
    }

    #[inline]
    pub(crate) fn successor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { utils::next_in_order(node, Dir::Right) }
    }

    #[inline]
    pub(crate) fn predecessor_raw(&self, node: NonNull<T>) -> Link<T> {
        unsafe { utils::next_in_order(node, Dir::Left) }
    }

    /// Returns `true` if `node` is currently linked into this tree.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn contains_node(&self, node: &T) -> bool {
        self.contains_raw(NonNull::from(node))
    }

    /// Returns `true` if `node` is the root of this tree.
    pub fn is_root(&self, node: &T) -> bool {
        self.root == Some(NonNull::from(node))
    }

    fn contains_raw(&self, node: NonNull<T>) -> bool {
        let Some(root) = self.root else {
            return false;
        };

        let mut top = node;
        while let Some(parent) = unsafe { links(top).parent() } {
            top = parent;
        }

        top == root
    }

    /// Removes `node` from the tree and returns its handle.
    ///
    /// Returns `None` without touching the tree if `node` is not linked into this tree, which
    /// makes removing an already-removed node a no-op.
    ///
    /// This operation completes in _O(log(n))_ time.
    ///
    /// # Safety
    ///
    /// `node` must point to a live `T` whose links are either in use by some tree or at rest.
    pub unsafe fn remove(&mut self, node: NonNull<T>) -> Option<T::Handle> {
        if !self.contains_raw(node) {
            log::trace!("remove: {node:p} is not linked into this tree");
            return None;
        }

        unsafe { Some(self.remove_at(node)) }
    }

    // Unlinks `node`, rebalances and returns its handle.
    //
    // # Safety
    //
    // `node` must be linked into this tree.
    pub(crate) unsafe fn remove_at(&mut self, node: NonNull<T>) -> T::Handle {
        // There are two possible cases:
        //
        // 1. `node` has two children.
        //
        //    `node`'s successor[^1] is detached from its position and assumes `node`'s place,
        //    children and balance factor. The successor's right child is elevated to replace it.
        //    The successor by definition has no left child, so its detachment shortens the left
        //    subtree of its former parent, or, if the successor was `node`'s right child, the
        //    right subtree of the successor itself.
        //
        // 2. `node` has at most one child.
        //
        //    The child (if any) is elevated into `node`'s slot, shortening that side of `node`'s
        //    parent.
        //
        // Either way, exactly one subtree got one level shorter and the retrace starts at its
        // parent.
        //
        // [^1]: The successor of a node `a` is the least node in `a`'s right subtree.
        unsafe {
            debug_assert!(self.contains_raw(node), "node is not linked into this tree");

            let parent = links(node).parent();
            let left = links(node).left();
            let right = links(node).right();

            let shrunk = match (left, right) {
                (Some(left), Some(right)) => {
                    let successor = find_extremum(right, Dir::Left);
                    let successor_parent = links(successor)
                        .parent()
                        .expect("successor must have a parent");

                    // Transfer the balance factor and left subtree of `node` to `successor`.
                    links_mut(successor).set_balance(links(node).balance());
                    links_mut(successor).set_left(Some(left));
                    links_mut(left).set_parent(Some(successor));

                    let shrunk = if successor_parent == node {
                        // The successor keeps its right subtree, which is now one level shorter
                        // than `node`'s was.
                        (successor, Dir::Right)
                    } else {
                        // Elevate the successor's right child to replace it.
                        let successor_right = links(successor).right();
                        links_mut(successor_parent).set_left(successor_right);
                        self.maybe_set_parent(successor_right, Some(successor_parent));

                        links_mut(successor).set_right(Some(right));
                        links_mut(right).set_parent(Some(successor));

                        (successor_parent, Dir::Left)
                    };

                    log::trace!("remove: {node:p} replaced by successor {successor:p}");

                    links_mut(successor).set_parent(parent);
                    self.replace_child_or_set_root(parent, node, Some(successor));

                    Some(shrunk)
                }

                (child, None) | (None, child) => {
                    self.maybe_set_parent(child, parent);

                    match parent {
                        Some(parent) => {
                            let dir = which_child(parent, node);
                            links_mut(parent).set_child(dir, child);
                            Some((parent, dir))
                        }
                        None => {
                            self.root = child;
                            None
                        }
                    }
                }
            };

            if let Some((parent, dir)) = shrunk {
                if let Some(root) = balance::retrace_on_shrink(parent, dir) {
                    self.root = Some(root);
                }
            }

            links_mut(node).clear();
            self.len -= 1;

            T::from_ptr(node)
        }
    }

    /// Clears the tree, removing all elements.
    ///
    /// Every node's links are reset before its handle is dropped.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node.
                let cur = find_extremum(cur, Dir::Left);
                let parent = links(cur).parent();
                let right = links(cur).right();

                // Elevate the node's right child (which may be None).
                self.replace_child_or_set_root(parent, cur, right);
                self.maybe_set_parent(right, parent);

                // Drop the node.
                links_mut(cur).clear();
                drop(T::from_ptr(cur));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If the node had no parent,
                // the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);
    }

    /// Returns an iterator over the elements of the tree in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Returns a cursor pointing at the minimum element.
    pub fn cursor_first(&self) -> Cursor<'_, T> {
        Cursor::first(self)
    }

    /// Returns a cursor pointing at the maximum element.
    pub fn cursor_last(&self) -> Cursor<'_, T> {
        Cursor::last(self)
    }

    /// Returns an editing cursor pointing at the minimum element.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut::first(self)
    }

    /// Returns an editing cursor pointing at the maximum element.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, T> {
        CursorMut::last(self)
    }

    // Support methods ========================================================

    unsafe fn maybe_set_parent(&mut self, opt_node: Link<T>, parent: Link<T>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { links_mut(node).set_parent(parent) };
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`, or the root
    // if `parent` is `None`.
    //
    // `new_child`'s parent pointer is not updated.
    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        match parent {
            Some(parent) => unsafe {
                let dir = which_child(parent, old_child);
                links_mut(parent).set_child(dir, new_child);
            },
            None => self.root = new_child,
        }
    }
}

impl<T> Drop for AvlTree<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T> Default for AvlTree<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for AvlTree<T>
where
    T: Linked<Links<T>> + fmt::Debug + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'tree, T> IntoIterator for &'tree AvlTree<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                balance: 0,
                _unpin: PhantomPinned,
            }),
        }
    }

    /// Returns the balance factor of the node: the height of its right subtree minus the height
    /// of its left subtree.
    #[inline]
    pub fn balance_factor(&self) -> i8 {
        self.balance()
    }

    #[inline]
    fn is_unlinked(&self) -> bool {
        self.parent().is_none() && self.left().is_none() && self.right().is_none() && self.balance() == 0
    }

    #[inline]
    fn balance(&self) -> i8 {
        unsafe { (*self.inner.get()).balance }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn left(&self) -> Link<T> {
        self.child(Dir::Left)
    }

    #[inline]
    fn right(&self) -> Link<T> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_left(&mut self, left: Link<T>) -> Link<T> {
        self.set_child(Dir::Left, left)
    }

    #[inline]
    fn set_right(&mut self, right: Link<T>) -> Link<T> {
        self.set_child(Dir::Right, right)
    }

    #[inline]
    fn set_balance(&mut self, balance: i8) {
        self.inner.get_mut().balance = balance;
    }

    // Resets all links to their neutral state.
    #[inline]
    fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.balance = 0;
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Links<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent())
            .field("left", &self.left())
            .field("right", &self.right())
            .field("balance", &self.balance())
            .finish()
    }
}
