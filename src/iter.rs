use core::iter::FusedIterator;

use cordyceps::Linked;

use crate::{AvlTree, Link, Links};

/// An iterator over the elements of an [`AvlTree`] in ascending order.
///
/// Created by [`AvlTree::iter`]. Iterating from both ends stops once the two ends meet.
pub struct Iter<'tree, T: Linked<Links<T>> + ?Sized> {
    tree: &'tree AvlTree<T>,

    front: Link<T>,
    back: Link<T>,

    len: usize,
}

impl<'tree, T: Linked<Links<T>> + ?Sized> Iter<'tree, T> {
    pub(crate) fn new(tree: &'tree AvlTree<T>) -> Self {
        Iter {
            tree,

            front: tree.first_raw(),
            back: tree.last_raw(),

            len: tree.len(),
        }
    }
}

impl<'tree, T: Linked<Links<T>> + ?Sized> Iterator for Iter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.front?;
        self.front = self.tree.successor_raw(cur);
        self.len -= 1;

        Some(unsafe { cur.as_ref() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'tree, T: Linked<Links<T>> + ?Sized> DoubleEndedIterator for Iter<'tree, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let cur = self.back?;
        self.back = self.tree.predecessor_raw(cur);
        self.len -= 1;

        Some(unsafe { cur.as_ref() })
    }
}

impl<T: Linked<Links<T>> + ?Sized> ExactSizeIterator for Iter<'_, T> {}

impl<T: Linked<Links<T>> + ?Sized> FusedIterator for Iter<'_, T> {}
