use core::{ops::ControlFlow, ptr::NonNull};

use cordyceps::Linked;

use crate::{utils::links, AvlTree, Dir, Links};

/// When a node is visited relative to its subtrees.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Traversal {
    /// Before either subtree.
    PreOrder,
    /// Between the subtrees.
    InOrder,
    /// After both subtrees.
    PostOrder,
}

/// Which subtree is visited first.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Left subtree first.
    #[default]
    Ascending,
    /// Right subtree first.
    Descending,
}

impl Direction {
    fn first(self) -> Dir {
        match self {
            Direction::Ascending => Dir::Left,
            Direction::Descending => Dir::Right,
        }
    }
}

impl<T> AvlTree<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    /// Walks the whole tree depth-first, calling `visitor` on every element.
    ///
    /// The walk stops as soon as `visitor` returns [`ControlFlow::Break`], and the break value is
    /// returned. Recursion depth is bounded by the tree height, which is logarithmic in the number
    /// of elements.
    pub fn traverse<B, F>(&self, traversal: Traversal, direction: Direction, mut visitor: F) -> ControlFlow<B>
    where
        F: FnMut(&T) -> ControlFlow<B>,
    {
        match self.root {
            Some(root) => unsafe { visit(root, traversal, direction.first(), &mut visitor) },
            None => ControlFlow::Continue(()),
        }
    }
}

unsafe fn visit<T, B, F>(node: NonNull<T>, traversal: Traversal, first: Dir, visitor: &mut F) -> ControlFlow<B>
where
    T: Linked<Links<T>> + ?Sized,
    F: FnMut(&T) -> ControlFlow<B>,
{
    unsafe {
        if traversal == Traversal::PreOrder {
            visitor(node.as_ref())?;
        }

        if let Some(child) = links(node).child(first) {
            visit(child, traversal, first, visitor)?;
        }

        if traversal == Traversal::InOrder {
            visitor(node.as_ref())?;
        }

        if let Some(child) = links(node).child(!first) {
            visit(child, traversal, first, visitor)?;
        }

        if traversal == Traversal::PostOrder {
            visitor(node.as_ref())?;
        }
    }

    ControlFlow::Continue(())
}
