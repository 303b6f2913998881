use core::ptr::NonNull;

use cordyceps::Linked;

use crate::{Dir, Link, Links};

/// Returns a shared reference to the links of `ptr`.
///
/// # Safety
///
/// `ptr` must point to a live node, and the returned reference must not outlive a mutation of
/// the same links.
#[inline]
pub(crate) unsafe fn links<'a, T>(ptr: NonNull<T>) -> &'a Links<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    unsafe { T::links(ptr).as_ref() }
}

/// Returns an exclusive reference to the links of `ptr`.
///
/// # Safety
///
/// As for [`links`], and no other reference to the same links may be live.
#[inline]
pub(crate) unsafe fn links_mut<'a, T>(ptr: NonNull<T>) -> &'a mut Links<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    unsafe { T::links(ptr).as_mut() }
}

/// Returns which child of `parent` the node `child` is.
///
/// # Safety
///
/// `parent` must be live, and `child` must be one of its children.
#[inline]
pub(crate) unsafe fn which_child<T>(parent: NonNull<T>, child: NonNull<T>) -> Dir
where
    T: Linked<Links<T>> + ?Sized,
{
    unsafe {
        let links = links(parent);

        if links.left() == Some(child) {
            Dir::Left
        } else {
            debug_assert_eq!(links.right(), Some(child), "node is not a child of its parent");
            Dir::Right
        }
    }
}

/// Descends from `root` towards `dir` as far as possible.
///
/// # Safety
///
/// `root` must be a live node of a well-formed tree.
#[inline]
pub(crate) unsafe fn find_extremum<T>(root: NonNull<T>, dir: Dir) -> NonNull<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    let mut cur = root;

    while let Some(child) = unsafe { links(cur).child(dir) } {
        cur = child;
    }

    cur
}

/// Returns the in-order neighbor of `node` on the `dir` side: the successor for [`Dir::Right`],
/// the predecessor for [`Dir::Left`].
///
/// # Safety
///
/// `node` must be a live node of a well-formed tree.
pub(crate) unsafe fn next_in_order<T>(node: NonNull<T>, dir: Dir) -> Link<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    unsafe {
        if let Some(child) = links(node).child(dir) {
            return Some(find_extremum(child, !dir));
        }

        // Climb until we arrive from the `!dir` side.
        let mut cur = node;
        while let Some(parent) = links(cur).parent() {
            if links(parent).child(!dir) == Some(cur) {
                return Some(parent);
            }

            cur = parent;
        }

        None
    }
}
