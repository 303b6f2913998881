//! Rotations and retracing.
//!
//! None of the functions here know about the owning tree. When a rebalance replaces the root,
//! the new root is returned to the caller, which is responsible for recording it.

use core::ptr::NonNull;

use cordyceps::Linked;

use crate::{
    utils::{links, links_mut, which_child},
    Dir, Link, Links,
};

/// Rotates `x` towards `dir`, raising its child on the `!dir` side into `x`'s position.
///
/// Balance factors are left untouched. Returns the raised node.
///
/// ```text
///        x                z
///       / \              / \
///      z   c    ==>     a   x
///     / \                  / \
///    a   b                b   c
///
///         rotate(x, Right)
/// ```
///
/// # Safety
///
/// `x` must be a live node with a child on the `!dir` side.
pub(crate) unsafe fn rotate<T>(x: NonNull<T>, dir: Dir) -> NonNull<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    unsafe {
        let z = links(x)
            .child(!dir)
            .expect("rotated node must have a child to raise");
        let parent = links(x).parent();
        let inner = links(z).child(dir);

        log::trace!("rotate {dir:?}: {x:p} -> {z:p}");

        if let Some(parent) = parent {
            let side = which_child(parent, x);
            links_mut(parent).set_child(side, Some(z));
        }
        links_mut(z).set_parent(parent);
        links_mut(x).set_parent(Some(z));

        // The inner grandchild changes sides.
        links_mut(x).set_child(!dir, inner);
        if let Some(inner) = inner {
            links_mut(inner).set_parent(Some(x));
        }

        links_mut(z).set_child(dir, Some(x));

        z
    }
}

/// Records that the `grown` side of `x` became one level taller (equivalently, that the other
/// side became one level shorter), rotating if the balance factor leaves `[-1, 1]`.
///
/// Returns the node now occupying `x`'s position: `x` itself if no rotation took place.
///
/// # Safety
///
/// `x` must be a live node whose balance factor is in `[-1, 1]`, and if the adjustment overflows,
/// the child on the `grown` side must exist (which holds for any well-formed tree).
pub(crate) unsafe fn adjust_balance<T>(x: NonNull<T>, grown: Dir) -> NonNull<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    unsafe {
        let old = links(x).balance();
        debug_assert!((-1..=1).contains(&old), "balance factor {old} out of range");

        let new = old + grown.delta();
        if (-1..=1).contains(&new) {
            links_mut(x).set_balance(new);
            return x;
        }

        // `x` is doubly heavy on the `grown` side.
        let heavy = grown.delta();
        let z = links(x)
            .child(grown)
            .expect("heavy side of an unbalanced node must exist");
        let z_balance = links(z).balance();

        if z_balance * heavy >= 0 {
            // `z` leans the same way as `x` or not at all: a single rotation suffices.
            rotate(x, !grown);

            if z_balance == 0 {
                links_mut(x).set_balance(heavy);
                links_mut(z).set_balance(-heavy);
            } else {
                links_mut(x).set_balance(0);
                links_mut(z).set_balance(0);
            }

            z
        } else {
            // `z` leans away from `x`: raise `z`'s inner child `y` by two levels.
            let y = links(z)
                .child(!grown)
                .expect("inner child of a counter-leaning node must exist");
            let y_balance = links(y).balance();

            rotate(z, grown);
            rotate(x, !grown);

            if y_balance * heavy > 0 {
                links_mut(x).set_balance(-heavy);
                links_mut(z).set_balance(0);
            } else if y_balance * heavy < 0 {
                links_mut(x).set_balance(0);
                links_mut(z).set_balance(heavy);
            } else {
                links_mut(x).set_balance(0);
                links_mut(z).set_balance(0);
            }
            links_mut(y).set_balance(0);

            y
        }
    }
}

/// Restores balance on the path from `added` to the root after `added` was linked as a leaf.
///
/// Returns the new root if the retrace reached the top of the tree.
///
/// # Safety
///
/// `added` must be a freshly linked leaf with a balance factor of zero.
pub(crate) unsafe fn retrace_on_growth<T>(added: NonNull<T>) -> Link<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    unsafe {
        debug_assert_eq!(links(added).balance(), 0);

        let mut cur = added;
        let mut parent = links(added).parent();

        while let Some(p) = parent {
            let grown = which_child(p, cur);
            cur = adjust_balance(p, grown);
            parent = links(cur).parent();

            // A subtree whose root is balanced after growth did not change height.
            if links(cur).balance() == 0 {
                break;
            }
        }

        if parent.is_none() {
            log::trace!("retrace on growth reached root {cur:p}");
            Some(cur)
        } else {
            None
        }
    }
}

/// Restores balance on the path from `parent` to the root after the `shrunk` subtree of `parent`
/// became one level shorter.
///
/// Returns the new root if the retrace reached the top of the tree.
///
/// # Safety
///
/// `parent` must be a live node of a tree that was well-formed before the shrinkage.
pub(crate) unsafe fn retrace_on_shrink<T>(parent: NonNull<T>, shrunk: Dir) -> Link<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    let mut cur = parent;
    let mut shrunk = shrunk;

    unsafe {
        loop {
            let top = adjust_balance(cur, !shrunk);

            match links(top).parent() {
                None => {
                    log::trace!("retrace on shrink reached root {top:p}");
                    return Some(top);
                }

                // A subtree whose root is unbalanced after shrinkage did not change height.
                Some(_) if links(top).balance() != 0 => return None,

                Some(up) => {
                    shrunk = which_child(up, top);
                    cur = up;
                }
            }
        }
    }
}
