//! Conversions between a node and the [`Links`](crate::Links) embedded in it.
//!
//! These are the building blocks of a [`Linked::links`](cordyceps::Linked::links) implementation
//! when the links are not the first field of a `#[repr(C)]` struct:
//!
//! ```
//! use core::{mem, ptr::NonNull};
//!
//! use cordyceps::Linked;
//! use cordyceps_avl::{offset, Links};
//!
//! struct Timer {
//!     deadline: u64,
//!     links: Links<Timer>,
//! }
//!
//! unsafe impl Linked<Links<Timer>> for Timer {
//!     type Handle = NonNull<Timer>;
//!
//!     fn into_ptr(handle: Self::Handle) -> NonNull<Self> {
//!         handle
//!     }
//!
//!     unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
//!         ptr
//!     }
//!
//!     unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<Timer>> {
//!         unsafe { offset::links_of(ptr, mem::offset_of!(Timer, links)) }
//!     }
//! }
//! ```

use core::ptr::NonNull;

/// Returns a pointer to the field `offset` bytes into `owner`.
///
/// # Safety
///
/// `offset` must be the offset of a field of type `L` within `T`, as given by
/// [`core::mem::offset_of!`], and `owner` must point to a live `T`.
#[inline]
pub unsafe fn links_of<T: ?Sized, L>(owner: NonNull<T>, offset: usize) -> NonNull<L> {
    unsafe { owner.byte_add(offset).cast() }
}

/// Recovers a pointer to the `T` whose field at `offset` bytes is `links`.
///
/// This is the inverse of [`links_of`].
///
/// # Safety
///
/// `links` must point to a field of type `L` located `offset` bytes into a live `T`.
#[inline]
pub unsafe fn owner_of<T, L: ?Sized>(links: NonNull<L>, offset: usize) -> NonNull<T> {
    unsafe { links.byte_sub(offset).cast() }
}

#[cfg(test)]
mod tests {
    use core::{mem, ptr::NonNull};

    use super::*;
    use crate::{model::TestNode, Links};

    #[test]
    fn links_and_owner_round_trip() {
        let mut node = TestNode::new(7);
        let owner = NonNull::from(&mut *node);
        let offset = mem::offset_of!(TestNode, links);

        let links: NonNull<Links<TestNode>> = unsafe { links_of(owner, offset) };
        assert_eq!(links.as_ptr().cast_const(), &node.links as *const _);

        let back: NonNull<TestNode> = unsafe { owner_of(links, offset) };
        assert_eq!(back, owner);
        assert_eq!(unsafe { back.as_ref() }.key, 7);
    }
}
