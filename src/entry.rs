use core::{pin::Pin, ptr::NonNull};

use cordyceps::Linked;

use crate::{
    utils::{links, links_mut, which_child},
    AvlTree, Dir, Links,
};

/// A view into the position of a single element in an [`AvlTree`], which may be either vacant or
/// occupied.
///
/// Created by [`AvlTree::entry`].
pub enum Entry<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    Vacant(VacantEntry<'tree, T>),
    Occupied(OccupiedEntry<'tree, T>),
}

impl<'tree, T> Entry<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    pub(crate) unsafe fn vacant(tree: &'tree mut AvlTree<T>, insert_as: InsertAs<T>) -> Self {
        Entry::Vacant(VacantEntry { tree, insert_as })
    }

    pub(crate) unsafe fn occupied(tree: &'tree mut AvlTree<T>, node: NonNull<T>) -> Self {
        Entry::Occupied(OccupiedEntry { tree, node })
    }

    /// Returns `true` if the entry holds an element.
    pub fn is_occupied(&self) -> bool {
        matches!(self, Entry::Occupied(_))
    }

    /// Returns the occupying element, or inserts the node built by `factory`.
    ///
    /// `factory` is only called for a vacant entry. If it declines by returning `None`, nothing
    /// is inserted and `None` is returned.
    pub fn or_insert_with<F>(self, factory: F) -> Option<Pin<&'tree T>>
    where
        F: FnOnce() -> Option<T::Handle>,
    {
        match self {
            Entry::Occupied(entry) => Some(entry.into_ref()),
            Entry::Vacant(entry) => {
                let item = factory()?;
                Some(entry.insert(item).into_ref())
            }
        }
    }
}

/// Where a new node goes: the root of an empty tree, or an empty child slot.
pub(crate) enum InsertAs<T: ?Sized> {
    Root,
    Child { parent: NonNull<T>, dir: Dir },
}

/// A vacant entry: the tree holds no element matching the comparator it was looked up with.
pub struct VacantEntry<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    tree: &'tree mut AvlTree<T>,
    insert_as: InsertAs<T>,
}

impl<'tree, T> VacantEntry<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    /// Links `item` into the position of this entry and rebalances.
    ///
    /// `item` must compare equal under the comparator used to look up this entry, and must not
    /// be linked into any tree. Its links are reset before use.
    pub fn insert(self, item: T::Handle) -> Pin<&'tree mut T> {
        let mut ptr = T::into_ptr(item);

        unsafe {
            self.tree.insert_at(self.insert_as, ptr);
            Pin::new_unchecked(ptr.as_mut())
        }
    }
}

/// An occupied entry: the element matching the comparator it was looked up with.
pub struct OccupiedEntry<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    tree: &'tree mut AvlTree<T>,
    node: NonNull<T>,
}

impl<'tree, T> OccupiedEntry<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    /// Returns a reference to the element.
    pub fn get(&self) -> &T {
        unsafe { self.node.as_ref() }
    }

    /// Returns a pinned mutable reference to the element.
    ///
    /// # Safety
    ///
    /// The caller must not change the element in a way that alters how it orders against the
    /// other elements of the tree.
    pub unsafe fn get_mut(&mut self) -> Pin<&mut T> {
        unsafe { Pin::new_unchecked(self.node.as_mut()) }
    }

    /// Converts the entry into a reference to the element that lives as long as the tree borrow.
    pub fn into_ref(self) -> Pin<&'tree T> {
        unsafe { Pin::new_unchecked(self.node.as_ref()) }
    }

    /// Puts `item` in place of the current element, returning the previous element.
    ///
    /// The new element takes over the parent, children and balance factor of the old one, so no
    /// rebalancing takes place. The old element comes back with its links reset.
    ///
    /// # Safety
    ///
    /// `item` must order against the other elements exactly as the current element does, and
    /// must not be linked into any tree.
    pub unsafe fn replace(&mut self, item: T::Handle) -> T::Handle {
        let new_ptr = T::into_ptr(item);
        let old_ptr = self.node;

        unsafe {
            debug_assert!(links(new_ptr).is_unlinked(), "node is already linked into a tree");

            let old = links(old_ptr);
            let balance = old.balance();
            let parent = old.parent();
            let left = old.left();
            let right = old.right();

            match parent {
                Some(parent) => {
                    let dir = which_child(parent, old_ptr);
                    links_mut(parent).set_child(dir, Some(new_ptr));
                }
                None => self.tree.root = Some(new_ptr),
            }

            for child in [left, right].into_iter().flatten() {
                links_mut(child).set_parent(Some(new_ptr));
            }

            let new = links_mut(new_ptr);
            new.set_parent(parent);
            new.set_left(left);
            new.set_right(right);
            new.set_balance(balance);

            links_mut(old_ptr).clear();
            self.node = new_ptr;

            T::from_ptr(old_ptr)
        }
    }

    /// Unlinks the element and returns it.
    pub fn remove(self) -> T::Handle {
        unsafe { self.tree.remove_at(self.node) }
    }
}
