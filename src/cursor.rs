use core::{cmp::Ordering, marker::PhantomData, pin::Pin, ptr::NonNull};

use cordyceps::Linked;

use crate::{AvlTree, Dir, Link, Links};

/// A read-only cursor over an [`AvlTree`].
///
/// A cursor rests either on an element or on a "ghost" position between the maximum and the
/// minimum. Stepping forward from the maximum lands on the ghost, and stepping forward again
/// wraps around to the minimum.
pub struct Cursor<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    curs: CursorRaw<T>,
    phantom: PhantomData<&'tree AvlTree<T>>,
}

impl<'tree, T> Cursor<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    pub(crate) fn first(tree: &'tree AvlTree<T>) -> Cursor<'tree, T> {
        Cursor {
            curs: CursorRaw::new(tree.into(), tree.first_raw()),
            phantom: PhantomData,
        }
    }

    pub(crate) fn last(tree: &'tree AvlTree<T>) -> Cursor<'tree, T> {
        Cursor {
            curs: CursorRaw::new(tree.into(), tree.last_raw()),
            phantom: PhantomData,
        }
    }

    pub(crate) fn at(tree: &'tree AvlTree<T>, ptr: Link<T>) -> Cursor<'tree, T> {
        Cursor {
            curs: CursorRaw::new(tree.into(), ptr),
            phantom: PhantomData,
        }
    }

    /// Moves to the next element in ascending order.
    pub fn move_next(&mut self) {
        unsafe { self.curs.step(Dir::Right) }
    }

    /// Moves to the previous element in ascending order.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.step(Dir::Left) }
    }

    /// Returns the element under the cursor, or `None` at the ghost position.
    pub fn get(&self) -> Option<&'tree T> {
        self.curs.ptr.map(|p| unsafe { p.as_ref() })
    }

    /// Returns the element [`move_next`](Self::move_next) would move to.
    pub fn peek_next(&self) -> Option<&'tree T> {
        unsafe { self.curs.peek(Dir::Right).map(|p| p.as_ref()) }
    }

    /// Returns the element [`move_prev`](Self::move_prev) would move to.
    pub fn peek_prev(&self) -> Option<&'tree T> {
        unsafe { self.curs.peek(Dir::Left).map(|p| p.as_ref()) }
    }
}

impl<T> Clone for Cursor<'_, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    fn clone(&self) -> Self {
        Cursor {
            curs: CursorRaw::new(self.curs.tree, self.curs.ptr),
            phantom: PhantomData,
        }
    }
}

/// A cursor over an [`AvlTree`] that can remove the elements it visits.
///
/// Positioning works as for [`Cursor`].
pub struct CursorMut<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    curs: CursorRaw<T>,
    phantom: PhantomData<&'tree mut AvlTree<T>>,
}

impl<'tree, T> CursorMut<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    pub(crate) fn first(tree: &'tree mut AvlTree<T>) -> CursorMut<'tree, T> {
        let first = tree.first_raw();
        CursorMut {
            curs: CursorRaw::new(tree.into(), first),
            phantom: PhantomData,
        }
    }

    pub(crate) fn last(tree: &'tree mut AvlTree<T>) -> CursorMut<'tree, T> {
        let last = tree.last_raw();
        CursorMut {
            curs: CursorRaw::new(tree.into(), last),
            phantom: PhantomData,
        }
    }

    pub(crate) fn at(tree: &'tree mut AvlTree<T>, ptr: Link<T>) -> CursorMut<'tree, T> {
        CursorMut {
            curs: CursorRaw::new(tree.into(), ptr),
            phantom: PhantomData,
        }
    }

    /// Returns a read-only cursor at the same position.
    ///
    /// The `CursorMut` stays borrowed for as long as the returned `Cursor` lives.
    pub fn as_cursor(&self) -> Cursor<'_, T> {
        Cursor {
            curs: CursorRaw::new(self.curs.tree, self.curs.ptr),
            phantom: PhantomData,
        }
    }

    /// Moves to the next element in ascending order.
    pub fn move_next(&mut self) {
        unsafe { self.curs.step(Dir::Right) }
    }

    /// Moves to the previous element in ascending order.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.step(Dir::Left) }
    }

    /// Returns the element under the cursor, or `None` at the ghost position.
    pub fn get(&self) -> Option<&T> {
        self.curs.ptr.map(|p| unsafe { p.as_ref() })
    }

    /// Returns a pinned mutable reference to the element under the cursor.
    ///
    /// # Safety
    ///
    /// The caller must not change the element in a way that alters how it orders against the
    /// other elements of the tree.
    pub unsafe fn get_mut(&mut self) -> Option<Pin<&mut T>> {
        self.curs
            .ptr
            .map(|mut p| unsafe { Pin::new_unchecked(p.as_mut()) })
    }

    pub fn peek_next(&self) -> Option<&T> {
        unsafe { self.curs.peek(Dir::Right).map(|p| p.as_ref()) }
    }

    pub fn peek_prev(&self) -> Option<&T> {
        unsafe { self.curs.peek(Dir::Left).map(|p| p.as_ref()) }
    }

    /// Unlinks the element under the cursor and moves to the next element.
    ///
    /// At the ghost position, returns `None` and changes nothing.
    pub fn remove_current(&mut self) -> Option<T::Handle> {
        unsafe { self.curs.remove_and_step(Dir::Right) }
    }

    /// Unlinks the element under the cursor and moves to the previous element.
    ///
    /// At the ghost position, returns `None` and changes nothing.
    pub fn remove_current_and_move_prev(&mut self) -> Option<T::Handle> {
        unsafe { self.curs.remove_and_step(Dir::Left) }
    }
}

struct CursorRaw<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    tree: NonNull<AvlTree<T>>,
    ptr: Link<T>,
}

impl<T> CursorRaw<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    fn new(tree: NonNull<AvlTree<T>>, ptr: Link<T>) -> CursorRaw<T> {
        CursorRaw { tree, ptr }
    }

    // Returns the position one step towards `dir`. From the ghost, that is the extremum at the
    // opposite end.
    unsafe fn peek(&self, dir: Dir) -> Link<T> {
        let tree = unsafe { self.tree.as_ref() };

        match (self.ptr, dir) {
            (Some(p), Dir::Right) => tree.successor_raw(p),
            (Some(p), Dir::Left) => tree.predecessor_raw(p),
            (None, Dir::Right) => tree.first_raw(),
            (None, Dir::Left) => tree.last_raw(),
        }
    }

    unsafe fn step(&mut self, dir: Dir) {
        self.ptr = unsafe { self.peek(dir) };
    }

    unsafe fn remove_and_step(&mut self, dir: Dir) -> Option<T::Handle> {
        let remove = self.ptr?;

        unsafe {
            self.step(dir);
            Some(self.tree.as_mut().remove_at(remove))
        }
    }
}

impl<T> AvlTree<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    /// Returns a cursor at the element matched by `cmp`, or at the ghost position if there is
    /// none.
    pub fn cursor_find<F>(&self, cmp: F) -> Cursor<'_, T>
    where
        F: FnMut(&T) -> Ordering,
    {
        let ptr = self.find_raw(cmp);
        Cursor::at(self, ptr)
    }

    /// Returns an editing cursor at the element matched by `cmp`, or at the ghost position if
    /// there is none.
    pub fn cursor_find_mut<F>(&mut self, cmp: F) -> CursorMut<'_, T>
    where
        F: FnMut(&T) -> Ordering,
    {
        let ptr = self.find_raw(cmp);
        CursorMut::at(self, ptr)
    }
}
