use generational_arena::{Arena, Index};
use std::marker::PhantomData;

/// The index type of the generational arena backing a [`ContiguousArena`].
pub type ContiguousArenaIndex = Index;

/// A set of objects stored contiguously and addressed by stable generational handles.
///
/// Removal swaps the last object into the hole so that iterating the objects stays a slice
/// traversal.
#[derive(Clone)]
pub struct ContiguousArena<Idx, T> {
    objects: Vec<T>,
    rev_indices: Vec<Index>,
    indices: Arena<usize>,
    phantoms: PhantomData<Idx>,
}

impl<Idx, T> Default for ContiguousArena<Idx, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Idx, T> ContiguousArena<Idx, T> {
    /// An empty arena.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            indices: Arena::new(),
            rev_indices: Vec::new(),
            phantoms: PhantomData,
        }
    }

    /// The number of objects.
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the arena is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The object with the given handle.
    #[inline]
    pub fn get(&self, handle: Idx) -> Option<&T>
    where
        Idx: Into<ContiguousArenaIndex>,
    {
        self.objects.get(*self.indices.get(handle.into())?)
    }

    /// The object with the given handle.
    #[inline]
    pub fn get_mut(&mut self, handle: Idx) -> Option<&mut T>
    where
        Idx: Into<ContiguousArenaIndex>,
    {
        self.objects.get_mut(*self.indices.get(handle.into())?)
    }

    /// Two distinct objects, mutably. Returns `None` if a handle is invalid or both are equal.
    pub fn get2_mut(&mut self, a: Idx, b: Idx) -> Option<(&mut T, &mut T)>
    where
        Idx: Into<ContiguousArenaIndex>,
    {
        let ia = *self.indices.get(a.into())?;
        let ib = *self.indices.get(b.into())?;

        if ia == ib {
            return None;
        }

        if ia < ib {
            let (left, right) = self.objects.split_at_mut(ib);
            Some((&mut left[ia], &mut right[0]))
        } else {
            let (left, right) = self.objects.split_at_mut(ia);
            Some((&mut right[0], &mut left[ib]))
        }
    }

    /// The objects, in storage order.
    #[inline]
    pub fn values(&self) -> std::slice::Iter<T> {
        self.objects.iter()
    }

    /// The objects, in storage order.
    #[inline]
    pub fn values_mut(&mut self) -> std::slice::IterMut<T> {
        self.objects.iter_mut()
    }

    /// The handles of all the objects.
    pub fn handles(&self) -> Vec<Idx>
    where
        Idx: From<ContiguousArenaIndex>,
    {
        self.indices.iter().map(|(i, _)| Idx::from(i)).collect()
    }

    /// The objects together with their handles.
    #[inline]
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (Idx, &'a T)> + 'a
    where
        Idx: From<ContiguousArenaIndex>,
    {
        let objects = &self.objects;
        self.indices
            .iter()
            .map(move |(i, val)| (Idx::from(i), &objects[*val]))
    }

    /// The objects as a slice, in storage order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.objects[..]
    }

    /// The objects as a mutable slice, in storage order.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.objects[..]
    }

    /// Adds an object and returns its handle.
    #[inline]
    pub fn insert(&mut self, object: T) -> Idx
    where
        Idx: From<ContiguousArenaIndex>,
    {
        let i = self.objects.len();
        self.objects.push(object);
        let idx = self.indices.insert(i);
        self.rev_indices.push(idx);
        Idx::from(idx)
    }

    /// Removes an object. The handles of the other objects stay valid.
    #[inline]
    pub fn remove(&mut self, handle: Idx) -> Option<T>
    where
        Idx: Into<ContiguousArenaIndex>,
    {
        let i = self.indices.remove(handle.into())?;
        let deleted_object = self.objects.swap_remove(i);
        let _ = self.rev_indices.swap_remove(i);

        if let Some(moved) = self.rev_indices.get(i) {
            self.indices[*moved] = i;
        }

        Some(deleted_object)
    }
}

impl<Idx: Into<ContiguousArenaIndex>, T> std::ops::Index<Idx> for ContiguousArena<Idx, T> {
    type Output = T;

    #[inline]
    fn index(&self, i: Idx) -> &T {
        &self.objects[self.indices[i.into()]]
    }
}

impl<Idx: Into<ContiguousArenaIndex>, T> std::ops::IndexMut<Idx> for ContiguousArena<Idx, T> {
    #[inline]
    fn index_mut(&mut self, i: Idx) -> &mut T {
        &mut self.objects[self.indices[i.into()]]
    }
}
