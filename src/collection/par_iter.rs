use std::marker::PhantomData;

use rayon::iter::ParallelIterator;
use rayon::iter::plumbing::{Folder, UnindexedConsumer, UnindexedProducer, bridge_unindexed};

use super::concat_list::{ConcatList, Node};

/// Minimum number of elements a producer keeps before it agrees to split.
const CHUNK_SIZE: usize = 1 << 10;

impl<T: Sync> ConcatList<T> {
    /// Splitting parallel traversal for bulk consumption.
    ///
    /// Splits divide-and-conquer style by walking fixed minimum-size chunks
    /// off the front of the chain, so the elements never have to be
    /// materialized into an array first.
    pub fn par_iter(&self) -> ParIter<'_, T> {
        ParIter { head: self.head(), len: self.len(), _marker: PhantomData }
    }
}

/// Borrowing parallel iterator over a [`ConcatList`].
pub struct ParIter<'a, T> {
    head: *const Node<T>,
    len: usize,
    _marker: PhantomData<&'a ConcatList<T>>,
}

// SAFETY: the producer only reads through shared references; splitting hands
// disjoint chain segments to different threads.
unsafe impl<T: Sync> Send for ParIter<'_, T> {}

impl<'a, T: Sync> ParallelIterator for ParIter<'a, T> {
    type Item = &'a T;

    fn drive_unindexed<C>(self, consumer: C) -> C::Result
    where
        C: UnindexedConsumer<Self::Item>,
    {
        let producer =
            NodeProducer { head: self.head, len: self.len, _marker: PhantomData::<&'a T> };
        bridge_unindexed(producer, consumer)
    }
}

struct NodeProducer<'a, T> {
    head: *const Node<T>,
    len: usize,
    _marker: PhantomData<&'a T>,
}

// SAFETY: see ParIter.
unsafe impl<T: Sync> Send for NodeProducer<'_, T> {}

impl<'a, T: Sync> UnindexedProducer for NodeProducer<'a, T> {
    type Item = &'a T;

    fn split(self) -> (Self, Option<Self>) {
        if self.len < 2 * CHUNK_SIZE {
            return (self, None);
        }
        let mut node = self.head;
        for _ in 0..CHUNK_SIZE {
            // SAFETY: len nodes are reachable from head, and CHUNK_SIZE < len.
            node = unsafe { (*node).next.cast_const() };
        }
        let front = NodeProducer { head: self.head, len: CHUNK_SIZE, _marker: PhantomData };
        let rest = NodeProducer { head: node, len: self.len - CHUNK_SIZE, _marker: PhantomData };
        (front, Some(rest))
    }

    fn fold_with<F>(self, mut folder: F) -> F
    where
        F: Folder<Self::Item>,
    {
        let mut node = self.head;
        for _ in 0..self.len {
            if folder.full() {
                break;
            }
            // SAFETY: len nodes are reachable from head; the producer counts
            // rather than chasing a fence, so the front segment of a split
            // never runs past its own elements.
            let current: &'a Node<T> = unsafe { &*node };
            folder = folder.consume(&current.element);
            node = current.next.cast_const();
        }
        folder
    }
}
