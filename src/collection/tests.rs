use rayon::iter::ParallelIterator;

use super::ConcatList;

const NUM_ELEMENTS: usize = 1 << 20;

#[test]
fn test_size() {
    let mut list = ConcatList::new();
    assert!(list.is_empty());
    assert_eq!(list.len(), 0);
    list.push_back(17);
    assert!(!list.is_empty());
    assert_eq!(list.len(), 1);
    list.clear();
    assert!(list.is_empty());
    assert_eq!(list.len(), 0);
}

#[test]
fn test_iterator_order() {
    let mut list = ConcatList::new();
    list.push_back(1);
    list.push_back(2);
    list.push_back(3);
    assert_eq!(list.len(), 3);
    let collected: Vec<i32> = list.iter().copied().collect();
    assert_eq!(collected, vec![1, 2, 3]);
}

#[test]
fn test_append_is_length_preserving() {
    let mut a: ConcatList<i32> = (0..5).collect();
    let mut b: ConcatList<i32> = (5..12).collect();
    a.append(&mut b);
    assert_eq!(a.len(), 12);
    assert!(b.is_empty());
    let collected: Vec<i32> = a.iter().copied().collect();
    assert_eq!(collected, (0..12).collect::<Vec<i32>>());
}

#[test]
fn test_append_into_empty() {
    let mut a: ConcatList<i32> = ConcatList::new();
    let mut b: ConcatList<i32> = (0..3).collect();
    a.append(&mut b);
    assert_eq!(a.len(), 3);
    assert!(b.is_empty());
    // appending the now-empty list again is a no-op
    a.append(&mut b);
    assert_eq!(a.len(), 3);
}

#[test]
fn test_append_empty_is_noop() {
    let mut a: ConcatList<i32> = (0..3).collect();
    let mut b: ConcatList<i32> = ConcatList::new();
    a.append(&mut b);
    assert_eq!(a.len(), 3);
    assert!(!a.detect_cycle());
}

#[test]
fn test_detect_cycle_on_healthy_list() {
    let mut a: ConcatList<i32> = (0..100).collect();
    let mut b: ConcatList<i32> = (100..200).collect();
    a.append(&mut b);
    assert!(!a.detect_cycle());
    assert!(!b.detect_cycle());
}

#[test]
fn test_into_iter_drains() {
    let list: ConcatList<i32> = (0..10).collect();
    let drained: Vec<i32> = list.into_iter().collect();
    assert_eq!(drained, (0..10).collect::<Vec<i32>>());
}

#[test]
fn test_into_iter_partial_consumption_frees_rest() {
    let list: ConcatList<String> = (0..100).map(|i| i.to_string()).collect();
    let mut iter = list.into_iter();
    assert_eq!(iter.next().as_deref(), Some("0"));
    assert_eq!(iter.next().as_deref(), Some("1"));
    // the remaining 98 nodes are freed when the iterator is dropped
}

#[test]
fn test_equality() {
    let a: ConcatList<i32> = (0..4).collect();
    let b: ConcatList<i32> = (0..4).collect();
    let c: ConcatList<i32> = (0..5).collect();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_clone_is_independent() {
    let mut a: ConcatList<i32> = (0..4).collect();
    let b = a.clone();
    a.push_back(99);
    assert_eq!(a.len(), 5);
    assert_eq!(b.len(), 4);
}

#[test]
fn test_iterator_large() {
    let list: ConcatList<usize> = (0..NUM_ELEMENTS).collect();
    assert_eq!(list.len(), NUM_ELEMENTS);
    assert_eq!(list.iter().count(), NUM_ELEMENTS);
    let sum: u64 = list.iter().map(|&i| i as u64).sum();
    let expected = (NUM_ELEMENTS as u64 - 1) * NUM_ELEMENTS as u64 / 2;
    assert_eq!(sum, expected);
}

#[test]
fn test_par_iter_matches_sequential() {
    let list: ConcatList<usize> = (0..NUM_ELEMENTS).collect();
    assert_eq!(list.par_iter().count(), NUM_ELEMENTS);
    let parallel_sum: u64 = list.par_iter().map(|&i| i as u64).sum();
    let sequential_sum: u64 = list.iter().map(|&i| i as u64).sum();
    assert_eq!(parallel_sum, sequential_sum);
}

#[test]
fn test_par_iter_below_chunk_size() {
    let list: ConcatList<usize> = (0..10).collect();
    let sum: usize = list.par_iter().sum();
    assert_eq!(sum, 45);
}

#[test]
fn test_par_iter_empty() {
    let list: ConcatList<usize> = ConcatList::new();
    assert_eq!(list.par_iter().count(), 0);
}
