//! Reusable reductions for `PullStream::collect_by`
//!
//! A collector describes how to build a result: make an empty container,
//! add elements to it, merge two partial containers, and turn the final
//! container into the output.

use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;
use std::marker::PhantomData;

pub trait Collector<T> {
    type Container;
    type Output;

    fn supply(&mut self) -> Self::Container;

    fn accumulate(&mut self, container: &mut Self::Container, item: T);

    /// Merge two partial results, `right` after `left`. Sequential
    /// `collect_by` never splits its input, so only callers that build
    /// partial containers themselves use this.
    fn combine(&mut self, left: Self::Container, right: Self::Container) -> Self::Container;

    fn finish(self, container: Self::Container) -> Self::Output;
}

// ================================
// Stock collectors
// ================================

pub struct ToVec<T>(PhantomData<fn(T)>);

pub fn to_vec<T>() -> ToVec<T> {
    ToVec(PhantomData)
}

impl<T> Collector<T> for ToVec<T> {
    type Container = Vec<T>;
    type Output = Vec<T>;

    fn supply(&mut self) -> Vec<T> {
        Vec::new()
    }

    fn accumulate(&mut self, container: &mut Vec<T>, item: T) {
        container.push(item);
    }

    fn combine(&mut self, mut left: Vec<T>, mut right: Vec<T>) -> Vec<T> {
        left.append(&mut right);
        left
    }

    fn finish(self, container: Vec<T>) -> Vec<T> {
        container
    }
}

pub struct ToHashSet<T>(PhantomData<fn(T)>);

pub fn to_hash_set<T: Hash + Eq>() -> ToHashSet<T> {
    ToHashSet(PhantomData)
}

impl<T: Hash + Eq> Collector<T> for ToHashSet<T> {
    type Container = HashSet<T>;
    type Output = HashSet<T>;

    fn supply(&mut self) -> HashSet<T> {
        HashSet::new()
    }

    fn accumulate(&mut self, container: &mut HashSet<T>, item: T) {
        container.insert(item);
    }

    fn combine(&mut self, mut left: HashSet<T>, right: HashSet<T>) -> HashSet<T> {
        left.extend(right);
        left
    }

    fn finish(self, container: HashSet<T>) -> HashSet<T> {
        container
    }
}

/// Counts elements.
pub struct Counting;

pub fn counting() -> Counting {
    Counting
}

impl<T> Collector<T> for Counting {
    type Container = usize;
    type Output = usize;

    fn supply(&mut self) -> usize {
        0
    }

    fn accumulate(&mut self, container: &mut usize, _item: T) {
        *container += 1;
    }

    fn combine(&mut self, left: usize, right: usize) -> usize {
        left + right
    }

    fn finish(self, container: usize) -> usize {
        container
    }
}

/// Joins the `Display` form of elements with a separator.
pub struct Joining {
    separator: String,
}

pub fn joining(separator: impl Into<String>) -> Joining {
    Joining {
        separator: separator.into(),
    }
}

impl<T: Display> Collector<T> for Joining {
    // `None` until the first element, so empty elements still get separators
    type Container = Option<String>;
    type Output = String;

    fn supply(&mut self) -> Option<String> {
        None
    }

    fn accumulate(&mut self, container: &mut Option<String>, item: T) {
        match container {
            Some(joined) => {
                joined.push_str(&self.separator);
                joined.push_str(&item.to_string());
            }
            None => *container = Some(item.to_string()),
        }
    }

    fn combine(&mut self, left: Option<String>, right: Option<String>) -> Option<String> {
        match (left, right) {
            (Some(mut left), Some(right)) => {
                left.push_str(&self.separator);
                left.push_str(&right);
                Some(left)
            }
            (left, None) => left,
            (None, right) => right,
        }
    }

    fn finish(self, container: Option<String>) -> String {
        container.unwrap_or_default()
    }
}

/// Groups elements into vectors by key.
pub struct GroupingBy<F> {
    classifier: F,
}

pub fn grouping_by<F>(classifier: F) -> GroupingBy<F> {
    GroupingBy { classifier }
}

impl<T, K, F> Collector<T> for GroupingBy<F>
where
    K: Hash + Eq,
    F: FnMut(&T) -> K,
{
    type Container = HashMap<K, Vec<T>>;
    type Output = HashMap<K, Vec<T>>;

    fn supply(&mut self) -> HashMap<K, Vec<T>> {
        HashMap::new()
    }

    fn accumulate(&mut self, container: &mut HashMap<K, Vec<T>>, item: T) {
        container.entry((self.classifier)(&item)).or_default().push(item);
    }

    fn combine(&mut self, mut left: HashMap<K, Vec<T>>, right: HashMap<K, Vec<T>>) -> HashMap<K, Vec<T>> {
        for (key, mut items) in right {
            left.entry(key).or_default().append(&mut items);
        }
        left
    }

    fn finish(self, container: HashMap<K, Vec<T>>) -> HashMap<K, Vec<T>> {
        container
    }
}

/// Collector assembled from four closures.
pub struct FnCollector<S, A, C, F> {
    supplier: S,
    accumulator: A,
    combiner: C,
    finisher: F,
}

pub fn from_fns<S, A, C, F>(supplier: S, accumulator: A, combiner: C, finisher: F) -> FnCollector<S, A, C, F> {
    FnCollector {
        supplier,
        accumulator,
        combiner,
        finisher,
    }
}

impl<T, R, O, S, A, C, F> Collector<T> for FnCollector<S, A, C, F>
where
    S: FnMut() -> R,
    A: FnMut(&mut R, T),
    C: FnMut(R, R) -> R,
    F: FnOnce(R) -> O,
{
    type Container = R;
    type Output = O;

    fn supply(&mut self) -> R {
        (self.supplier)()
    }

    fn accumulate(&mut self, container: &mut R, item: T) {
        (self.accumulator)(container, item)
    }

    fn combine(&mut self, left: R, right: R) -> R {
        (self.combiner)(left, right)
    }

    fn finish(self, container: R) -> O {
        (self.finisher)(container)
    }
}
