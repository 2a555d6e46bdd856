//! Pipeline stages and sources behind `PullStream`
//!
//! `core` holds the `LazyIterator` trait and the element-wise stages,
//! `constructors` the sources, `advanced` the stateful stages and sequential
//! combinators, and `parallel` the concurrent merge engine.

pub mod core;
pub mod constructors;
pub mod advanced;
pub mod parallel;

// Re-export core types
pub use self::core::{BoxedIter, LazyIterator};

// Re-export sources
pub use constructors::{Generate, IterSource, Iterate, IterateFrom, ResultSource, VecSource};

// Re-export stateful stages and combinators
pub use advanced::{
    Barrier, Concat, DedupAdjacent, DropWhile, FillFn, FlatMap, FlatMapStream, Split, TakeWhile, Zip, Zip3,
    ZipAll, ZipLane,
};

// Re-export the merge engine
pub use parallel::{
    ParallelConcatIter, ParallelMerge, ParallelZip3Iter, ParallelZipAllIter, ParallelZipIter,
};
