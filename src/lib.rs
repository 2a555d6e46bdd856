pub mod error;
pub mod queue;
pub mod close;
pub mod executor;
pub mod collector;

pub mod stream_configuration;
pub mod stream;
pub mod pull_stream;
pub mod pull_stream_ext;

// Re-export all items from pull_stream module at the crate root
pub use pull_stream::*;
pub use pull_stream_ext::IntoPullStream;
pub use error::{StreamError, StreamResult};
pub use stream_configuration::ParallelConfig;
pub use stream::parallel::{
    parallel_concat,
    parallel_concat_with,
    parallel_zip,
    parallel_zip3,
    parallel_zip3_longest,
    parallel_zip_all,
    parallel_zip_all_longest,
    parallel_zip_longest,
    queued,
    ParallelMerge,
};
