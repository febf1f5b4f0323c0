//! Record emission and crawl statistics

pub mod sink;
pub mod stats;

pub use sink::{JsonLinesSink, MemorySink, OutputError, OutputResult, RecordSink};
pub use stats::CrawlStats;
