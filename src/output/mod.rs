//! Run artifacts written after the pipeline completes.

pub mod writer;

pub use writer::OutputWriter;
