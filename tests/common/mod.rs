#![allow(dead_code)]

pub mod fixtures;
pub mod harness;

pub use fixtures::{FixedEmbedding, RecordingSink};
pub use harness::TestHarness;
