pub mod canon;

pub use canon::{CanonRepository, SurrealCanonRepository};
