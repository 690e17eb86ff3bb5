pub mod corrections;
pub mod dedup;
pub mod editorial;
pub mod pipeline;
pub mod reliability;
pub mod scoring;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod verification;
