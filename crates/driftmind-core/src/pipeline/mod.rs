//! Pipeline: the components that turn a transcript into memories (sleep)
//! and memories back into a preamble (wake).

pub mod affect;
pub mod decay;
pub mod goals;
pub mod ingest;
pub mod knowledge;
pub mod narrative;
pub mod parser;
pub mod qvalue;
pub mod retrieval;
pub mod share;
pub mod sleep;
pub mod transcript;
pub mod wake;

pub use sleep::{run_sleep, SleepOutcome};
pub use wake::run_wake;
