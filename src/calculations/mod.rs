pub mod splits;

pub use splits::{SplitDerivation, SplitOutcome};
