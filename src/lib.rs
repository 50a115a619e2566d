//! Sprout - Grow PEP 723 dependency blocks straight from a script's imports
//!
//! A Python script that declares its own dependencies in a `# /// script`
//! block can be run by `uv run` without a separate manifest. Sprout parses
//! a script's imports, classifies every module as standard-library, local,
//! or third-party, and writes the third-party set into the script's block,
//! creating one when it is missing and preserving everything else.

pub mod classify;
pub mod error;
pub mod header;
pub mod imports;
pub mod output;
pub mod process;
pub mod stdlib;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use classify::{ClassifiedModules, ModuleKind, classify, classify_all};
pub use error::Error;
pub use header::{BLOCK_END, BLOCK_START, DEFAULT_REQUIRES_PYTHON, merge_metadata};
pub use imports::{ImportRecord, extract_imports};
pub use output::{JsonEntry, Reporter, Tally, print_json};
pub use process::{FileReport, Outcome, ProcessOptions, process_file};
pub use stdlib::{OriginProbe, StdlibNames, StdlibOracle, select_oracle};
