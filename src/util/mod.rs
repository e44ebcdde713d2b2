//! Small helpers shared by the panel queries and the CLI.

/// Percent-encoding of stored text
pub mod percent;
/// Typed views over result records
pub mod record;
