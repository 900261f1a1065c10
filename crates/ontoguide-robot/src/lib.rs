//! ROBOT adapter for ontoguide.
//!
//! Implements [`ontoguide_core::ExtractionTool`] by shelling out to the
//! [ROBOT](http://robot.obolibrary.org/) command-line tool:
//! - `robot extract` with a term file or repeated `--term` arguments
//! - `robot query` for the top-level class fallback

pub mod command;
pub mod query;
pub mod runner;
pub mod tool;

pub use command::RobotCommand;
pub use runner::{CommandOutput, RobotRunner};
pub use tool::RobotTool;
