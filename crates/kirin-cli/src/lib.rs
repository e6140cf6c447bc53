//! The `kirin` command-line driver.
//!
//! - `kirin resolve <project.json>`: elaborate a JSON project description and
//!   print every class's resolved supertypes with diagnostics
//! - `kirin pack <project.json> -o <dir>`: resolve and write one `.kirl`
//!   library per module
//! - `kirin link <libs...>`: link libraries, finish expect/actual linking,
//!   build fake overrides and print a summary
//!
//! Options come from `kirin.json` (see [`config::KirinConfig`]) overridden by
//! command-line flags.

pub mod args;
pub mod config;
pub mod driver;
pub mod elaborate;
pub mod project;
pub mod reporter;
pub mod tracing_config;

#[cfg(test)]
#[path = "tests/args_tests.rs"]
mod args_tests;
#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod config_tests;
#[cfg(test)]
#[path = "tests/project_tests.rs"]
mod project_tests;
#[cfg(test)]
#[path = "tests/elaborate_tests.rs"]
mod elaborate_tests;
#[cfg(test)]
#[path = "tests/reporter_tests.rs"]
mod reporter_tests;
