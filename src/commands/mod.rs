//! Command implementations behind the CLI.

mod check;
mod dump;
mod show;
mod tangle;

pub use check::check;
pub use dump::{dump, DumpOptions};
pub use show::{show, ShowOptions};
pub use tangle::{tangle, TangleOptions};
