//! Local search operators for polishing routes.

mod two_opt;

pub use two_opt::two_opt_improve;
