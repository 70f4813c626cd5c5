pub mod check;
pub mod selection;
pub mod state;
pub mod watch;
