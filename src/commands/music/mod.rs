pub mod join;
pub mod play;

pub mod utils;
