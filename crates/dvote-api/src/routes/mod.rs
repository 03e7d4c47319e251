pub mod meta;
pub mod polls;
pub mod votes;
