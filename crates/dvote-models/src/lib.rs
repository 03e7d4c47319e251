pub mod poll;
pub mod vote;

pub use poll::{Poll, PollOption, PollSummary};
pub use vote::{VoteReceipt, VoteRecord};
