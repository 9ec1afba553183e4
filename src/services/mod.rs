pub mod broadcast;
pub mod round_lifecycle;

pub use round_lifecycle::{begin_round, conclude_round, EndReason};
