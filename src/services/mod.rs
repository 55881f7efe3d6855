pub mod ai;
pub mod recommendation;
pub mod search;
pub mod workflow;
