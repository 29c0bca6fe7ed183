mod choice_received;
mod link_received;

pub use choice_received::choice_received;
pub use link_received::{hint_received, link_received};
