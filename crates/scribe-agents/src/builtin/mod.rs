//! Built-in agent set.

mod action_item;
mod follow_up;
mod prescription;
mod summary;

pub use action_item::ActionItemAgent;
pub use follow_up::FollowUpAgent;
pub use prescription::PrescriptionAgent;
pub use summary::SummaryAgent;
