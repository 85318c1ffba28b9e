pub mod affiliation;
pub mod events;
