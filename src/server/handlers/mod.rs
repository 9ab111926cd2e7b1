pub mod conversations;
pub mod feedback;
pub mod health;
pub mod qa;
pub mod stats;
