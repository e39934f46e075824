pub mod activity;
pub mod chat;
pub mod events;
pub mod health;
pub mod react;
pub mod scheduler;
