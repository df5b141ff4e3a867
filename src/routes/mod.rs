pub mod favorites;
pub mod health;
pub mod listings;
pub mod notifications;
pub mod requests;
pub mod users;
