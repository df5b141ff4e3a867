pub mod controller;
pub mod expiry;
pub mod filter;
pub mod model;
pub mod service;
