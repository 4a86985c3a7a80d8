//! Supporting services

mod email;

pub use email::EmailService;
