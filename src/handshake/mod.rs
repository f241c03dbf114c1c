pub mod client;
pub mod driver;
mod session;
