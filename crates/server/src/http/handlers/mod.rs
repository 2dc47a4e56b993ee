pub mod articles;
pub mod channel;
