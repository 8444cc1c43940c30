pub mod review;
pub mod user;
pub mod wine;
