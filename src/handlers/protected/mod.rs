pub mod users;
pub mod wines;
