pub mod songs;
pub mod users;
