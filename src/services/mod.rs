pub mod catalog;
pub mod quiz;
pub mod song;
pub mod user;
