pub mod comment;
pub mod notification;
pub mod password_reset;
pub mod post;
pub mod reaction;
pub mod user;
