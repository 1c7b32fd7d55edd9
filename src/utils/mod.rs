pub mod middleware;
pub mod sanitize;
pub mod slug;
pub mod text;
