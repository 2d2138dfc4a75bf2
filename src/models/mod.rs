//! Data models for the View voting application.
//!
//! These models match the upstream API's JSON shapes (snake_case) exactly.

mod category;
mod comment;
mod compose;
mod page;
mod user;
mod view;

pub use category::*;
pub use comment::*;
pub use compose::*;
pub use page::*;
pub use user::*;
pub use view::*;
