pub mod blog_service;
pub mod outcome;

pub use blog_service::BlogService;
pub use outcome::{Outcome, Page, Redirect};
