pub mod category;
pub mod comment;
pub mod error;
pub mod location;
pub mod pagination;
pub mod policy;
pub mod post;
pub mod user;
pub mod viewer;

pub use category::Category;
pub use comment::{Comment, CommentView};
pub use error::{DomainError, FieldErrors};
pub use location::Location;
pub use post::{Post, PostView};
pub use user::User;
pub use viewer::Viewer;
