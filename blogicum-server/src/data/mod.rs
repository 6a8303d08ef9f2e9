pub mod category_repository;
pub mod comment_repository;
pub mod memory;
pub mod post_repository;
pub mod user_repository;

pub use category_repository::{
    CategoryRepository, LocationRepository, PostgresCategoryRepository, PostgresLocationRepository,
};
pub use comment_repository::{CommentRepository, PostgresCommentRepository};
pub use memory::InMemoryStore;
pub use post_repository::{PostRepository, PostgresPostRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
