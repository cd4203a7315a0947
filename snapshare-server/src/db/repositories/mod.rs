mod comment_repository;
mod like_repository;
mod post_repository;
mod user_repository;

pub use comment_repository::CommentRepository;
pub use like_repository::{LikeRepository, LikeToggle};
pub use post_repository::{DeletedPost, PostRepository};
pub use user_repository::{NewUser, ProfileUpdate, UserRepository};
