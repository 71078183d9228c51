pub mod chat;
pub mod comment;
pub mod idea;
pub mod message;
pub mod upvote;
pub mod user;

pub use chat::Entity as Chat;
pub use comment::Entity as Comment;
pub use idea::Entity as Idea;
pub use message::Entity as Message;
pub use upvote::Entity as Upvote;
pub use user::Entity as User;
