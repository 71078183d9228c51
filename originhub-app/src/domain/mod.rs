mod chat;
mod comment;
mod idea;
mod idea_event;
mod upvote;
mod user;

pub use chat::{Chat, ChatMessage, Sender};
pub use comment::{assemble_tree, forest_to_json, Comment, CommentNode, NewComment};
pub use idea::{Idea, IdeaFilter, IdeaPatch, IdeaSort, NewIdea, IDEA_STATUS_DRAFT};
pub use idea_event::{IdeaEvent, UpvoteAction};
pub use upvote::{Upvote, UpvoteStatus};
pub use user::User;
