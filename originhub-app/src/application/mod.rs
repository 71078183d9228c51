mod chat_history;
mod comment_tree_builder;
mod idea_catalog;
mod upvote_ledger;
mod user_directory;

pub use chat_history::ChatHistory;
pub use comment_tree_builder::CommentTreeBuilder;
pub use idea_catalog::IdeaCatalog;
pub use upvote_ledger::{RecountSummary, UpvoteLedger};
pub use user_directory::UserDirectory;
