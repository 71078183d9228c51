use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub idea_id: Uuid,
    pub author_id: String,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn new(
        idea_id: Uuid,
        author_id: String,
        content: String,
        parent_comment_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            idea_id,
            author_id,
            parent_comment_id,
            content,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_comment_id.is_none()
    }
}

/// A comment with its direct replies. Reply chains can be arbitrarily deep,
/// so nothing here recurses: building, sizing, dropping and rendering all
/// walk the tree with an explicit stack.
#[derive(Debug, PartialEq, Eq)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    #[cfg(test)]
    pub(crate) fn leaf(comment: Comment) -> Self {
        Self {
            comment,
            replies: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        let mut size = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            size += 1;
            pending.extend(node.replies.iter());
        }
        size
    }
}

impl Drop for CommentNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.replies);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.replies);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    #[serde(default)]
    pub parent_comment_id: Option<Uuid>,
}

/// Turns one idea's flat comment set into a forest.
///
/// Comments are grouped by parent id once, then each node takes its children
/// out of that index. Top-level comments come newest first; replies at every
/// depth come oldest first. Ties fall back to the id so the output is stable.
/// Comments whose parent is not in the set are dropped.
pub fn assemble_tree(comments: Vec<Comment>) -> Vec<CommentNode> {
    let mut by_parent: HashMap<Option<Uuid>, Vec<Comment>> = HashMap::new();
    for comment in comments {
        by_parent
            .entry(comment.parent_comment_id)
            .or_default()
            .push(comment);
    }

    let mut roots = by_parent.remove(&None).unwrap_or_default();
    roots.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut forest = Vec::with_capacity(roots.len());
    for root in roots {
        // Depth-first; a node is finished once all its children are.
        let mut stack = vec![Frame::open(root, &mut by_parent)];
        while let Some(top) = stack.last_mut() {
            if let Some(child) = top.pending.next() {
                let frame = Frame::open(child, &mut by_parent);
                stack.push(frame);
                continue;
            }

            let Some(done) = stack.pop() else { break };
            let node = CommentNode {
                comment: done.comment,
                replies: done.built,
            };
            match stack.last_mut() {
                Some(parent) => parent.built.push(node),
                None => forest.push(node),
            }
        }
    }
    forest
}

struct Frame {
    comment: Comment,
    pending: std::vec::IntoIter<Comment>,
    built: Vec<CommentNode>,
}

impl Frame {
    fn open(comment: Comment, by_parent: &mut HashMap<Option<Uuid>, Vec<Comment>>) -> Self {
        let mut children = by_parent.remove(&Some(comment.id)).unwrap_or_default();
        children.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Self {
            comment,
            built: Vec::with_capacity(children.len()),
            pending: children.into_iter(),
        }
    }
}

/// Renders a forest as a JSON array. Each node is its comment's fields plus
/// a `replies` array of the same shape.
pub fn forest_to_json(nodes: &[CommentNode]) -> Result<String, serde_json::Error> {
    let mut out = String::from("[");
    let mut stack: Vec<(std::slice::Iter<'_, CommentNode>, bool)> = vec![(nodes.iter(), false)];

    loop {
        let Some((siblings, written)) = stack.last_mut() else {
            break;
        };
        let Some(node) = siblings.next() else {
            stack.pop();
            out.push(']');
            if !stack.is_empty() {
                out.push('}');
            }
            continue;
        };
        if *written {
            out.push(',');
        }
        *written = true;

        let fields = serde_json::to_string(&node.comment)?;
        let Some(open_object) = fields.strip_suffix('}') else {
            return Err(<serde_json::Error as serde::ser::Error>::custom(
                "comment did not serialize to an object",
            ));
        };
        out.push_str(open_object);
        out.push_str(",\"replies\":[");
        stack.push((node.replies.iter(), false));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(idea_id: Uuid, secs: i64, parent: Option<Uuid>) -> Comment {
        Comment {
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            ..Comment::new(idea_id, "author".to_string(), format!("t={secs}"), parent)
        }
    }

    #[test]
    fn test_top_level_newest_first_replies_oldest_first() {
        let idea = Uuid::new_v4();
        let c1 = at(idea, 1, None);
        let c2 = at(idea, 2, None);
        let c3 = at(idea, 3, None);
        let r2 = at(idea, 20, Some(c2.id));
        let r1 = at(idea, 10, Some(c2.id));

        let tree = assemble_tree(vec![
            r2.clone(),
            c1.clone(),
            c3.clone(),
            r1.clone(),
            c2.clone(),
        ]);

        let top: Vec<Uuid> = tree.iter().map(|n| n.comment.id).collect();
        assert_eq!(top, vec![c3.id, c2.id, c1.id]);

        let replies: Vec<Uuid> = tree[1].replies.iter().map(|n| n.comment.id).collect();
        assert_eq!(replies, vec![r1.id, r2.id]);
        assert!(tree[0].replies.is_empty());
        assert!(tree[2].replies.is_empty());
    }

    #[test]
    fn test_nested_replies_are_chronological_at_every_depth() {
        let idea = Uuid::new_v4();
        let root = at(idea, 1, None);
        let reply = at(idea, 2, Some(root.id));
        let late = at(idea, 9, Some(reply.id));
        let early = at(idea, 3, Some(reply.id));
        let deepest = at(idea, 4, Some(early.id));

        let tree = assemble_tree(vec![deepest.clone(), late.clone(), root, early.clone(), reply]);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].subtree_size(), 5);
        let second = &tree[0].replies[0];
        let ids: Vec<Uuid> = second.replies.iter().map(|n| n.comment.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);
        assert_eq!(second.replies[0].replies[0].comment.id, deepest.id);
        assert!(second.replies[1].replies.is_empty());
    }

    #[test]
    fn test_orphans_are_dropped() {
        let idea = Uuid::new_v4();
        let root = at(idea, 1, None);
        let orphan = at(idea, 2, Some(Uuid::new_v4()));

        let tree = assemble_tree(vec![orphan, root.clone()]);
        assert_eq!(tree, vec![CommentNode::leaf(root)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(assemble_tree(Vec::new()).is_empty());
    }

    #[test]
    fn test_forest_renders_flat_fields_with_nested_replies() {
        let idea = Uuid::new_v4();
        let root = at(idea, 5, None);
        let reply = at(idea, 6, Some(root.id));
        let other = at(idea, 7, None);
        let tree = assemble_tree(vec![root.clone(), reply.clone(), other.clone()]);

        let rendered = forest_to_json(&tree).unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(json[0]["id"], other.id.to_string());
        assert_eq!(json[0]["replies"], serde_json::json!([]));
        assert_eq!(json[1]["ideaId"], idea.to_string());
        assert_eq!(json[1]["authorId"], "author");
        assert!(json[1]["parentCommentId"].is_null());
        assert!(json[1]["updatedAt"].is_null());
        assert_eq!(json[1]["replies"][0]["id"], reply.id.to_string());
        assert_eq!(json[1]["replies"][0]["parentCommentId"], root.id.to_string());
        assert_eq!(json[1]["replies"][0]["replies"], serde_json::json!([]));

        assert_eq!(forest_to_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_very_deep_reply_chain() {
        const DEPTH: usize = 20_000;
        let idea = Uuid::new_v4();
        let mut chain = Vec::with_capacity(DEPTH);
        let mut parent = None;
        for i in 0..DEPTH {
            let comment = at(idea, i as i64, parent);
            parent = Some(comment.id);
            chain.push(comment);
        }
        let deepest = chain[DEPTH - 1].id;
        chain.reverse();

        let tree = assemble_tree(chain);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].subtree_size(), DEPTH);

        let mut node = &tree[0];
        let mut depth = 1;
        while let Some(next) = node.replies.first() {
            node = next;
            depth += 1;
        }
        assert_eq!(depth, DEPTH);
        assert_eq!(node.comment.id, deepest);

        let rendered = forest_to_json(&tree).unwrap();
        assert_eq!(rendered.matches("\"replies\":[").count(), DEPTH);
        assert!(rendered.ends_with(&format!("{}]", "]}".repeat(DEPTH))));

        drop(tree);
    }
}
