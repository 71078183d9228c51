use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const IDEA_STATUS_DRAFT: &str = "draft";

/// Read-shaped idea returned to callers. `upvotes` is the cached ledger count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub problem: String,
    pub solution: String,
    pub market_size: String,
    pub tags: Vec<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub upvotes: i32,
    pub views: i32,
    pub status: String,
    pub user_id: Option<String>,
    pub link: Option<String>,
}

impl Idea {
    pub fn new(input: NewIdea, user_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            problem: input.problem,
            solution: input.solution,
            market_size: input.market_size,
            tags: input.tags,
            author: input.author,
            created_at: Utc::now(),
            upvotes: 0,
            views: 0,
            status: IDEA_STATUS_DRAFT.to_string(),
            user_id,
            link: input.link,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIdea {
    pub title: String,
    pub description: String,
    pub problem: String,
    pub solution: String,
    pub market_size: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author: String,
    #[serde(default)]
    pub link: Option<String>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub problem: Option<String>,
    pub solution: Option<String>,
    pub market_size: Option<String>,
    pub tags: Option<Vec<String>>,
    pub link: Option<String>,
}

impl IdeaPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.problem.is_none()
            && self.solution.is_none()
            && self.market_size.is_none()
            && self.tags.is_none()
            && self.link.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdeaSort {
    #[default]
    Newest,
    Title,
}

impl IdeaSort {
    /// Unknown keys fall back to newest first.
    pub fn from_key(key: &str) -> Self {
        match key {
            "title" => Self::Title,
            _ => Self::Newest,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IdeaFilter {
    pub search: Option<String>,
    /// Comma separated tag fragments; an idea matches if any of them matches.
    pub tags: Option<String>,
    pub sort: IdeaSort,
}

impl IdeaFilter {
    pub fn tag_terms(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn matches_tags(&self, tags: &[String]) -> bool {
        let terms = self.tag_terms();
        if terms.is_empty() {
            return true;
        }
        let joined = tags.join(",").to_lowercase();
        terms.iter().any(|term| joined.contains(term.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_fallback() {
        assert_eq!(IdeaSort::from_key("title"), IdeaSort::Title);
        assert_eq!(IdeaSort::from_key("createdAt"), IdeaSort::Newest);
        assert_eq!(IdeaSort::from_key("upvotes"), IdeaSort::Newest);
    }

    #[test]
    fn test_tag_matching_is_case_insensitive_substring() {
        let filter = IdeaFilter {
            tags: Some(" Fin , health".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.tag_terms(), vec!["fin", "health"]);
        assert!(filter.matches_tags(&["FinTech".to_string()]));
        assert!(filter.matches_tags(&["ai".to_string(), "HealthCare".to_string()]));
        assert!(!filter.matches_tags(&["education".to_string()]));
    }

    #[test]
    fn test_empty_tag_filter_matches_everything() {
        let filter = IdeaFilter::default();
        assert!(filter.matches_tags(&[]));
        let blank = IdeaFilter {
            tags: Some(" , ".to_string()),
            ..Default::default()
        };
        assert!(blank.matches_tags(&["anything".to_string()]));
    }

    #[test]
    fn test_new_idea_starts_as_zeroed_draft() {
        let idea = Idea::new(
            NewIdea {
                title: "Solar kiosks".to_string(),
                ..Default::default()
            },
            Some("user_1".to_string()),
        );
        assert_eq!(idea.upvotes, 0);
        assert_eq!(idea.views, 0);
        assert_eq!(idea.status, IDEA_STATUS_DRAFT);
        assert!(idea.is_owned_by("user_1"));
        assert!(!idea.is_owned_by("user_2"));
    }
}
