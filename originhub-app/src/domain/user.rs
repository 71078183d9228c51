use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl User {
    pub fn new(user_id: String, email: String) -> Self {
        Self {
            user_id,
            email,
            first_name: None,
            last_name: None,
            bio: None,
        }
    }
}
