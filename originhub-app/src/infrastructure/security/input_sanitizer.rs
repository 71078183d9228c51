use originhub_errors::AppError;

const MAX_URL_LENGTH: usize = 2048;
const MAX_SHORT_FIELD_LENGTH: usize = 255;
const MAX_COMMENT_LENGTH: usize = 5000;
const MAX_TAGS: usize = 20;

const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

pub struct InputSanitizer;

impl InputSanitizer {
    /// Trims and rejects blank values.
    pub fn require_text(field: &str, value: &str) -> Result<String, AppError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(AppError::Validation(format!(
                "Field '{field}' cannot be empty"
            )));
        }
        Ok(value.to_string())
    }

    /// Like `require_text`, for the columns stored as `VARCHAR(255)`.
    pub fn require_short_text(field: &str, value: &str) -> Result<String, AppError> {
        let value = Self::require_text(field, value)?;
        if value.chars().count() > MAX_SHORT_FIELD_LENGTH {
            return Err(AppError::Validation(format!(
                "Field '{field}' must be at most {MAX_SHORT_FIELD_LENGTH} characters"
            )));
        }
        Ok(value)
    }

    pub fn validate_comment(content: &str) -> Result<String, AppError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "Comment content cannot be empty".to_string(),
            ));
        }
        if content.chars().count() > MAX_COMMENT_LENGTH {
            return Err(AppError::Validation(format!(
                "Comment content must be at most {MAX_COMMENT_LENGTH} characters"
            )));
        }
        Ok(content.to_string())
    }

    /// Trims, drops blanks and duplicates, keeps first-seen order.
    pub fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>, AppError> {
        let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            let tag = tag.trim();
            if tag.is_empty() || normalized.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                continue;
            }
            normalized.push(tag.to_string());
        }
        if normalized.len() > MAX_TAGS {
            return Err(AppError::Validation(format!(
                "An idea can have at most {MAX_TAGS} tags"
            )));
        }
        Ok(normalized)
    }

    /// Blank links count as "no link".
    pub fn validate_link(link: Option<String>) -> Result<Option<String>, AppError> {
        let Some(link) = link else {
            return Ok(None);
        };
        let link = link.trim();
        if link.is_empty() {
            return Ok(None);
        }

        if link.len() > MAX_URL_LENGTH {
            return Err(AppError::Validation("Link is too long".to_string()));
        }

        let parsed = url::Url::parse(link)
            .map_err(|_| AppError::Validation("Link is not a valid URL".to_string()))?;

        let scheme = parsed.scheme().to_lowercase();
        if !ALLOWED_SCHEMES.contains(&scheme.as_str()) {
            return Err(AppError::Validation(
                "Only HTTP and HTTPS links are allowed".to_string(),
            ));
        }

        if parsed.host_str().is_none() {
            return Err(AppError::Validation("Link must have a host".to_string()));
        }

        Ok(Some(parsed.to_string()))
    }

    pub fn validate_email(email: &str) -> Result<String, AppError> {
        let email = Self::require_short_text("email", email)?;
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
            _ => {
                tracing::warn!("Rejected malformed email address");
                Err(AppError::Validation("Email address is malformed".to_string()))
            }
        }
    }
}
