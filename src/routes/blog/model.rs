use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateBlogRequest {
    pub title: String,
    pub content: String,
}

impl CreateBlogRequest {
    pub fn validate(&self) -> Result<(), String> {
        let title_len = self.title.trim().chars().count();
        if !(3..=100).contains(&title_len) {
            return Err("title must be between 3 and 100 characters".into());
        }
        if self.content.trim().chars().count() < 10 {
            return Err("content must be at least 10 characters".into());
        }
        Ok(())
    }
}
