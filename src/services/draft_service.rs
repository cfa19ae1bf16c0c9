use crate::domain::Draft;

/// Formats editor drafts as downloadable markdown.
#[derive(Clone, Copy)]
pub struct DraftExportService;

impl DraftExportService {
    pub fn new() -> Self {
        Self
    }

    /// Title heading, the body as-is, then a source link footer.
    pub fn to_markdown(&self, draft: &Draft) -> String {
        format!(
            "# {}\n\n{}\n\n[source]({})\n",
            draft.title, draft.body, draft.source_url
        )
    }
}

impl Default for DraftExportService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_layout() {
        let draft = Draft {
            id: "draft-1".to_string(),
            title: "My Notes".to_string(),
            body: "Some thoughts on the article.".to_string(),
            source_url: "https://example.com/post-1".to_string(),
        };

        let markdown = DraftExportService::new().to_markdown(&draft);

        assert!(markdown.starts_with("# My Notes\n\n"));
        assert!(markdown.contains("Some thoughts on the article."));
        assert!(markdown.contains("[source](https://example.com/post-1)"));
        assert!(markdown.ends_with("\n"));
    }
}
