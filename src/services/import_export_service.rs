use opml::{Outline, OPML};

use crate::errors::{NewsflowError, NewsflowResult};
use crate::services::FeedService;

pub struct ImportResult {
    pub added: Vec<String>,             // stored source names
    pub invalid: Vec<(String, String)>, // (url, error message)
    pub duplicates: Vec<String>,
}

#[derive(Clone)]
pub struct ImportExportService {
    service: FeedService,
}

impl ImportExportService {
    pub fn new(service: FeedService) -> Self {
        Self { service }
    }

    /// Import subscriptions from OPML content. URLs already configured are
    /// reported as duplicates; the rest go through the normal add path
    /// (validation plus an immediate fetch).
    pub fn import_opml(&self, content: &str) -> NewsflowResult<ImportResult> {
        let opml =
            OPML::from_str(content).map_err(|e| NewsflowError::OpmlParse(e.to_string()))?;

        let mut result = ImportResult {
            added: Vec::new(),
            invalid: Vec::new(),
            duplicates: Vec::new(),
        };

        for (name, url) in Self::collect_feeds(&opml.body.outlines) {
            if self.service.has_source_url(&url) {
                result.duplicates.push(url);
                continue;
            }

            match self.service.add_source(name.as_deref(), &url) {
                Some(stored_name) => result.added.push(stored_name),
                None => result.invalid.push((
                    url,
                    "Could not find a valid RSS or Atom feed at this URL".to_string(),
                )),
            }
        }

        Ok(result)
    }

    /// Recursively collect (name, xmlUrl) pairs from OPML outlines.
    fn collect_feeds(outlines: &[Outline]) -> Vec<(Option<String>, String)> {
        let mut feeds = Vec::new();

        for outline in outlines {
            if let Some(url) = &outline.xml_url {
                if !url.is_empty() {
                    let name = if outline.text.trim().is_empty() {
                        outline.title.clone().filter(|t| !t.trim().is_empty())
                    } else {
                        Some(outline.text.clone())
                    };
                    feeds.push((name, url.clone()));
                }
            }

            feeds.extend(Self::collect_feeds(&outline.outlines));
        }

        feeds
    }

    /// Export every configured source as OPML.
    pub fn export_opml(&self) -> NewsflowResult<String> {
        let sources = self.service.all_sources();

        let mut opml = OPML::default();
        opml.head = Some(opml::Head {
            title: Some("Newsflow Subscriptions".to_string()),
            ..Default::default()
        });

        for source in sources {
            let outline = Outline {
                text: source.name.clone(),
                r#type: Some("rss".to_string()),
                xml_url: Some(source.url.clone()),
                title: Some(source.name),
                ..Default::default()
            };
            opml.body.outlines.push(outline);
        }

        opml.to_string()
            .map_err(|e| NewsflowError::OpmlParse(e.to_string()))
    }
}
