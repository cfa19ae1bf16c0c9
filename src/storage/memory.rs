use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::ArticleRecord;
use crate::errors::{NewsflowError, NewsflowResult};
use crate::storage::traits::ArticleStore;

#[derive(Default)]
struct Inner {
    links: HashSet<String>,
    records: Vec<ArticleRecord>,
}

/// Link-keyed in-memory article store: a set for O(1) membership plus an
/// insertion-ordered list of records.
#[derive(Default)]
pub struct InMemoryArticleStore {
    inner: RwLock<Inner>,
}

impl InMemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> NewsflowResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| NewsflowError::Storage("article store lock poisoned".to_string()))
    }

    fn write(&self) -> NewsflowResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| NewsflowError::Storage("article store lock poisoned".to_string()))
    }
}

impl ArticleStore for InMemoryArticleStore {
    fn save(&self, record: ArticleRecord) -> NewsflowResult<()> {
        let mut inner = self.write()?;
        inner.links.insert(record.link.clone());
        inner.records.push(record);
        Ok(())
    }

    fn save_if_new(&self, record: ArticleRecord) -> NewsflowResult<bool> {
        let mut inner = self.write()?;
        if inner.links.contains(&record.link) {
            return Ok(false);
        }
        inner.links.insert(record.link.clone());
        inner.records.push(record);
        Ok(true)
    }

    fn exists_by_url(&self, link: &str) -> NewsflowResult<bool> {
        Ok(self.read()?.links.contains(link))
    }

    fn find_all(&self) -> NewsflowResult<Vec<ArticleRecord>> {
        Ok(self.read()?.records.clone())
    }

    fn count(&self) -> NewsflowResult<usize> {
        Ok(self.read()?.records.len())
    }
}
