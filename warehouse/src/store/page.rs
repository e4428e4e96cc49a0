use crate::document::Document;

/// One batch of query results.
///
/// A page with a continuation token is followed by at least one more request; a page
/// without one is the last. Pages may be empty while a continuation is still present.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    documents: Vec<Document>,
    continuation: Option<String>,
}

impl Page {
    pub fn new(documents: Vec<Document>, continuation: Option<String>) -> Self {
        Page {
            documents,
            continuation,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn continuation(&self) -> Option<&str> {
        self.continuation.as_deref()
    }

    #[inline]
    pub fn has_more_results(&self) -> bool {
        self.continuation.is_some()
    }

    pub fn into_parts(self) -> (Vec<Document>, Option<String>) {
        (self.documents, self.continuation)
    }
}
