//! PDF render worker - runs in a separate thread and keeps the decoded
//! document open between page requests

use std::sync::Arc;

use flume::{Receiver, Sender};
use log::{debug, info, warn};

use super::request::{PageText, RenderFault, RenderRequest, RenderResponse};

#[cfg(feature = "pdf")]
mod engine {
    use mupdf::text_page::TextBlockType;
    use mupdf::{Document, MetadataName, TextPageFlags};

    use super::RenderFault;

    pub struct OpenDocument {
        doc: Document,
        page_count: usize,
    }

    impl OpenDocument {
        pub fn open(bytes: &[u8]) -> Result<Self, RenderFault> {
            let doc = Document::from_bytes(bytes, "application/pdf")?;
            let page_count = usize::try_from(doc.page_count()?).unwrap_or(0);
            if page_count == 0 {
                return Err(RenderFault::generic("document has no pages"));
            }
            Ok(Self { doc, page_count })
        }

        pub fn page_count(&self) -> usize {
            self.page_count
        }

        pub fn title(&self) -> Option<String> {
            self.doc
                .metadata(MetadataName::Title)
                .ok()
                .filter(|t| !t.trim().is_empty())
        }

        /// Extract the text of a 1-indexed page
        pub fn page_lines(&self, page: usize) -> Result<Vec<String>, RenderFault> {
            if page == 0 || page > self.page_count {
                return Err(RenderFault::generic(format!(
                    "page {page} is outside 1..={}",
                    self.page_count
                )));
            }

            let page = self.doc.load_page((page - 1) as i32)?;
            let text_page = page.to_text_page(TextPageFlags::empty())?;

            let mut lines = Vec::new();
            for block in text_page.blocks() {
                if block.r#type() != TextBlockType::Text {
                    continue;
                }
                for line in block.lines() {
                    let text: String = line.chars().filter_map(|ch| ch.char()).collect();
                    lines.push(text.trim_end().to_string());
                }
                lines.push(String::new());
            }
            while lines.last().is_some_and(String::is_empty) {
                lines.pop();
            }
            Ok(lines)
        }
    }
}

#[cfg(not(feature = "pdf"))]
mod engine {
    use super::RenderFault;

    pub enum OpenDocument {}

    impl OpenDocument {
        pub fn open(_bytes: &[u8]) -> Result<Self, RenderFault> {
            Err(RenderFault::generic("built without PDF support"))
        }

        pub fn page_count(&self) -> usize {
            match *self {}
        }

        pub fn title(&self) -> Option<String> {
            match *self {}
        }

        pub fn page_lines(&self, _page: usize) -> Result<Vec<String>, RenderFault> {
            match *self {}
        }
    }
}

use engine::OpenDocument;

/// Collapse a burst of queued requests.
///
/// A load discards everything queued before it and only the newest page
/// request survives. Shutdown wins over everything.
pub(crate) fn coalesce(
    first: RenderRequest,
    rest: impl IntoIterator<Item = RenderRequest>,
) -> Vec<RenderRequest> {
    let mut batch = Vec::new();
    for request in std::iter::once(first).chain(rest) {
        match &request {
            RenderRequest::Shutdown => return vec![RenderRequest::Shutdown],
            RenderRequest::Load { .. } => batch.clear(),
            RenderRequest::Page { .. } => {
                batch.retain(|r| !matches!(r, RenderRequest::Page { .. }));
            }
        }
        batch.push(request);
    }
    batch
}

/// Main worker function - runs in a dedicated thread
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn render_worker(requests: Receiver<RenderRequest>, responses: Sender<RenderResponse>) {
    let mut current: Option<(u64, OpenDocument)> = None;

    while let Ok(first) = requests.recv() {
        for request in coalesce(first, requests.try_iter()) {
            let response = match request {
                RenderRequest::Shutdown => {
                    debug!("Render worker stopped");
                    return;
                }

                RenderRequest::Load { generation, bytes } => {
                    current = None;
                    match OpenDocument::open(&bytes) {
                        Ok(doc) => {
                            info!(
                                "Loaded document {generation}: {} pages",
                                doc.page_count()
                            );
                            let response = RenderResponse::Loaded {
                                generation,
                                page_count: doc.page_count(),
                                title: doc.title(),
                            };
                            current = Some((generation, doc));
                            response
                        }
                        Err(error) => {
                            warn!("Failed to load document {generation}: {error}");
                            RenderResponse::LoadFailed { generation, error }
                        }
                    }
                }

                RenderRequest::Page { generation, page } => match &current {
                    Some((open, doc)) if *open == generation => match doc.page_lines(page) {
                        Ok(lines) => RenderResponse::Page {
                            generation,
                            text: Arc::new(PageText { page, lines }),
                        },
                        Err(error) => RenderResponse::PageFailed {
                            generation,
                            page,
                            error,
                        },
                    },
                    _ => {
                        debug!("Skipping page {page} of stale document {generation}");
                        continue;
                    }
                },
            };

            if responses.send(response).is_err() {
                return;
            }
        }
    }
}
