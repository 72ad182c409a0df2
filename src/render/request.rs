//! Render request and response types

use std::sync::Arc;

/// Text of one rendered page, one entry per line. Blocks are separated by an
/// empty line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageText {
    /// 1-indexed page number
    pub page: usize,
    pub lines: Vec<String>,
}

/// Request sent to the render worker
#[derive(Debug)]
pub enum RenderRequest {
    /// Decode a new document, replacing the open one
    Load { generation: u64, bytes: Arc<[u8]> },

    /// Render one page of the open document
    Page { generation: u64, page: usize },

    /// Shutdown the worker
    Shutdown,
}

/// Errors from the render worker
#[derive(Debug, thiserror::Error)]
pub enum RenderFault {
    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("{detail}")]
    Generic { detail: String },
}

impl RenderFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Response from the render worker. Every variant carries the generation of
/// the document it belongs to so stale results can be dropped.
#[derive(Debug)]
pub enum RenderResponse {
    /// Document decoded (sent once per load)
    Loaded {
        generation: u64,
        page_count: usize,
        title: Option<String>,
    },

    /// Document could not be decoded
    LoadFailed { generation: u64, error: RenderFault },

    /// Rendered page text
    Page {
        generation: u64,
        text: Arc<PageText>,
    },

    /// A single page could not be rendered
    PageFailed {
        generation: u64,
        page: usize,
        error: RenderFault,
    },
}
