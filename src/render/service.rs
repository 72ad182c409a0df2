//! Render service - owns the render worker thread

use flume::{Receiver, Sender};
use log::warn;

use super::request::{RenderRequest, RenderResponse};
use super::worker::render_worker;
use crate::document::PdfDocument;

/// Loads documents and renders pages without blocking the caller.
///
/// Results are collected with `poll_responses`, which must not block.
pub trait DocumentRenderer {
    fn load(&mut self, generation: u64, document: &PdfDocument);
    fn request_page(&mut self, generation: u64, page: usize);
    fn poll_responses(&mut self) -> Vec<RenderResponse>;
}

/// Renders PDF pages on a dedicated worker thread
pub struct RenderService {
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
}

impl Default for RenderService {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderService {
    #[must_use]
    pub fn new() -> Self {
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        std::thread::spawn(move || {
            render_worker(request_rx, response_tx);
        });

        Self {
            request_tx,
            response_rx,
        }
    }

    fn send(&self, request: RenderRequest) {
        if self.request_tx.send(request).is_err() {
            warn!("Render worker is gone, request dropped");
        }
    }

    pub fn shutdown(&self) {
        let _ = self.request_tx.send(RenderRequest::Shutdown);
    }
}

impl DocumentRenderer for RenderService {
    fn load(&mut self, generation: u64, document: &PdfDocument) {
        self.send(RenderRequest::Load {
            generation,
            bytes: document.render_source(),
        });
    }

    fn request_page(&mut self, generation: u64, page: usize) {
        self.send(RenderRequest::Page { generation, page });
    }

    fn poll_responses(&mut self) -> Vec<RenderResponse> {
        self.response_rx.try_iter().collect()
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
