//! PDF rendering infrastructure

mod request;
mod service;
mod worker;

pub use request::{PageText, RenderFault, RenderRequest, RenderResponse};
pub use service::{DocumentRenderer, RenderService};
