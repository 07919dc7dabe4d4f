//! External collaborators consumed by the pipeline core.
//!
//! Each concern is a trait so runs can be driven by in-memory fakes; the concrete types are
//! thin HTTP / process adapters.

pub mod deliver;
pub mod extract;
pub mod generate;
pub mod render;
pub mod upload;

pub use deliver::{Deliverer, DeliveryPayload, WebhookDeliverer};
pub use extract::{ExtractedArticle, Extractor, HttpExtractor};
pub use generate::{CardContent, FocusPoint, Generator, GroqGenerator, ReelScript};
pub use render::{CommandRenderer, RenderJob, Renderer};
pub use upload::{CloudinaryClient, CloudinaryCredentials, UploadedMedia, Uploader};
