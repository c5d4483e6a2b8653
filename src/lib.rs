//! Interview report PDF rendering.
//!
//! A [`ReportRenderer`] overlays the fields of a [`ReportRequest`] onto a fixed A4 background
//! template: candidate details, a rounded candidate photo and a justified overview paragraph.
//!
//! ```no_run
//! use interview_report::{RendererConfig, ReportRenderer, ReportRequest};
//!
//! let renderer = ReportRenderer::new(RendererConfig::from_environment());
//! let request = ReportRequest::new()
//!     .with_name("Asha Rao")
//!     .with_interview_id("INT-2024-001")
//!     .with_ai_overview("Strong fundamentals.");
//! let document = renderer.render(&request)?;
//! std::fs::write(&document.filename, &document.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod config;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod model;
pub mod photo;

pub use builder::{DocumentRenderer, ReportRenderer};
pub use config::{Layout, RendererConfig};
pub use error::{AssetError, FontError, PhotoError, RenderError};
pub use model::{RenderedDocument, ReportRequest};
pub use photo::{HttpPhotoFetcher, NoPhotos, PhotoFetcher};
