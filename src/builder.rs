//! Report composition.
//!
//! [`ReportRenderer`] owns everything that is resolved once per process (configuration, the
//! registered font and the photo fetcher) and turns each [`ReportRequest`] into a finished
//! single-page PDF. Optional sections (template, photo) report failures as `Result`s which are
//! logged and skipped. A render fails only when no font at all can be embedded or the document
//! cannot be serialized.

use std::io::BufWriter;
use std::sync::Arc;

use image::DynamicImage;
use log::{debug, warn};
use printpdf::{Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use crate::config::{pt_to_mm, RendererConfig};
use crate::elements::{self, decode_image_from_bytes};
use crate::error::{PhotoError, RenderError};
use crate::fonts::{self, InstalledFont, ReportFont};
use crate::layout::{layout_paragraph, ParagraphLayout, ParagraphStyle};
use crate::model::{RenderedDocument, ReportRequest};
use crate::photo::{NoPhotos, PhotoFetcher};

const DOCUMENT_TITLE: &str = "Interview Report";
const LAYER_NAME: &str = "Report";

/// Anything that can turn a report request into a PDF.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, request: &ReportRequest) -> Result<RenderedDocument, RenderError>;
}

/// Renders interview reports onto the configured template.
pub struct ReportRenderer {
    config: RendererConfig,
    font: ReportFont,
    photos: Arc<dyn PhotoFetcher>,
}

impl ReportRenderer {
    /// Creates a renderer, registering the report font once.
    ///
    /// Photo fetching is disabled until a fetcher is supplied with
    /// [`with_photo_fetcher`](Self::with_photo_fetcher).
    pub fn new(config: RendererConfig) -> Self {
        let font = ReportFont::select(&config.font_name, &config.font_path);
        Self {
            config,
            font,
            photos: Arc::new(NoPhotos),
        }
    }

    /// Sets the fetcher used for candidate photos and returns the updated renderer.
    ///
    /// Fetchers block while downloading, so async callers should run [`render`](Self::render)
    /// through `tokio::task::spawn_blocking`.
    pub fn with_photo_fetcher(mut self, fetcher: impl PhotoFetcher + 'static) -> Self {
        self.photos = Arc::new(fetcher);
        self
    }

    /// Returns the configuration the renderer was built with.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Returns the face used for all text.
    pub fn font(&self) -> &ReportFont {
        &self.font
    }

    /// Lays out overview text exactly as [`render`](Self::render) would place it.
    pub fn overview_layout(&self, text: &str) -> ParagraphLayout {
        layout_paragraph(text, &self.font.metrics(), &self.overview_style())
    }

    /// Renders `request` into a PDF.
    pub fn render(&self, request: &ReportRequest) -> Result<RenderedDocument, RenderError> {
        let layout = &self.config.layout;
        let (document, page, layer) = PdfDocument::new(
            DOCUMENT_TITLE,
            Mm(pt_to_mm(layout.page_width)),
            Mm(pt_to_mm(layout.page_height)),
            LAYER_NAME,
        );
        let layer = document.get_page(page).get_layer(layer);

        let font = self.install_font(&document)?;

        let template = match elements::load_template(&self.config.template_path) {
            Ok(template) => {
                elements::draw_template(&layer, &template, layout.page_width, layout.page_height);
                Some(template)
            }
            Err(err) => {
                warn!("Rendering without template background: {}", err);
                None
            }
        };

        if let Some(url) = request.photo_url() {
            if let Err(err) = self.draw_photo(&layer, url, template.as_ref()) {
                warn!("Skipping candidate photo: {}", err);
            }
        }

        layer.set_fill_color(layout.text_color.clone());
        self.draw_details(&layer, &font, request);
        self.draw_overview(&layer, &font, &request.ai_overview);

        let bytes = finalize(document)?;
        debug!(
            "Rendered report '{}' ({} bytes)",
            request.interview_id,
            bytes.len()
        );

        Ok(RenderedDocument {
            bytes,
            filename: request.download_filename(),
        })
    }

    fn install_font(&self, document: &PdfDocumentReference) -> Result<InstalledFont, RenderError> {
        match self.font.install(document) {
            Ok(font) => Ok(font),
            Err(err) if !self.font.is_builtin() => {
                warn!(
                    "Falling back to '{}' for this report: {}",
                    fonts::FALLBACK_FONT_NAME,
                    err
                );
                Ok(fonts::install_builtin(document)?)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn draw_photo(
        &self,
        layer: &PdfLayerReference,
        url: &str,
        template: Option<&DynamicImage>,
    ) -> Result<(), PhotoError> {
        let layout = &self.config.layout;
        let frame = layout.photo_frame();
        let bytes = self.photos.fetch(url)?;
        let image = elements::composite_photo(
            decode_image_from_bytes(&bytes)?,
            template,
            frame,
            layout.page_width,
            layout.page_height,
        );
        elements::place_clipped_image(layer, &image, frame, layout.photo_corner_radius);
        Ok(())
    }

    fn draw_details(&self, layer: &PdfLayerReference, font: &InstalledFont, request: &ReportRequest) {
        let layout = &self.config.layout;
        let lines = [
            (&request.name, layout.name_font_size, layout.name_baseline),
            (&request.role, layout.details_font_size, layout.role_baseline),
            (&request.date, layout.details_font_size, layout.date_baseline),
            (
                &request.interview_id,
                layout.details_font_size,
                layout.interview_id_baseline,
            ),
        ];

        for (text, font_size, baseline) in lines {
            elements::draw_text_line(
                layer,
                text,
                &font.reference,
                font_size,
                layout.details_x,
                baseline,
            );
        }
    }

    fn draw_overview(&self, layer: &PdfLayerReference, font: &InstalledFont, text: &str) {
        let layout = &self.config.layout;
        let style = self.overview_style();
        let paragraph = layout_paragraph(text, &font.metrics, &style);

        if paragraph.height() > layout.overview_max_height {
            debug!(
                "Overview is {:.1}pt tall and extends past the {:.1}pt box",
                paragraph.height(),
                layout.overview_max_height
            );
        }

        let baselines = paragraph.baselines(layout.overview_top());
        for (line, baseline) in paragraph.lines.iter().zip(baselines) {
            for fragment in &line.fragments {
                elements::draw_text_line(
                    layer,
                    &fragment.text,
                    &font.reference,
                    style.font_size,
                    layout.overview_x + fragment.x,
                    baseline,
                );
            }
        }
    }

    fn overview_style(&self) -> ParagraphStyle {
        let layout = &self.config.layout;
        ParagraphStyle::new(
            layout.overview_font_size,
            layout.overview_leading,
            layout.overview_box_width(),
        )
    }
}

impl DocumentRenderer for ReportRenderer {
    fn render(&self, request: &ReportRequest) -> Result<RenderedDocument, RenderError> {
        ReportRenderer::render(self, request)
    }
}

fn finalize(document: PdfDocumentReference) -> Result<Vec<u8>, RenderError> {
    let mut writer = BufWriter::new(Vec::new());
    document
        .save(&mut writer)
        .map_err(|err| RenderError::Finalize(err.to_string()))?;
    writer
        .into_inner()
        .map_err(|err| RenderError::Flush(err.into_error()))
}
