//! Font registration and glyph metrics for the report renderer.
//!
//! The report font is registered once, when the renderer is built. If the font file is missing or
//! cannot be parsed the renderer falls back to the builtin Helvetica face for every text element.
//! Metrics for the custom font come from `genpdf`'s font cache; Helvetica uses the static AFM
//! widths in [`helvetica`].

mod helvetica;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use genpdf::fonts::{FontCache, FontData, FontFamily};
use genpdf::style::{Style, StyledString};
use log::{debug, warn};
use printpdf::{BuiltinFont, IndirectFontRef, PdfDocumentReference};

use crate::config::mm_to_pt;
use crate::error::FontError;

/// Name reported for the builtin fallback face.
pub const FALLBACK_FONT_NAME: &str = "Helvetica";

// genpdf takes integral font sizes; widths are measured at this size and scaled linearly.
const REFERENCE_FONT_SIZE: u8 = 100;

/// Measures text in PDF points.
pub trait TextMeasure {
    /// Advance width of a single character at `font_size`.
    fn char_width(&self, c: char, font_size: f64) -> f64;

    /// Advance width of `text` at `font_size`.
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|c| self.char_width(c, font_size)).sum()
    }
}

/// A TrueType font that has been read and validated.
pub struct RegisteredFont {
    name: String,
    path: PathBuf,
    bytes: Vec<u8>,
    data: FontData,
}

impl RegisteredFont {
    /// Logical name of the font.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for RegisteredFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredFont")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Reads and validates the font at `path` under the logical `name`.
pub fn register_font(name: &str, path: &Path) -> Result<RegisteredFont, FontError> {
    if !path.is_file() {
        return Err(FontError::Missing(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|source| FontError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let data = FontData::new(bytes.clone(), None).map_err(|err| FontError::Malformed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    Ok(RegisteredFont {
        name: name.to_owned(),
        path: path.to_path_buf(),
        bytes,
        data,
    })
}

/// The face used for every text element of a report.
#[derive(Clone, Debug)]
pub enum ReportFont {
    /// A registered TrueType font, embedded into each document.
    Custom(Arc<RegisteredFont>),
    /// The builtin Helvetica face.
    Builtin,
}

impl ReportFont {
    /// Registers the font at `path`, falling back to Helvetica when that fails.
    pub fn select(name: &str, path: &Path) -> Self {
        match register_font(name, path) {
            Ok(font) => {
                debug!("Registered font '{}' from {}", name, path.display());
                ReportFont::Custom(Arc::new(font))
            }
            Err(err) => {
                warn!(
                    "Custom font unavailable ({}); falling back to '{}'.",
                    err, FALLBACK_FONT_NAME
                );
                ReportFont::Builtin
            }
        }
    }

    /// Name of the selected face.
    pub fn name(&self) -> &str {
        match self {
            ReportFont::Custom(font) => font.name(),
            ReportFont::Builtin => FALLBACK_FONT_NAME,
        }
    }

    /// Returns whether the builtin fallback face is in use.
    pub fn is_builtin(&self) -> bool {
        matches!(self, ReportFont::Builtin)
    }

    /// Builds metrics for measuring text set in this face.
    pub fn metrics(&self) -> FontMetrics {
        match self {
            ReportFont::Custom(font) => FontMetrics::Embedded(EmbeddedMetrics::new(&font.data)),
            ReportFont::Builtin => FontMetrics::Helvetica,
        }
    }

    /// Adds the face to `document`, returning the font reference and matching metrics.
    pub fn install(&self, document: &PdfDocumentReference) -> Result<InstalledFont, FontError> {
        match self {
            ReportFont::Custom(font) => {
                let reference = document
                    .add_external_font(Cursor::new(font.bytes.as_slice()))
                    .map_err(|err| FontError::Embed {
                        name: font.name.clone(),
                        reason: err.to_string(),
                    })?;
                Ok(InstalledFont {
                    reference,
                    metrics: self.metrics(),
                })
            }
            ReportFont::Builtin => install_builtin(document),
        }
    }
}

/// Adds builtin Helvetica to `document`.
pub fn install_builtin(document: &PdfDocumentReference) -> Result<InstalledFont, FontError> {
    let reference = document
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|err| FontError::Embed {
            name: FALLBACK_FONT_NAME.to_owned(),
            reason: err.to_string(),
        })?;
    Ok(InstalledFont {
        reference,
        metrics: FontMetrics::Helvetica,
    })
}

/// A font added to one document.
pub struct InstalledFont {
    pub reference: IndirectFontRef,
    pub metrics: FontMetrics,
}

/// Metrics matching an [`InstalledFont`].
pub enum FontMetrics {
    Embedded(EmbeddedMetrics),
    Helvetica,
}

impl TextMeasure for FontMetrics {
    fn char_width(&self, c: char, font_size: f64) -> f64 {
        match self {
            FontMetrics::Embedded(metrics) => metrics.char_width(c, font_size),
            FontMetrics::Helvetica => f64::from(helvetica::char_width(c)) * font_size / 1000.0,
        }
    }
}

/// Measures characters with a `genpdf` font cache built from the registered font.
pub struct EmbeddedMetrics {
    cache: FontCache,
    style: Style,
    widths: RefCell<HashMap<char, f64>>,
}

impl EmbeddedMetrics {
    fn new(data: &FontData) -> Self {
        let family = FontFamily {
            regular: data.clone(),
            bold: data.clone(),
            italic: data.clone(),
            bold_italic: data.clone(),
        };
        Self {
            cache: FontCache::new(family),
            style: Style::new().with_font_size(REFERENCE_FONT_SIZE),
            widths: RefCell::new(HashMap::new()),
        }
    }

    fn reference_width(&self, c: char) -> f64 {
        if let Some(width) = self.widths.borrow().get(&c) {
            return *width;
        }

        let measured: printpdf::Mm = StyledString::new(c.to_string(), self.style)
            .width(&self.cache)
            .into();
        let width = mm_to_pt(measured.0);
        self.widths.borrow_mut().insert(c, width);
        width
    }
}

impl TextMeasure for EmbeddedMetrics {
    fn char_width(&self, c: char, font_size: f64) -> f64 {
        self.reference_width(c) * font_size / f64::from(REFERENCE_FONT_SIZE)
    }
}
