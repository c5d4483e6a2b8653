//! Renderer configuration: asset locations and the fixed page layout.
//!
//! Everything here is resolved once at startup and then shared read-only by every render. All
//! layout values are PDF points measured from the bottom-left corner of the page unless a field
//! name says it is an offset from the top.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use printpdf::{Color, Rgb};

/// Logical name under which the report font is registered.
pub const DEFAULT_FONT_NAME: &str = "IBMPlexSansDevanagari";

/// Environment variable overriding the font file location.
pub const FONT_PATH_ENV: &str = "INTERVIEW_REPORT_FONT";

/// Environment variable overriding the template image location.
pub const TEMPLATE_PATH_ENV: &str = "INTERVIEW_REPORT_TEMPLATE";

const FONT_ASSET: &str = "fonts/IBMPlexSansDevanagari-Regular.ttf";
const TEMPLATE_ASSET: &str = "static/template.png";

const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// Width of an A4 page in points.
pub const A4_WIDTH_PT: f64 = 210.0 * POINTS_PER_MM;

/// Height of an A4 page in points.
pub const A4_HEIGHT_PT: f64 = 297.0 * POINTS_PER_MM;

/// Default upper bound for downloading the candidate photo.
pub const DEFAULT_PHOTO_TIMEOUT: Duration = Duration::from_secs(10);

/// Converts PDF points to millimetres.
pub fn pt_to_mm(points: f64) -> f64 {
    points / POINTS_PER_MM
}

/// Converts millimetres to PDF points.
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * POINTS_PER_MM
}

/// An axis-aligned rectangle in page coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Fixed positions and sizes of every element placed on the report template.
#[derive(Clone, Debug)]
pub struct Layout {
    pub page_width: f64,
    pub page_height: f64,

    pub photo_x: f64,
    pub photo_width: f64,
    pub photo_height: f64,
    /// Distance between the top edge of the page and the top edge of the photo.
    pub photo_top_offset: f64,
    /// Corner radius of the photo clip path. Zero yields square corners.
    pub photo_corner_radius: f64,

    pub details_x: f64,
    pub name_baseline: f64,
    pub role_baseline: f64,
    pub date_baseline: f64,
    pub interview_id_baseline: f64,
    pub name_font_size: f64,
    pub details_font_size: f64,

    pub overview_x: f64,
    /// Distance between the top edge of the page and the top of the overview box.
    pub overview_top_offset: f64,
    pub overview_width: f64,
    /// Nominal box height. Longer text keeps growing downwards past it.
    pub overview_max_height: f64,
    pub overview_right_margin: f64,
    pub overview_font_size: f64,
    pub overview_leading: f64,

    /// Fill colour of every text element.
    pub text_color: Color,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            page_width: A4_WIDTH_PT,
            page_height: A4_HEIGHT_PT,

            photo_x: 465.0,
            photo_width: 84.0,
            photo_height: 91.0,
            photo_top_offset: 108.0,
            photo_corner_radius: 12.0,

            details_x: 50.0,
            name_baseline: 700.0,
            role_baseline: 683.0,
            date_baseline: 665.0,
            interview_id_baseline: 645.0,
            name_font_size: 14.0,
            details_font_size: 12.0,

            overview_x: 56.0,
            overview_top_offset: 281.0,
            overview_width: 502.0,
            overview_max_height: 111.0,
            overview_right_margin: 36.0,
            overview_font_size: 11.0,
            overview_leading: 15.0,

            text_color: Color::Rgb(Rgb::new(1.0, 1.0, 1.0, None)),
        }
    }
}

impl Layout {
    /// Sets the photo corner radius and returns the updated layout.
    pub fn with_photo_corner_radius(mut self, radius: f64) -> Self {
        self.photo_corner_radius = radius.max(0.0);
        self
    }

    /// Area covered by the candidate photo, anchored to the top of the page.
    pub fn photo_frame(&self) -> Rect {
        let y = self.page_height - self.photo_top_offset - self.photo_height;
        Rect::new(self.photo_x, y, self.photo_width, self.photo_height)
    }

    /// Y coordinate of the top edge of the overview box.
    pub fn overview_top(&self) -> f64 {
        self.page_height - self.overview_top_offset
    }

    /// Usable width of the overview box, limited by the space left on the page.
    pub fn overview_box_width(&self) -> f64 {
        let remaining = self.page_width - self.overview_x - self.overview_right_margin;
        self.overview_width.min(remaining).max(0.0)
    }
}

/// Immutable configuration handed to [`ReportRenderer::new`](crate::builder::ReportRenderer::new).
#[derive(Clone, Debug)]
pub struct RendererConfig {
    pub font_path: PathBuf,
    pub font_name: String,
    pub template_path: PathBuf,
    pub layout: Layout,
    pub photo_timeout: Duration,
}

impl RendererConfig {
    /// Creates a configuration using explicit asset paths and default layout.
    pub fn new(font_path: impl Into<PathBuf>, template_path: impl Into<PathBuf>) -> Self {
        Self {
            font_path: font_path.into(),
            font_name: DEFAULT_FONT_NAME.to_owned(),
            template_path: template_path.into(),
            layout: Layout::default(),
            photo_timeout: DEFAULT_PHOTO_TIMEOUT,
        }
    }

    /// Resolves asset locations from the environment and the default search paths.
    ///
    /// See [`resolve_asset`] for the search order.
    pub fn from_environment() -> Self {
        Self::new(
            resolve_asset(None, FONT_PATH_ENV, FONT_ASSET),
            resolve_asset(None, TEMPLATE_PATH_ENV, TEMPLATE_ASSET),
        )
    }

    /// Resolves asset locations, preferring the given explicit paths.
    pub fn resolve(font_path: Option<PathBuf>, template_path: Option<PathBuf>) -> Self {
        Self::new(
            resolve_asset(font_path, FONT_PATH_ENV, FONT_ASSET),
            resolve_asset(template_path, TEMPLATE_PATH_ENV, TEMPLATE_ASSET),
        )
    }

    /// Sets the logical font name and returns the updated configuration.
    pub fn with_font_name(mut self, name: impl Into<String>) -> Self {
        self.font_name = name.into();
        self
    }

    /// Replaces the layout and returns the updated configuration.
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the photo download timeout and returns the updated configuration.
    pub fn with_photo_timeout(mut self, timeout: Duration) -> Self {
        self.photo_timeout = timeout;
        self
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn asset_candidates(explicit: Option<PathBuf>, env_var: &str, relative: &str) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = explicit.filter(|path| !path.as_os_str().is_empty()) {
        candidates.push(path);
    }

    if let Some(path) = env_path(env_var) {
        if !candidates.contains(&path) {
            candidates.push(path);
        }
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            let candidate = bin_dir.join("assets").join(relative);
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    let manifest_candidate = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join(relative);
    if !candidates.contains(&manifest_candidate) {
        candidates.push(manifest_candidate);
    }

    candidates
}

/// Picks the location of a static asset.
///
/// Candidates are checked in order: the explicit path, the path named by `env_var`, `assets/`
/// next to the running executable, and `assets/` under this crate's manifest directory. The first
/// existing file wins; if none exists the first candidate is returned so that the renderer can
/// report it as missing.
pub fn resolve_asset(explicit: Option<PathBuf>, env_var: &str, relative: &str) -> PathBuf {
    let candidates = asset_candidates(explicit, env_var, relative);

    match candidates.iter().find(|candidate| candidate.is_file()) {
        Some(found) => found.clone(),
        None => {
            debug!(
                "No {} found, checked: {}",
                relative,
                candidates
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            candidates
                .into_iter()
                .next()
                .unwrap_or_else(|| PathBuf::from("assets").join(relative))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_dimensions_match_points() {
        assert!((A4_WIDTH_PT - 595.2756).abs() < 1e-3);
        assert!((A4_HEIGHT_PT - 841.8898).abs() < 1e-3);
    }

    #[test]
    fn photo_frame_is_anchored_to_page_top() {
        let layout = Layout::default();
        let frame = layout.photo_frame();
        assert_eq!(frame.x, 465.0);
        assert!((frame.y - (A4_HEIGHT_PT - 108.0 - 91.0)).abs() < 1e-9);
        assert_eq!(frame.width, 84.0);
        assert_eq!(frame.height, 91.0);
    }

    #[test]
    fn overview_width_is_limited_by_page() {
        let layout = Layout::default();
        assert_eq!(layout.overview_box_width(), 502.0);

        let narrow = Layout {
            page_width: 400.0,
            ..Layout::default()
        };
        assert!((narrow.overview_box_width() - (400.0 - 56.0 - 36.0)).abs() < 1e-9);
    }

    #[test]
    fn text_is_white_by_default() {
        match Layout::default().text_color {
            Color::Rgb(rgb) => assert_eq!((rgb.r, rgb.g, rgb.b), (1.0, 1.0, 1.0)),
            other => panic!("unexpected text colour {:?}", other),
        }
    }

    #[test]
    fn negative_corner_radius_is_clamped() {
        let layout = Layout::default().with_photo_corner_radius(-3.0);
        assert_eq!(layout.photo_corner_radius, 0.0);
    }

    #[test]
    fn explicit_asset_path_is_preferred_when_missing() {
        let explicit = PathBuf::from("/__interview_report_missing__/font.ttf");
        let resolved = resolve_asset(
            Some(explicit.clone()),
            "__INTERVIEW_REPORT_UNSET__",
            "fonts/none.ttf",
        );
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn point_and_millimetre_conversions_are_inverse() {
        assert!((pt_to_mm(mm_to_pt(42.0)) - 42.0).abs() < 1e-9);
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-9);
    }
}
