use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use interview_report::config::FONT_PATH_ENV;
use interview_report::{PhotoError, PhotoFetcher, RendererConfig, ReportRenderer, ReportRequest};
use sha2::{Digest, Sha256};

const MISSING_FONT: &str = "/__interview_report_missing__/font.ttf";
const MISSING_TEMPLATE: &str = "/__interview_report_missing__/template.png";

fn sample_request() -> ReportRequest {
    ReportRequest::new()
        .with_name("Asha Rao")
        .with_role("Backend Engineer")
        .with_date("12 March 2024")
        .with_interview_id("INT-2024-001")
        .with_ai_overview(
            "Asha explained trade-offs between consistency and availability clearly.\n\
             Follow-up on observability was thinner but still solid.",
        )
}

/// A real TrueType font from `INTERVIEW_REPORT_FONT` or the bundled assets, if one is installed.
fn installed_font() -> Option<PathBuf> {
    std::env::var_os(FONT_PATH_ENV)
        .map(PathBuf::from)
        .into_iter()
        .chain(std::iter::once(
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("assets/fonts/IBMPlexSansDevanagari-Regular.ttf"),
        ))
        .find(|path| path.is_file())
}

fn renderer_without_assets() -> ReportRenderer {
    ReportRenderer::new(RendererConfig::new(MISSING_FONT, MISSING_TEMPLATE))
}

fn png_bytes(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(pixel)));
    let mut bytes = Vec::new();
    image
        .write_to(&mut bytes, ImageOutputFormat::Png)
        .expect("encode png");
    bytes
}

fn temp_template(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "interview_report_template_{}_{}.png",
        tag,
        std::process::id()
    ));
    std::fs::write(&path, png_bytes(60, 85, [20, 40, 90, 255])).expect("write template");
    path
}

/// Serves a fixed payload and counts requests.
struct StubPhotos {
    payload: Result<Vec<u8>, String>,
    calls: Arc<AtomicUsize>,
}

impl StubPhotos {
    fn serving(bytes: Vec<u8>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let stub = Self {
            payload: Ok(bytes),
            calls: Arc::clone(&calls),
        };
        (stub, calls)
    }

    fn failing(reason: &str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let stub = Self {
            payload: Err(reason.to_owned()),
            calls: Arc::clone(&calls),
        };
        (stub, calls)
    }
}

impl PhotoFetcher for StubPhotos {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, PhotoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payload.clone().map_err(|reason| PhotoError::Download {
            url: url.to_owned(),
            reason,
        })
    }
}

/// Values printpdf stamps differently on every save: timestamps and document IDs, both in the
/// info dictionary and in the XMP metadata.
const VOLATILE_FIELDS: [(&[u8], &[u8]); 7] = [
    (b"/CreationDate(", b")"),
    (b"/ModDate(", b")"),
    (b"/ID[", b"]"),
    (b"<xmp:CreateDate>", b"<"),
    (b"<xmp:ModifyDate>", b"<"),
    (b"<xmp:MetadataDate>", b"<"),
    (b"<xmpMM:DocumentID>", b"<"),
];

/// Overwrites every volatile value with zeros, keeping byte offsets intact.
fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    let mut scrubbed = bytes.to_vec();
    for (open, close) in VOLATILE_FIELDS {
        let mut from = 0;
        while let Some(start) = find(&scrubbed[from..], open).map(|pos| from + pos + open.len()) {
            let Some(len) = find(&scrubbed[start..], close) else {
                break;
            };
            scrubbed[start..start + len].fill(b'0');
            from = start + len;
        }
    }
    scrubbed
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    let digest = Sha256::digest(&normalized);
    digest.into()
}

/// Counts `/Page` names that are not `/Pages`, `/PageMode` and the like.
fn count_pages(bytes: &[u8]) -> usize {
    const TAG: &[u8] = b"/Page";
    bytes
        .windows(TAG.len() + 1)
        .filter(|window| window.starts_with(TAG) && !window[TAG.len()].is_ascii_alphanumeric())
        .count()
}

#[test]
fn renders_a_single_page_pdf() {
    let document = renderer_without_assets()
        .render(&sample_request())
        .expect("render report");

    assert!(document.bytes.starts_with(b"%PDF"), "output must be a PDF");
    assert_eq!(count_pages(&document.bytes), 1, "report must be one page");
    assert_eq!(document.filename, "INT-2024-001.pdf");
}

#[test]
fn custom_font_is_embedded_and_measured() {
    let Some(font) = installed_font() else {
        eprintln!(
            "Skipping custom_font_is_embedded_and_measured: no font found. Set INTERVIEW_REPORT_FONT or copy a font into assets/fonts."
        );
        return;
    };

    let renderer = ReportRenderer::new(RendererConfig::new(&font, MISSING_TEMPLATE));
    assert!(!renderer.font().is_builtin(), "{} should register", font.display());

    let document = renderer.render(&sample_request()).expect("render with custom font");
    assert!(document.bytes.starts_with(b"%PDF"));
    assert!(
        find(&document.bytes, b"/FontFile2").is_some(),
        "custom font should be embedded as a TrueType stream"
    );

    let width = renderer.config().layout.overview_box_width();
    let text = "Asha walked through the sharded queue migration step by step. ".repeat(6);
    let layout = renderer.overview_layout(&text);
    assert!(layout.lines.len() > 1);
    for line in &layout.lines {
        assert!(line.natural_width > 0.0);
        assert!(
            line.natural_width <= width + 1e-6,
            "line '{}' is {}pt wide, box is {}pt",
            line.text,
            line.natural_width,
            width
        );
    }
}

#[test]
fn transparent_photo_renders_over_the_template() {
    let template = temp_template("transparent_photo");
    let config = RendererConfig::new(MISSING_FONT, &template);

    let (stub, calls) = StubPhotos::serving(png_bytes(4, 4, [0, 0, 0, 0]));
    let with_photo = ReportRenderer::new(config.clone())
        .with_photo_fetcher(stub)
        .render(
            &sample_request().with_candidate_photo(Some("https://cdn.example.com/a.png".to_owned())),
        )
        .expect("render with transparent photo");
    let without_photo = ReportRenderer::new(config)
        .render(&sample_request())
        .expect("render without photo");
    let _ = std::fs::remove_file(&template);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(with_photo.bytes.len() > without_photo.bytes.len());
}

#[test]
fn empty_request_renders_with_fallback_filename() {
    let document = renderer_without_assets()
        .render(&ReportRequest::new())
        .expect("render empty report");

    assert!(document.bytes.starts_with(b"%PDF"));
    assert_eq!(document.filename, "report.pdf");
}

#[test]
fn template_is_drawn_when_present() {
    let template = temp_template("present");
    let with_template = ReportRenderer::new(RendererConfig::new(MISSING_FONT, &template))
        .render(&sample_request())
        .expect("render with template");
    let _ = std::fs::remove_file(&template);

    let without_template = renderer_without_assets()
        .render(&sample_request())
        .expect("render without template");

    assert!(
        with_template.bytes.len() > without_template.bytes.len(),
        "template image should add an image object to the document"
    );
}

#[test]
fn undecodable_template_is_skipped() {
    let path = std::env::temp_dir().join(format!(
        "interview_report_bad_template_{}.png",
        std::process::id()
    ));
    std::fs::write(&path, b"not an image").expect("write bad template");

    let result = ReportRenderer::new(RendererConfig::new(MISSING_FONT, &path)).render(&sample_request());
    let _ = std::fs::remove_file(&path);

    let document = result.expect("render with broken template");
    assert!(document.bytes.starts_with(b"%PDF"));
}

#[test]
fn failed_photo_matches_a_report_without_photo() {
    let (stub, calls) = StubPhotos::failing("connection refused");
    let with_failed_photo = renderer_without_assets()
        .with_photo_fetcher(stub)
        .render(
            &sample_request().with_candidate_photo(Some("https://cdn.example.com/a.png".to_owned())),
        )
        .expect("render with failing photo");
    let without_photo = renderer_without_assets()
        .render(&sample_request())
        .expect("render without photo");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        normalized_hash(&with_failed_photo.bytes),
        normalized_hash(&without_photo.bytes),
        "a failed photo must leave the rest of the page unchanged"
    );
}

#[test]
fn undecodable_photo_is_skipped() {
    let (stub, calls) = StubPhotos::serving(b"<html>not found</html>".to_vec());
    let document = renderer_without_assets()
        .with_photo_fetcher(stub)
        .render(
            &sample_request().with_candidate_photo(Some("https://cdn.example.com/a.png".to_owned())),
        )
        .expect("render with garbage photo");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(document.bytes.starts_with(b"%PDF"));
}

#[test]
fn photo_with_alpha_is_embedded() {
    let (stub, calls) = StubPhotos::serving(png_bytes(32, 40, [200, 120, 40, 128]));
    let with_photo = renderer_without_assets()
        .with_photo_fetcher(stub)
        .render(
            &sample_request().with_candidate_photo(Some("https://cdn.example.com/a.png".to_owned())),
        )
        .expect("render with photo");
    let without_photo = renderer_without_assets()
        .render(&sample_request())
        .expect("render without photo");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(with_photo.bytes.len() > without_photo.bytes.len());
}

#[test]
fn blank_photo_url_is_not_fetched() {
    let (stub, calls) = StubPhotos::serving(png_bytes(4, 4, [0, 0, 0, 255]));
    renderer_without_assets()
        .with_photo_fetcher(stub)
        .render(&sample_request().with_candidate_photo(Some("   ".to_owned())))
        .expect("render with blank photo url");

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn overview_keeps_explicit_line_breaks() {
    let layout = renderer_without_assets().overview_layout("First point.\n\nThird point.");

    let texts: Vec<&str> = layout.lines.iter().map(|line| line.text.as_str()).collect();
    assert_eq!(texts, ["First point.", "", "Third point."]);
    assert!(layout.lines.iter().all(|line| !line.justified));
}

#[test]
fn long_overview_wraps_within_the_box() {
    let renderer = renderer_without_assets();
    let width = renderer.config().layout.overview_box_width();
    let text = "The candidate walked through a migration plan for a sharded queue, \
                covering backfill, dual writes, verification and rollback in detail. "
        .repeat(4);

    let layout = renderer.overview_layout(text.trim_end());
    assert!(layout.lines.len() > 3);
    assert!(layout
        .lines
        .iter()
        .all(|line| line.natural_width <= width + 1e-6));
    assert!(layout.lines[..layout.lines.len() - 1]
        .iter()
        .all(|line| line.justified));
    assert!(!layout.lines.last().expect("last line").justified);
}

#[test]
fn cjk_overview_wraps_between_characters() {
    let renderer = renderer_without_assets();
    let width = renderer.config().layout.overview_box_width();
    let text = "候选人在系统设计环节表现出色，能够清晰地解释缓存一致性与分布式事务之间的权衡。".repeat(5);

    let layout = renderer.overview_layout(&text);
    assert!(layout.lines.len() > 1);
    for line in &layout.lines {
        assert!(line.natural_width <= width + 1e-6);
        assert!(!line.text.starts_with('，') && !line.text.starts_with('。'));
    }
}

#[test]
fn rendering_is_deterministic() {
    let renderer = renderer_without_assets();
    let bytes_a = renderer.render(&sample_request()).expect("first render").bytes;
    let bytes_b = renderer.render(&sample_request()).expect("second render").bytes;

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "PDF renders must be deterministic after metadata normalization"
    );
}
