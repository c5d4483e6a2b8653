//! Page primitives used by the report renderer.
//!
//! Everything here draws at absolute page coordinates given in points. The helpers cover the
//! background template, the rounded photo clip, raster placement and single text lines; image
//! decoding goes through the [`image`] crate so that errors carry the source of the failure.

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage, Rgba};
use printpdf::{IndirectFontRef, Line, Mm, PdfLayerReference, Point};

use crate::config::{pt_to_mm, Rect};
use crate::error::{AssetError, PhotoError};

/// Photos wider or taller than this many pixels are rejected before decoding.
pub const MAX_PHOTO_DIMENSION: u32 = 8192;

/// Control point distance for approximating a quarter circle with a cubic Bézier curve.
const KAPPA: f64 = 0.552_284_749_8;

// printpdf sizes an image as `pixels / dpi` inches; at 72 dpi one pixel is one point.
const POINT_DPI: f64 = 72.0;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

fn mm(points: f64) -> Mm {
    Mm(pt_to_mm(points))
}

/// Loads a photo from in-memory bytes, refusing images larger than [`MAX_PHOTO_DIMENSION`].
pub fn decode_image_from_bytes(bytes: impl AsRef<[u8]>) -> Result<DynamicImage, PhotoError> {
    decode_image_with_limit(bytes.as_ref(), MAX_PHOTO_DIMENSION)
}

/// Loads an image from in-memory bytes after checking its declared size against `max_side`.
pub fn decode_image_with_limit(bytes: &[u8], max_side: u32) -> Result<DynamicImage, PhotoError> {
    let reader = || {
        image::io::Reader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|err| PhotoError::Decode(err.to_string()))
    };

    let (width, height) = reader()?
        .into_dimensions()
        .map_err(|err| PhotoError::Decode(err.to_string()))?;
    if width > max_side || height > max_side {
        return Err(PhotoError::Decode(format!(
            "image is {}x{} pixels, larger than the {} pixel limit",
            width, height, max_side
        )));
    }

    reader()?
        .decode()
        .map_err(|err| PhotoError::Decode(err.to_string()))
}

/// Loads an image from `path`, guessing the format from its content.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<DynamicImage, AssetError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(AssetError::Missing(path.to_path_buf()));
    }

    let decode_error = |reason: String| AssetError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    image::io::Reader::open(path)
        .map_err(|err| decode_error(err.to_string()))?
        .with_guessed_format()
        .map_err(|err| decode_error(err.to_string()))?
        .decode()
        .map_err(|err| decode_error(err.to_string()))
}

/// Composites an image with an alpha channel onto white and drops the alpha channel.
///
/// The PDF writer embeds plain RGB samples, so transparency has to be resolved up front.
pub fn flatten_alpha(image: DynamicImage) -> DynamicImage {
    if !image.color().has_alpha() {
        return DynamicImage::ImageRgb8(image.to_rgb8());
    }
    let (width, height) = image.dimensions();
    flatten_onto(image, &RgbImage::from_pixel(width, height, WHITE))
}

/// Composites `image` over `backdrop`, which must have the same pixel size.
fn flatten_onto(image: DynamicImage, backdrop: &RgbImage) -> DynamicImage {
    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let Rgb([br, bg, bb]) = *backdrop.get_pixel(x, y);
        let alpha = f64::from(a) / 255.0;
        let blend = |channel: u8, under: u8| {
            (f64::from(channel) * alpha + f64::from(under) * (1.0 - alpha)).round() as u8
        };
        rgb.put_pixel(x, y, Rgb([blend(r, br), blend(g, bg), blend(b, bb)]));
    }
    DynamicImage::ImageRgb8(rgb)
}

/// Resolves the photo's transparency against what lies beneath it on the page.
///
/// The template region under `frame` is resampled to the photo's pixel size and used as the
/// backdrop, so transparent photo pixels show the template. Without a template the backdrop is
/// white, matching the blank page.
pub fn composite_photo(
    photo: DynamicImage,
    template: Option<&DynamicImage>,
    frame: Rect,
    page_width: f64,
    page_height: f64,
) -> DynamicImage {
    if !photo.color().has_alpha() {
        return DynamicImage::ImageRgb8(photo.to_rgb8());
    }

    let (width, height) = photo.dimensions();
    let backdrop = match template {
        Some(template)
            if width > 0 && height > 0 && template.width() > 0 && template.height() > 0 =>
        {
            template_region(template, frame, page_width, page_height)
                .resize_exact(width, height, FilterType::Triangle)
                .to_rgb8()
        }
        _ => RgbImage::from_pixel(width, height, WHITE),
    };
    flatten_onto(photo, &backdrop)
}

/// Crops the part of a full-page `template` covered by `frame`.
fn template_region(
    template: &DynamicImage,
    frame: Rect,
    page_width: f64,
    page_height: f64,
) -> DynamicImage {
    let (tw, th) = template.dimensions();
    let scale_x = f64::from(tw) / page_width;
    let scale_y = f64::from(th) / page_height;

    // Page y grows upwards, image rows grow downwards.
    let top = page_height - (frame.y + frame.height);
    let x = ((frame.x * scale_x).floor().max(0.0) as u32).min(tw.saturating_sub(1));
    let y = ((top * scale_y).floor().max(0.0) as u32).min(th.saturating_sub(1));
    let width = ((frame.width * scale_x).ceil() as u32).clamp(1, tw - x);
    let height = ((frame.height * scale_y).ceil() as u32).clamp(1, th - y);

    template.crop_imm(x, y, width, height)
}

/// Outline points of a rounded rectangle, counter-clockwise from the bottom edge.
///
/// A point flagged `true` is followed by the two Bézier control points of a corner curve; the
/// corner's end point follows the controls. The radius is clamped to half the shorter side.
pub fn rounded_rect_points(rect: Rect, radius: f64) -> Vec<(f64, f64, bool)> {
    let radius = radius.max(0.0).min(rect.width / 2.0).min(rect.height / 2.0);
    let (left, bottom) = (rect.x, rect.y);
    let (right, top) = (rect.x + rect.width, rect.y + rect.height);

    if radius <= f64::EPSILON {
        return vec![
            (left, bottom, false),
            (right, bottom, false),
            (right, top, false),
            (left, top, false),
        ];
    }

    let handle = radius * KAPPA;
    vec![
        (left + radius, bottom, false),
        (right - radius, bottom, true),
        (right - radius + handle, bottom, true),
        (right, bottom + radius - handle, false),
        (right, bottom + radius, false),
        (right, top - radius, true),
        (right, top - radius + handle, true),
        (right - radius + handle, top, false),
        (right - radius, top, false),
        (left + radius, top, true),
        (left + radius - handle, top, true),
        (left, top - radius + handle, false),
        (left, top - radius, false),
        (left, bottom + radius, true),
        (left, bottom + radius - handle, true),
        (left + radius - handle, bottom, false),
        (left + radius, bottom, false),
    ]
}

/// Builds a closed clipping path shaped as a rounded rectangle.
pub fn rounded_clip_path(rect: Rect, radius: f64) -> Line {
    let points = rounded_rect_points(rect, radius)
        .into_iter()
        .map(|(x, y, next_is_handle)| (Point::new(mm(x), mm(y)), next_is_handle))
        .collect();

    Line {
        points,
        is_closed: true,
        has_fill: false,
        has_stroke: false,
        is_clipping_path: true,
    }
}

/// Draws `image` stretched to exactly cover `rect`.
pub fn place_image(layer: &PdfLayerReference, image: &DynamicImage, rect: Rect) {
    let (px_width, px_height) = image.dimensions();
    if px_width == 0 || px_height == 0 {
        return;
    }

    let scale_x = rect.width / f64::from(px_width);
    let scale_y = rect.height / f64::from(px_height);

    printpdf::Image::from_dynamic_image(image).add_to_layer(
        layer.clone(),
        Some(mm(rect.x)),
        Some(mm(rect.y)),
        None,
        Some(scale_x),
        Some(scale_y),
        Some(POINT_DPI),
    );
}

/// Draws `image` inside a rounded clip covering `rect`.
///
/// The clip is scoped to a saved graphics state, so later drawing is unaffected.
pub fn place_clipped_image(
    layer: &PdfLayerReference,
    image: &DynamicImage,
    rect: Rect,
    corner_radius: f64,
) {
    layer.save_graphics_state();
    layer.add_shape(rounded_clip_path(rect, corner_radius));
    place_image(layer, image, rect);
    layer.restore_graphics_state();
}

/// Loads the template image at `path` with any transparency resolved against white.
pub fn load_template(path: &Path) -> Result<DynamicImage, AssetError> {
    decode_image_from_path(path).map(flatten_alpha)
}

/// Draws `template` across the whole page.
pub fn draw_template(
    layer: &PdfLayerReference,
    template: &DynamicImage,
    page_width: f64,
    page_height: f64,
) {
    place_image(
        layer,
        template,
        Rect::new(0.0, 0.0, page_width, page_height),
    );
}

/// Draws a single left-aligned line of text with its baseline at `(x, y)`.
///
/// The text is drawn as given; nothing is wrapped or truncated.
pub fn draw_text_line(
    layer: &PdfLayerReference,
    text: &str,
    font: &IndirectFontRef,
    font_size: f64,
    x: f64,
    y: f64,
) {
    if text.is_empty() {
        return;
    }
    layer.use_text(text, font_size, mm(x), mm(y), font);
}
