use ab_glyph::{FontArc, PxScale};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_hollow_rect_mut, draw_text_mut},
    rect::Rect,
};
use schema::{Detection, SchemaError, decode_data_uri};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const BOX_THICKNESS: i32 = 2;
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_OFFSET: i32 = 20;

// Tried in order after the preferred font
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    DataUri(#[from] SchemaError),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// One text block per detection: class, confidence percentage, rounded box.
///
/// Box coordinates use `{:.0}`, which rounds halves to even (10.5 -> 10).
pub fn detection_lines(detections: &[Detection]) -> Vec<[String; 3]> {
    detections
        .iter()
        .map(|det| {
            let [x1, y1, x2, y2] = det.bbox;
            [
                format!("Class: {}", det.class_label),
                format!("Confidence: {:.2}%", det.confidence * 100.0),
                format!("Bounding Box: [{:.0}, {:.0}, {:.0}, {:.0}]", x1, y1, x2, y2),
            ]
        })
        .collect()
}

pub fn label_text(det: &Detection) -> String {
    format!("{} ({:.2}%)", det.class_label, det.confidence * 100.0)
}

/// Draws detection boxes and labels onto the image the service returned.
pub struct Annotator {
    font: Option<FontArc>,
}

impl Annotator {
    /// Use `preferred` if it loads, else the first system font that does.
    /// With no font at all, boxes are still drawn and labels are skipped.
    pub fn load(preferred: &Path) -> Self {
        let candidates =
            std::iter::once(preferred.to_path_buf()).chain(SYSTEM_FONTS.iter().map(PathBuf::from));

        for path in candidates {
            if let Some(font) = read_font(&path) {
                tracing::debug!(font = %path.display(), "Loaded label font");
                return Self { font: Some(font) };
            }
        }

        tracing::warn!(
            preferred = %preferred.display(),
            "No usable font found, labels will be skipped"
        );
        Self::without_labels()
    }

    pub fn without_labels() -> Self {
        Self { font: None }
    }

    /// Decode the returned image, annotate it and save it as JPEG to `output`.
    pub fn render(
        &self,
        data_uri: &str,
        detections: &[Detection],
        output: &Path,
    ) -> Result<(), RenderError> {
        let bytes = decode_data_uri(data_uri)?;
        let mut image = image::load_from_memory(&bytes)?.to_rgb8();

        self.annotate(&mut image, detections);

        image.save_with_format(output, ImageFormat::Jpeg)?;
        Ok(())
    }

    pub fn annotate(&self, image: &mut RgbImage, detections: &[Detection]) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        for det in detections {
            self.draw_detection(image, det);
        }
    }

    fn draw_detection(&self, image: &mut RgbImage, det: &Detection) {
        let max_x = (image.width() - 1) as f32;
        let max_y = (image.height() - 1) as f32;
        let to_px = |v: f32, max: f32| v.clamp(0.0, max).round() as i32;

        let (ax, bx) = (to_px(det.bbox[0], max_x), to_px(det.bbox[2], max_x));
        let (ay, by) = (to_px(det.bbox[1], max_y), to_px(det.bbox[3], max_y));
        let (x1, x2) = (ax.min(bx), ax.max(bx));
        let (y1, y2) = (ay.min(by), ay.max(by));

        // Outline grows inward
        for inset in 0..BOX_THICKNESS {
            let width = x2 - x1 + 1 - 2 * inset;
            let height = y2 - y1 + 1 - 2 * inset;
            if width < 1 || height < 1 {
                break;
            }
            draw_hollow_rect_mut(
                image,
                Rect::at(x1 + inset, y1 + inset).of_size(width as u32, height as u32),
                BOX_COLOR,
            );
        }

        if let Some(font) = &self.font {
            draw_text_mut(
                image,
                BOX_COLOR,
                x1,
                (y1 - LABEL_OFFSET).max(0),
                PxScale::from(LABEL_FONT_SIZE),
                font,
                &label_text(det),
            );
        }
    }
}

fn read_font(path: &Path) -> Option<FontArc> {
    let bytes = fs::read(path).ok()?;
    match FontArc::try_from_vec(bytes) {
        Ok(font) => Some(font),
        Err(e) => {
            tracing::debug!(font = %path.display(), error = %e, "Not a usable font");
            None
        }
    }
}
