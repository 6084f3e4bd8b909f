//! Prescription PDF export.
//!
//! Export runs in two stages. `layout_prescription` turns a snapshot
//! into a `PrescriptionLayout`: a pure plan of every text placement in
//! top-relative millimetres, mirroring the fixed single-page layout of
//! the printed pad. `render_prescription` replays that plan through
//! `printpdf` and returns the document bytes. Splitting the stages
//! keeps the deterministic part testable without parsing PDF output.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::image_crate::{self, DynamicImage, GenericImageView};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, Line, Mm, PdfDocument, Point, Rgb,
};
use thiserror::Error;

use crate::models::{FoodInstruction, MedicineEntry, PrescriptionSnapshot, Timing};

// ─── Page geometry ────────────────────────────────────────────────────────────
// A4, all offsets in millimetres measured from the top-left corner (the
// pad was laid out top-down; PDF user space is flipped at render time).

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;

const MARGIN_LEFT_MM: f64 = 10.0;

const BANNER_Y_MM: f64 = 10.0;
const BANNER_WIDTH_MM: f64 = 190.0;
const BANNER_HEIGHT_MM: f64 = 70.0;

const RULE_Y_MM: f64 = 80.0;
const RULE_X_END_MM: f64 = 200.0;
const RULE_THICKNESS: f64 = 1.0;

const PATIENT_TITLE_Y_MM: f64 = 90.0;
const PATIENT_LINE_Y_MM: f64 = 100.0;
const MEDICINES_TITLE_Y_MM: f64 = 120.0;
const MEDICINES_BASE_Y_MM: f64 = 130.0;
const MEDICINE_LINE_STEP_MM: f64 = 8.0;

/// The Instructions text starts this far below its section title.
const INSTRUCTIONS_TEXT_OFFSET_MM: f64 = 10.0;
/// Step between newline-separated instruction lines.
const INSTRUCTION_LINE_STEP_MM: f64 = 6.0;

const TITLE_FONT_SIZE_PT: f64 = 16.0;
const BODY_FONT_SIZE_PT: f64 = 14.0;

/// Maroon, the pad's accent colour.
const ACCENT_RGB: (f64, f64, f64) = (128.0 / 255.0, 0.0, 0.0);
const BLACK_RGB: (f64, f64, f64) = (0.0, 0.0, 0.0);

/// Bitmap resolution the banner is embedded at.
const IMAGE_DPI: f64 = 300.0;

/// Largest medicine count whose Instructions block still starts on the
/// page. The layout never reflows: rows past this draw below the page
/// edge, exactly as the printed pad would run off the sheet.
pub const MAX_MEDICINES_ON_PAGE: usize = 19;

// ─── Layout plan ──────────────────────────────────────────────────────────────

/// Which of the pad's two text treatments a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// Bold, maroon, section-title size.
    Title,
    /// Regular, black, body size.
    Body,
}

/// One text run at a fixed position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub x_mm: f64,
    /// Millimetres from the top edge of the page.
    pub y_mm: f64,
    pub style: TextStyle,
}

/// Deterministic drawing plan for one prescription document.
///
/// The banner slot and the rule under it are fixed; everything that
/// varies with the snapshot is in `texts`, in drawing order.
#[derive(Debug, Clone, PartialEq)]
pub struct PrescriptionLayout {
    pub texts: Vec<PlacedText>,
}

/// Lays out one prescription. Pure: equal snapshots yield equal plans,
/// and nothing here reads the clock or any other ambient state.
pub fn layout_prescription(snapshot: &PrescriptionSnapshot) -> PrescriptionLayout {
    let mut texts = Vec::new();

    texts.push(PlacedText {
        text: "Patient Details".into(),
        x_mm: MARGIN_LEFT_MM,
        y_mm: PATIENT_TITLE_Y_MM,
        style: TextStyle::Title,
    });
    texts.push(PlacedText {
        text: format!(
            "Name: {}  |  Age: {}  |  Weight: {}",
            snapshot.patient.name, snapshot.patient.age, snapshot.patient.weight
        ),
        x_mm: MARGIN_LEFT_MM,
        y_mm: PATIENT_LINE_Y_MM,
        style: TextStyle::Body,
    });

    texts.push(PlacedText {
        text: "Medicines".into(),
        x_mm: MARGIN_LEFT_MM,
        y_mm: MEDICINES_TITLE_Y_MM,
        style: TextStyle::Title,
    });
    for (index, medicine) in snapshot.medicines.iter().enumerate() {
        texts.push(PlacedText {
            text: medicine_line(medicine),
            x_mm: MARGIN_LEFT_MM,
            y_mm: MEDICINES_BASE_Y_MM + index as f64 * MEDICINE_LINE_STEP_MM,
            style: TextStyle::Body,
        });
    }

    // The Instructions section always starts below the last medicine
    // row, however many there are (including none).
    let instructions_title_y =
        MEDICINES_BASE_Y_MM + snapshot.medicines.len() as f64 * MEDICINE_LINE_STEP_MM;
    texts.push(PlacedText {
        text: "Instructions".into(),
        x_mm: MARGIN_LEFT_MM,
        y_mm: instructions_title_y,
        style: TextStyle::Title,
    });

    // The PDF text operator has no newline semantics, so the block is
    // split on '\n' and stacked. No width wrapping.
    let mut line_y = instructions_title_y + INSTRUCTIONS_TEXT_OFFSET_MM;
    for line in snapshot.instructions.split('\n') {
        texts.push(PlacedText {
            text: line.trim_end_matches('\r').to_string(),
            x_mm: MARGIN_LEFT_MM,
            y_mm: line_y,
            style: TextStyle::Body,
        });
        line_y += INSTRUCTION_LINE_STEP_MM;
    }

    PrescriptionLayout { texts }
}

fn medicine_line(medicine: &MedicineEntry) -> String {
    let timing = medicine.timing.as_ref().map(Timing::as_str).unwrap_or("");
    let food = medicine
        .food
        .as_ref()
        .map(FoodInstruction::as_str)
        .unwrap_or("");
    format!("{}    -    {}    -    {}", medicine.name, timing, food)
}

// ─── Filename ─────────────────────────────────────────────────────────────────

/// Characters that cannot appear in a filename on at least one target
/// filesystem.
const UNSAFE_FILENAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Builds `<patient name>_prescription.pdf`, replacing filesystem-unsafe
/// characters with `-`. Spaces survive. An empty patient name yields
/// `_prescription.pdf`, which is accepted.
pub fn prescription_filename(patient_name: &str) -> String {
    let safe: String = patient_name
        .chars()
        .map(|c| {
            if UNSAFE_FILENAME_CHARS.contains(&c) || c.is_control() {
                '-'
            } else {
                c
            }
        })
        .collect();
    format!("{safe}_prescription.pdf")
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Header banner not found at {}", .path.display())]
    MissingAsset { path: PathBuf },

    #[error("Header banner at {} could not be decoded: {}", .path.display(), .reason)]
    BadAsset { path: PathBuf, reason: String },

    #[error("PDF render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Header banner ────────────────────────────────────────────────────────────

/// The fixed banner image drawn at the top of every prescription.
///
/// Loaded once at session start and held read-only for the session. A
/// missing or corrupt asset is a configuration error surfaced to the
/// caller, never a silent crash at export time.
pub struct HeaderBanner {
    image: DynamicImage,
}

impl HeaderBanner {
    /// Loads the banner from `path` (any format the bundled codec
    /// understands; the pad ships a PNG).
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        let bytes = fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExportError::MissingAsset {
                    path: path.to_path_buf(),
                }
            } else {
                ExportError::Io(e)
            }
        })?;
        let image = image_crate::load_from_memory(&bytes).map_err(|e| {
            tracing::warn!(path = %path.display(), "Header banner failed to decode: {e}");
            ExportError::BadAsset {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        tracing::debug!(path = %path.display(), "Header banner loaded");
        Ok(Self { image })
    }

    /// Wraps an already-decoded image, for embedders that bundle the
    /// banner into their binary.
    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }
}

// ─── Rendering ────────────────────────────────────────────────────────────────

/// Replays a layout through printpdf. Returns the PDF bytes.
pub fn render_prescription(
    layout: &PrescriptionLayout,
    banner: &HeaderBanner,
) -> Result<Vec<u8>, ExportError> {
    let (doc, page1, layer1) = PdfDocument::new(
        "Prescription",
        Mm(PAGE_WIDTH_MM as f32),
        Mm(PAGE_HEIGHT_MM as f32),
        "Layer 1",
    );
    let layer = doc.get_page(page1).get_layer(layer1);
    let body_font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Render(format!("PDF font error: {e}")))?;
    let title_font = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Render(format!("PDF font error: {e}")))?;

    // Banner, scaled from its pixel size into the fixed 190x70 mm slot.
    let (px_w, px_h) = banner.image.dimensions();
    let image = Image::from_dynamic_image(&banner.image);
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(MARGIN_LEFT_MM as f32)),
            translate_y: Some(from_top(BANNER_Y_MM + BANNER_HEIGHT_MM)),
            scale_x: Some((BANNER_WIDTH_MM / px_to_mm(px_w)) as f32),
            scale_y: Some((BANNER_HEIGHT_MM / px_to_mm(px_h)) as f32),
            dpi: Some(IMAGE_DPI as f32),
            ..ImageTransform::default()
        },
    );

    // Rule below the banner.
    layer.set_outline_color(rgb(ACCENT_RGB));
    layer.set_outline_thickness(RULE_THICKNESS as f32);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN_LEFT_MM as f32), from_top(RULE_Y_MM)), false),
            (Point::new(Mm(RULE_X_END_MM as f32), from_top(RULE_Y_MM)), false),
        ],
        is_closed: false,
    });

    for run in &layout.texts {
        let (font, size, color) = match run.style {
            TextStyle::Title => (&title_font, TITLE_FONT_SIZE_PT, ACCENT_RGB),
            TextStyle::Body => (&body_font, BODY_FONT_SIZE_PT, BLACK_RGB),
        };
        layer.set_fill_color(rgb(color));
        layer.use_text(&run.text, size as f32, Mm(run.x_mm as f32), from_top(run.y_mm), font);
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ExportError::Render(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ExportError::Render(format!("PDF buffer error: {e}")))
}

/// Top-relative millimetres to PDF user space (origin bottom-left).
fn from_top(y_mm: f64) -> Mm {
    Mm((PAGE_HEIGHT_MM - y_mm) as f32)
}

fn px_to_mm(px: u32) -> f64 {
    px as f64 * 25.4 / IMAGE_DPI
}

fn rgb((r, g, b): (f64, f64, f64)) -> Color {
    Color::Rgb(Rgb::new(r as f32, g as f32, b as f32, None))
}

// ─── File delivery ────────────────────────────────────────────────────────────

/// Renders `snapshot` and writes it under `dir` as
/// `<patient name>_prescription.pdf`. Returns the written path.
///
/// A failed export is terminal to this one call and leaves the form
/// state untouched; retrying is safe.
pub fn export_to_file(
    snapshot: &PrescriptionSnapshot,
    banner: &HeaderBanner,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let layout = layout_prescription(snapshot);
    let bytes = render_prescription(&layout, banner)?;

    fs::create_dir_all(dir)?;
    let path = dir.join(prescription_filename(&snapshot.patient.name));
    fs::write(&path, &bytes)?;

    tracing::info!(
        path = %path.display(),
        medicines = snapshot.medicines.len(),
        "Prescription exported"
    );
    Ok(path)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormSession;
    use crate::models::{MedicineField, PatientField, PatientRecord};

    fn test_banner() -> HeaderBanner {
        HeaderBanner::from_image(DynamicImage::new_rgb8(380, 140))
    }

    fn snapshot_with_medicines(count: usize) -> PrescriptionSnapshot {
        PrescriptionSnapshot {
            patient: PatientRecord::default(),
            medicines: vec![MedicineEntry::default(); count],
            instructions: String::new(),
        }
    }

    fn text_at(layout: &PrescriptionLayout, needle: &str) -> PlacedText {
        layout
            .texts
            .iter()
            .find(|t| t.text == needle)
            .unwrap_or_else(|| panic!("no text run {needle:?}"))
            .clone()
    }

    #[test]
    fn layout_is_deterministic() {
        let mut session = FormSession::new();
        session.set_patient_field(PatientField::Name, "Jane Doe".into());
        session.set_instructions("Drink plenty of water.".into());
        let snapshot = session.snapshot();

        assert_eq!(
            layout_prescription(&snapshot),
            layout_prescription(&snapshot)
        );
    }

    #[test]
    fn default_session_lays_out_empty_lines() {
        // Scenario: untouched form, straight to export.
        let layout = layout_prescription(&FormSession::new().snapshot());

        let patient = text_at(&layout, "Name:   |  Age:   |  Weight: ");
        assert_eq!(patient.y_mm, PATIENT_LINE_Y_MM);
        assert_eq!(patient.style, TextStyle::Body);

        // The single blank medicine row prints with empty slots.
        let medicine = text_at(&layout, "    -        -    ");
        assert_eq!(medicine.y_mm, MEDICINES_BASE_Y_MM);

        assert_eq!(
            prescription_filename(""),
            "_prescription.pdf"
        );
    }

    #[test]
    fn filled_form_lays_out_expected_lines() {
        let mut session = FormSession::new();
        session.set_patient_field(PatientField::Name, "Jane Doe".into());
        session.set_patient_field(PatientField::Age, "34".into());
        session.set_patient_field(PatientField::Weight, "60".into());
        session.set_medicine_field(0, MedicineField::Name("Paracetamol".into()));
        session.set_medicine_field(0, MedicineField::Timing(Some(Timing::Morning)));
        session.set_medicine_field(0, MedicineField::Food(Some(FoodInstruction::AfterEating)));
        session.set_instructions("Drink plenty of water.".into());

        let snapshot = session.snapshot();
        let layout = layout_prescription(&snapshot);

        text_at(&layout, "Name: Jane Doe  |  Age: 34  |  Weight: 60");
        text_at(&layout, "Paracetamol    -    Morning    -    After Eating");
        let instructions = text_at(&layout, "Drink plenty of water.");
        assert_eq!(
            instructions.y_mm,
            MEDICINES_BASE_Y_MM + MEDICINE_LINE_STEP_MM + INSTRUCTIONS_TEXT_OFFSET_MM
        );

        assert_eq!(
            prescription_filename(&snapshot.patient.name),
            "Jane Doe_prescription.pdf"
        );
    }

    #[test]
    fn medicine_rows_step_down_by_fixed_line_height() {
        let mut snapshot = snapshot_with_medicines(4);
        for (i, entry) in snapshot.medicines.iter_mut().enumerate() {
            entry.name = format!("med-{i}");
        }
        let layout = layout_prescription(&snapshot);

        for i in 0..4 {
            let run = text_at(&layout, &format!("med-{i}    -        -    "));
            assert_eq!(run.y_mm, MEDICINES_BASE_Y_MM + i as f64 * MEDICINE_LINE_STEP_MM);
        }
    }

    #[test]
    fn instructions_section_tracks_medicine_count() {
        for count in [0, 1, 5, 12] {
            let layout = layout_prescription(&snapshot_with_medicines(count));
            let title = text_at(&layout, "Instructions");
            assert_eq!(
                title.y_mm,
                MEDICINES_BASE_Y_MM + count as f64 * MEDICINE_LINE_STEP_MM
            );
            assert_eq!(title.style, TextStyle::Title);
        }
    }

    #[test]
    fn empty_medicine_list_is_tolerated() {
        // A session whose last row was removed still exports.
        let layout = layout_prescription(&snapshot_with_medicines(0));
        let title = text_at(&layout, "Instructions");
        assert_eq!(title.y_mm, MEDICINES_BASE_Y_MM);
    }

    #[test]
    fn multi_line_instructions_stack_without_wrapping() {
        let snapshot = PrescriptionSnapshot {
            instructions: "line one\nline two\r\nline three".into(),
            ..snapshot_with_medicines(1)
        };
        let layout = layout_prescription(&snapshot);

        let first = text_at(&layout, "line one");
        let second = text_at(&layout, "line two");
        let third = text_at(&layout, "line three");
        assert_eq!(second.y_mm - first.y_mm, INSTRUCTION_LINE_STEP_MM);
        assert_eq!(third.y_mm - second.y_mm, INSTRUCTION_LINE_STEP_MM);
    }

    #[test]
    fn page_capacity_matches_documented_maximum() {
        let on_page = layout_prescription(&snapshot_with_medicines(MAX_MEDICINES_ON_PAGE));
        assert!(on_page.texts.iter().all(|t| t.y_mm <= PAGE_HEIGHT_MM));

        let overflowing = layout_prescription(&snapshot_with_medicines(MAX_MEDICINES_ON_PAGE + 1));
        assert!(overflowing.texts.iter().any(|t| t.y_mm > PAGE_HEIGHT_MM));
    }

    #[test]
    fn filename_keeps_spaces_and_replaces_unsafe_characters() {
        assert_eq!(
            prescription_filename("Jane Doe"),
            "Jane Doe_prescription.pdf"
        );
        assert_eq!(
            prescription_filename("a/b\\c:d*e?f\"g<h>i|j"),
            "a-b-c-d-e-f-g-h-i-j_prescription.pdf"
        );
        assert_eq!(
            prescription_filename("tab\there"),
            "tab-here_prescription.pdf"
        );
    }

    #[test]
    fn render_produces_a_pdf_document() {
        let layout = layout_prescription(&snapshot_with_medicines(2));
        let bytes = render_prescription(&layout, &test_banner()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn missing_banner_is_a_descriptive_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-banner.png");
        let err = HeaderBanner::load(&path).err().expect("load must fail");
        assert!(err.to_string().contains("no-such-banner.png"));
        match err {
            ExportError::MissingAsset { path: reported } => assert_eq!(reported, path),
            other => panic!("expected MissingAsset, got {other:?}"),
        }
    }

    #[test]
    fn undecodable_banner_is_a_descriptive_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banner.png");
        fs::write(&path, b"not an image").unwrap();
        let err = HeaderBanner::load(&path).err().expect("load must fail");
        match err {
            ExportError::BadAsset { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected BadAsset, got {other:?}"),
        }
    }

    #[test]
    fn export_to_file_writes_named_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("exports");

        let mut session = FormSession::new();
        session.set_patient_field(PatientField::Name, "Jane Doe".into());
        let path = export_to_file(&session.snapshot(), &test_banner(), &out_dir).unwrap();

        assert_eq!(path, out_dir.join("Jane Doe_prescription.pdf"));
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn export_is_idempotent_on_retry() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = snapshot_with_medicines(1);
        let banner = test_banner();

        let first = export_to_file(&snapshot, &banner, dir.path()).unwrap();
        let second = export_to_file(&snapshot, &banner, dir.path()).unwrap();
        assert_eq!(first, second);
    }
}
