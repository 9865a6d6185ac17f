//! Font discovery and glyph outlines.
//!
//! Labels are drawn as **vector glyph outlines**:
//! - discover system fonts with `fontdb`
//! - resolve a family/weight/style query to one face
//! - extract glyph outlines with `ttf-parser` as `lyon::path::Path`
//! - tessellate them (see [`tessellate`]) and merge per label (see [`text`])

pub mod tessellate;
pub mod text;

use std::{fs, path::Path as FsPath, sync::Arc};

use fontdb::{Database, Family, ID, Query, Source, Style, Weight};
use lyon::math::point;
use lyon::path::Path;

pub use text::{Labeler, TextMesh, TextStyle, layout_text};

/// A face selected from the font database.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontFaceId(pub ID);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontQuery {
    /// Preferred family names, in priority order. `serif`, `sans-serif` and `monospace`
    /// map to the generic families.
    pub families: Vec<String>,
    /// CSS-style weight (400 regular, 700 bold).
    pub weight: u16,
    pub italic: bool,
}

impl Default for FontQuery {
    fn default() -> Self {
        Self {
            families: vec![
                "JetBrains Mono".to_string(),
                "DejaVu Sans Mono".to_string(),
                "monospace".to_string(),
                "sans-serif".to_string(),
            ],
            weight: 400,
            italic: false,
        }
    }
}

/// Vertical metrics in font units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FontVMetrics {
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    pub line_gap: f32,
}

/// A resolved face and the bytes of the file backing it.
#[derive(Debug, Clone)]
pub struct ResolvedFace {
    pub face_id: FontFaceId,
    pub bytes: Arc<[u8]>,
    pub index: u32,
    pub v_metrics: FontVMetrics,
}

impl ResolvedFace {
    /// Scale from font units to pt at `font_size_pt`.
    #[inline]
    pub fn font_units_to_pt_scale(&self, font_size_pt: f32) -> f32 {
        font_size_pt / self.v_metrics.units_per_em
    }

    pub fn parse(&self) -> Result<ttf_parser::Face<'_>, FontError> {
        ttf_parser::Face::parse(&self.bytes, self.index).map_err(|_| FontError::ParseFailed)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FontError {
    #[error("no fonts found on this system")]
    NoFontsAvailable,

    #[error("failed to resolve a font face for query: {0:?}")]
    ResolveFailed(FontQuery),

    #[error("font face has no file-backed source")]
    NonFileBackedSource,

    #[error("failed to read font file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font face")]
    ParseFailed,

    #[error("font size must be > 0 (got {0})")]
    BadSize(f32),

    #[error("glyph tessellation failed: {0}")]
    Tessellation(String),
}

/// Owns the font database.
pub struct FontSystem {
    db: Database,
}

impl FontSystem {
    /// Load system fonts. Fails if none are installed.
    pub fn new() -> Result<Self, FontError> {
        let mut db = Database::new();
        db.load_system_fonts();
        if db.faces().next().is_none() {
            return Err(FontError::NoFontsAvailable);
        }
        log::debug!("font: {} system faces", db.faces().count());
        Ok(Self { db })
    }

    /// Resolve `query` to a face.
    ///
    /// Tries the listed families, then any serif face, then the first face in the
    /// database.
    pub fn resolve(&self, query: &FontQuery) -> Result<ResolvedFace, FontError> {
        let style = if query.italic {
            Style::Italic
        } else {
            Style::Normal
        };
        let weight = Weight(query.weight.clamp(1, 1000));

        let mut families: Vec<Family<'_>> = Vec::new();
        for f in &query.families {
            let s = f.trim();
            if s.eq_ignore_ascii_case("serif") {
                families.push(Family::Serif);
            } else if s.eq_ignore_ascii_case("sans-serif") || s.eq_ignore_ascii_case("sans") {
                families.push(Family::SansSerif);
            } else if s.eq_ignore_ascii_case("monospace") || s.eq_ignore_ascii_case("mono") {
                families.push(Family::Monospace);
            } else if !s.is_empty() {
                families.push(Family::Name(s));
            }
        }

        let query_with = |families: &[Family<'_>]| {
            self.db.query(&Query {
                families,
                weight,
                style,
                stretch: fontdb::Stretch::Normal,
            })
        };
        let id = query_with(&families)
            .or_else(|| query_with(&[Family::Serif]))
            .or_else(|| self.db.faces().next().map(|f| f.id))
            .ok_or(FontError::NoFontsAvailable)?;

        let face = self
            .db
            .face(id)
            .ok_or_else(|| FontError::ResolveFailed(query.clone()))?;
        let (path, index) = match &face.source {
            Source::File(p) => (p.to_path_buf(), face.index),
            _ => return Err(FontError::NonFileBackedSource),
        };
        log::debug!("font: resolved {:?} to {}", query.families, path.display());

        let bytes = read_font_bytes(&path)?;
        let parsed = ttf_parser::Face::parse(&bytes, index).map_err(|_| FontError::ParseFailed)?;

        // OS/2 typographic metrics first, hhea otherwise.
        let v_metrics = FontVMetrics {
            units_per_em: parsed.units_per_em() as f32,
            ascender: parsed
                .typographic_ascender()
                .unwrap_or_else(|| parsed.ascender()) as f32,
            descender: parsed
                .typographic_descender()
                .unwrap_or_else(|| parsed.descender()) as f32,
            line_gap: parsed
                .typographic_line_gap()
                .unwrap_or_else(|| parsed.line_gap()) as f32,
        };

        Ok(ResolvedFace {
            face_id: FontFaceId(id),
            bytes,
            index,
            v_metrics,
        })
    }
}

fn read_font_bytes(path: &FsPath) -> Result<Arc<[u8]>, FontError> {
    let data = fs::read(path).map_err(|source| FontError::ReadFailed {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Arc::<[u8]>::from(data))
}

/// Outline of `glyph` in font units, or `None` for glyphs without contours (spaces).
pub fn glyph_outline(face: &ttf_parser::Face<'_>, glyph: ttf_parser::GlyphId) -> Option<Path> {
    let mut builder = LyonOutlineBuilder::new();
    face.outline_glyph(glyph, &mut builder)?;
    Some(builder.build())
}

/// `ttf-parser` outline callbacks into a `lyon` path. A glyph may hold several contours.
struct LyonOutlineBuilder {
    builder: lyon::path::Builder,
    contour_open: bool,
}

impl LyonOutlineBuilder {
    fn new() -> Self {
        Self {
            builder: Path::builder(),
            contour_open: false,
        }
    }

    fn build(mut self) -> Path {
        if self.contour_open {
            self.builder.close();
        }
        self.builder.build()
    }
}

impl ttf_parser::OutlineBuilder for LyonOutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        if self.contour_open {
            self.builder.close();
        }
        self.builder.begin(point(x, y));
        self.contour_open = true;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(point(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quadratic_bezier_to(point(x1, y1), point(x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder
            .cubic_bezier_to(point(x1, y1), point(x2, y2), point(x, y));
    }

    fn close(&mut self) {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
    }
}
