//! Label text to meshes.
//!
//! Layout model:
//! - one glyph per `char`, pen advancing by the glyph's horizontal advance
//! - `\n` starts a new line; every line is centered horizontally
//! - the whole block is centered on the local origin, y-up (font convention)
//! - no kerning, no shaping; missing characters use the face's `.notdef` glyph

use std::collections::HashMap;

use crate::font::tessellate::{Affine2x3, TessellateOptions, append_mesh, tessellate_path_to_mesh};
use crate::font::{FontError, FontQuery, FontSystem, ResolvedFace, glyph_outline};
use crate::scene::Mesh2D;

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub size_pt: f32,
    /// Tessellation tolerance in pt.
    pub tolerance: f32,
    /// Line advance as a multiple of the face's natural line height.
    pub line_height: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size_pt: 48.0,
            tolerance: 0.05,
            line_height: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextMesh {
    pub mesh: Mesh2D,
    /// Widest line advance.
    pub width_pt: f32,
    pub height_pt: f32,
}

/// Lay `text` out with `face`, centered on the origin.
pub fn layout_text(
    face: &ResolvedFace,
    text: &str,
    style: &TextStyle,
) -> Result<TextMesh, FontError> {
    if style.size_pt <= 0.0 {
        return Err(FontError::BadSize(style.size_pt));
    }
    let parsed = face.parse()?;
    let scale = face.font_units_to_pt_scale(style.size_pt);
    let vm = face.v_metrics;
    let line_advance = (vm.ascender - vm.descender + vm.line_gap) * scale * style.line_height;
    let tess = TessellateOptions {
        tolerance: style.tolerance.max(0.0005),
        ..Default::default()
    };

    // Glyph ids and pen positions per line, before centering.
    let lines: Vec<(Vec<(ttf_parser::GlyphId, f32)>, f32)> = text
        .split('\n')
        .map(|line| {
            let mut pen = 0.0f32;
            let glyphs = line
                .chars()
                .map(|ch| {
                    let gid = parsed.glyph_index(ch).unwrap_or(ttf_parser::GlyphId(0));
                    let at = pen;
                    pen += parsed.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale;
                    (gid, at)
                })
                .collect();
            (glyphs, pen)
        })
        .collect();

    let width_pt = lines.iter().map(|(_, w)| *w).fold(0.0, f32::max);
    let height_pt = line_advance * lines.len() as f32;
    let top = height_pt * 0.5;

    let mut merged = Mesh2D::default();
    for (i, (glyphs, line_width)) in lines.iter().enumerate() {
        let baseline = top - vm.ascender * scale - i as f32 * line_advance;
        let left = -line_width * 0.5;
        for &(gid, pen) in glyphs {
            let Some(outline) = glyph_outline(&parsed, gid) else {
                continue;
            };
            let xf = Affine2x3::scale_translate(scale, left + pen, baseline);
            let glyph = tessellate_path_to_mesh(&outline, xf, tess)
                .map_err(|e| FontError::Tessellation(format!("{e:?}")))?;
            append_mesh(&mut merged, &glyph);
        }
    }

    Ok(TextMesh {
        mesh: merged,
        width_pt,
        height_pt,
    })
}

/// Caches label meshes for one face.
///
/// A labeler without a face produces empty meshes, so diagrams still build (and animate)
/// on machines without fonts.
pub struct Labeler {
    face: Option<ResolvedFace>,
    tolerance: f32,
    cache: HashMap<(String, u32), Mesh2D>,
}

impl Labeler {
    pub fn new(face: ResolvedFace) -> Self {
        Self {
            face: Some(face),
            tolerance: TextStyle::default().tolerance,
            cache: HashMap::new(),
        }
    }

    /// A labeler that draws nothing.
    pub fn disabled() -> Self {
        Self {
            face: None,
            tolerance: TextStyle::default().tolerance,
            cache: HashMap::new(),
        }
    }

    /// Resolve `query` against the system fonts, or fall back to [`Labeler::disabled`].
    pub fn system(query: &FontQuery) -> Self {
        match FontSystem::new().and_then(|fonts| fonts.resolve(query)) {
            Ok(face) => Self::new(face),
            Err(e) => {
                log::warn!("font: labels disabled ({e})");
                Self::disabled()
            }
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.face.is_some()
    }

    /// Mesh for `text` at `size_pt`, centered on the origin.
    pub fn label(&mut self, text: &str, size_pt: f32) -> Mesh2D {
        let Some(face) = &self.face else {
            return Mesh2D::default();
        };
        if text.is_empty() {
            return Mesh2D::default();
        }
        let key = (text.to_string(), size_pt.to_bits());
        if let Some(mesh) = self.cache.get(&key) {
            return mesh.clone();
        }

        let style = TextStyle {
            size_pt,
            tolerance: self.tolerance,
            ..Default::default()
        };
        let mesh = match layout_text(face, text, &style) {
            Ok(t) => t.mesh,
            Err(e) => {
                log::warn!("font: failed to lay out {text:?}: {e}");
                Mesh2D::default()
            }
        };
        self.cache.insert(key, mesh.clone());
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_labeler_draws_nothing() {
        let mut labeler = Labeler::disabled();
        assert!(!labeler.is_enabled());
        assert!(labeler.label("\"a\"", 48.0).is_empty());
    }
}
