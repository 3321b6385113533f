//! SVG output for reconstructed pages.

use std::fmt::Write;

use super::ops::{DrawOp, PageRenderer, RenderedPage, TextAlign};
use crate::error::Result;

/// Renders a page as a standalone SVG document.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    /// Draw image placements as outlined boxes
    pub show_images: bool,
    /// Draw vector paths as outlined boxes
    pub show_paths: bool,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            show_images: true,
            show_paths: true,
        }
    }
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageRenderer for SvgRenderer {
    type Output = String;

    fn render(&self, page: &RenderedPage) -> Result<String> {
        let mut svg = String::with_capacity(256 + page.ops.len() * 96);
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = page.width,
            h = page.height
        )?;

        for op in &page.ops {
            match op {
                DrawOp::PlaceImage { bbox } if self.show_images => writeln!(
                    svg,
                    r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#eeeeee" stroke="#999999"/>"##,
                    bbox.x0,
                    bbox.y0,
                    bbox.width(),
                    bbox.height()
                )?,
                DrawOp::DrawPath { bbox } if self.show_paths => writeln!(
                    svg,
                    r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#000000"/>"##,
                    bbox.x0,
                    bbox.y0,
                    bbox.width(),
                    bbox.height()
                )?,
                DrawOp::FillRect { bbox, color } => writeln!(
                    svg,
                    r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#{:06x}"/>"##,
                    bbox.x0,
                    bbox.y0,
                    bbox.width(),
                    bbox.height(),
                    color & 0xFF_FFFF
                )?,
                DrawOp::PlaceText {
                    text,
                    x,
                    baseline,
                    width,
                    font,
                    size,
                    color,
                    align,
                    ..
                } => {
                    let (x, anchor) = match align {
                        TextAlign::Left => (*x, "start"),
                        TextAlign::Right => (x + width, "end"),
                    };
                    writeln!(
                        svg,
                        r##"<text x="{}" y="{}" font-family="{}" font-size="{}" fill="#{:06x}" text-anchor="{}" xml:space="preserve">{}</text>"##,
                        x,
                        baseline,
                        escape(font),
                        size,
                        color & 0xFF_FFFF,
                        anchor,
                        escape(text)
                    )?;
                }
                _ => {}
            }
        }

        svg.push_str("</svg>\n");
        Ok(svg)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}
