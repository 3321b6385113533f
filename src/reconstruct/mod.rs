//! Rebuilding pages around translated text.
//!
//! The reconstructor turns a (possibly translated) [`Document`](crate::model::Document)
//! into draw operations per page. Non-text content is re-emitted unchanged;
//! each block of text goes through a fitting ladder that prefers the
//! original geometry and degrades one step at a time:
//!
//! ```text
//! in place -> shrunk -> reflowed -> scaled -> grown | truncated
//! ```
//!
//! Every truncation is reported as a `LayoutOverflow` diagnostic.

mod fit;
mod fonts;
mod measure;
mod ops;
mod options;
mod reconstructor;
mod svg;

pub use fit::{is_rtl, shrink_to_fit, BlockFit, FitLevel, Fitter, Overflow, FIT_TOLERANCE};
pub use fonts::{FontClass, FontResolver};
pub use measure::{split_words, wrap, AverageWidthMeasurer, TextMeasurer, Word, WrappedLine};
pub use ops::{DrawOp, PageRenderer, RenderedPage, TextAlign};
pub use options::ReconstructOptions;
pub use reconstructor::Reconstructor;
pub use svg::SvgRenderer;
