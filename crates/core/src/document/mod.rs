//! Case summary documents.
//!
//! [`Document`] is a renderer-agnostic list of styled blocks built from case
//! details or a redesign's comment thread. A [`DocumentRenderer`] writes it to
//! disk; [`PdfRenderer`] is the production implementation.

mod error;
mod layout;
mod pdf;
mod traits;

pub use error::DocumentError;
pub use layout::{convert_key, Block, Document, TextColor};
pub use pdf::PdfRenderer;
pub use traits::DocumentRenderer;

/// File name of the case details document inside the case's import folder.
pub const CASE_DETAILS_FILE: &str = "CaseDetails.pdf";

/// File name of the comment thread document inside a redesign folder.
pub const COMMENTS_FILE: &str = "Comments.pdf";
