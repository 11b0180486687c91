pub mod layout;
pub mod pdf;
pub mod print;

pub use layout::PageLayout;
pub use print::{HtmlFilePrinter, PrintDocument, PrintTarget};

use std::path::{Path, PathBuf};

use crate::domain::error::AppError;
use crate::domain::types::FirResult;

/// エクスポートエラー
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF error: {0}")]
    Pdf(String),
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        log::error!("export failed: {e}");
        AppError::export(e.to_string())
    }
}

/// `FIR_<id>_<氏名の空白連続を _ に置換>.pdf`
pub fn pdf_file_name(fir_id: &str, complainant_name: &str) -> String {
    format!(
        "FIR_{}_{}.pdf",
        file_component(fir_id),
        file_component(complainant_name)
    )
}

/// 空白の連続を1つの `_` にまとめ、パス区切り文字も `_` にする
fn file_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_space = false;
    for c in value.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        out.push(if matches!(c, '/' | '\\') { '_' } else { c });
    }
    out
}

/// FIR本文を PDF として `dir` に書き出し、そのパスを返す
pub fn export_pdf(result: &FirResult, dir: &Path, layout: &PageLayout) -> Result<PathBuf, ExportError> {
    let pages = layout::paginate(&result.generated_text, layout);
    let bytes = pdf::render_pdf(&pages, layout)?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(pdf_file_name(&result.id, &result.complainant_name));
    std::fs::write(&path, &bytes)?;

    log::info!(
        "Exported FIR {} to {} ({} pages, {} bytes)",
        result.id,
        path.display(),
        pages.len(),
        bytes.len()
    );
    Ok(path)
}
