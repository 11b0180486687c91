use std::path::PathBuf;

use super::ExportError;
use crate::domain::types::FirResult;

/// 印刷用ドキュメント（FIR本文のみを含む HTML）
#[derive(Debug, Clone, PartialEq)]
pub struct PrintDocument {
    pub fir_id: String,
    pub title: String,
    pub html: String,
}

impl PrintDocument {
    pub fn for_result(result: &FirResult) -> Self {
        let title = format!("FIR - {}", result.id);
        let html = format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
             <style>body {{ font-family: monospace; white-space: pre-wrap; padding: 20px; }}</style>\n\
             </head>\n<body>{}</body>\n</html>\n",
            escape_html(&title),
            escape_html(&result.generated_text)
        );
        Self {
            fir_id: result.id.clone(),
            title,
            html,
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// 印刷面の受け取り先 trait
pub trait PrintTarget: Send + Sync {
    /// ドキュメントを開き、その場所を返す
    fn present(&self, document: &PrintDocument) -> Result<PathBuf, ExportError>;
    fn name(&self) -> &str;
}

/// HTML ファイルとして書き出し、OS のブラウザ / 印刷ダイアログに任せる
pub struct HtmlFilePrinter {
    dir: PathBuf,
}

impl HtmlFilePrinter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PrintTarget for HtmlFilePrinter {
    fn present(&self, document: &PrintDocument) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(&self.dir)?;
        let file_name: String = format!("FIR_{}_print.html", document.fir_id)
            .chars()
            .map(|c| if c.is_whitespace() || matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        let path = self.dir.join(file_name);
        std::fs::write(&path, &document.html)?;
        log::info!("Print document written: {}", path.display());
        Ok(path)
    }

    fn name(&self) -> &str {
        "html-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::tests::sample_result;

    #[test]
    fn test_print_document_contains_only_escaped_text() {
        let mut result = sample_result("FIR001");
        result.generated_text = "Accused <unknown> & others".into();
        let doc = PrintDocument::for_result(&result);

        assert_eq!(doc.title, "FIR - FIR001");
        assert!(doc.html.contains("<title>FIR - FIR001</title>"));
        assert!(doc.html.contains("<body>Accused &lt;unknown&gt; &amp; others</body>"));
        assert!(doc.html.contains("white-space: pre-wrap"));
        assert!(!doc.html.contains("Ravi Kumar"));
    }

    #[test]
    fn test_html_file_printer_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let printer = HtmlFilePrinter::new(dir.path());
        let doc = PrintDocument::for_result(&sample_result("FIR001"));

        let path = printer.present(&doc).unwrap();
        assert_eq!(path.file_name().unwrap(), "FIR_FIR001_print.html");
        assert_eq!(std::fs::read_to_string(path).unwrap(), doc.html);
    }
}
