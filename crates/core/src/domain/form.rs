use super::error::AppError;
use super::types::Attachment;

/// 申告フォームの入力状態
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub name: String,
    pub contact: String,
    pub description: String,
    pub witness_name: String,
    pub witness_contact: String,
    pub show_witness: bool,
    pub evidence_files: Vec<Attachment>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 入力欄の下に表示する文字数
    pub fn description_len(&self) -> usize {
        self.description.chars().count()
    }

    /// 送信可能な説明文があるか
    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    /// クリアボタンの表示条件
    pub fn has_content(&self) -> bool {
        !self.name.is_empty() || !self.contact.is_empty() || !self.description.is_empty()
    }

    pub fn toggle_witness(&mut self) {
        self.show_witness = !self.show_witness;
    }

    /// 証拠ファイルを順序を保って追加
    pub fn add_evidence(&mut self, files: impl IntoIterator<Item = Attachment>) {
        self.evidence_files.extend(files);
    }

    pub fn remove_evidence(&mut self, index: usize) -> Result<Attachment, AppError> {
        if index >= self.evidence_files.len() {
            return Err(AppError::invalid_state(format!(
                "evidence file #{index} does not exist ({} attached)",
                self.evidence_files.len()
            )));
        }
        Ok(self.evidence_files.remove(index))
    }

    /// 書き起こし結果を説明文に結合する（空なら置き換え）
    pub fn append_transcript(&mut self, transcript: &str) -> &str {
        if self.description.is_empty() {
            self.description = transcript.to_string();
        } else {
            self.description.push('\n');
            self.description.push_str(transcript);
        }
        &self.description
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> Attachment {
        Attachment::new(name, "application/octet-stream", vec![0u8; 4])
    }

    #[test]
    fn test_append_transcript_to_empty_replaces() {
        let mut form = FormState::new();
        assert_eq!(form.append_transcript("my phone was stolen"), "my phone was stolen");
    }

    #[test]
    fn test_append_transcript_joins_with_newline() {
        let mut form = FormState {
            description: "Yesterday at the market".to_string(),
            ..Default::default()
        };
        form.append_transcript("my phone was stolen");
        assert_eq!(form.description, "Yesterday at the market\nmy phone was stolen");
    }

    #[test]
    fn test_evidence_order_and_removal() {
        let mut form = FormState::new();
        form.add_evidence([file("a.jpg"), file("b.pdf"), file("c.png")]);
        let removed = form.remove_evidence(1).unwrap();
        assert_eq!(removed.file_name, "b.pdf");
        let names: Vec<_> = form.evidence_files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, ["a.jpg", "c.png"]);
    }

    #[test]
    fn test_remove_evidence_out_of_range() {
        let mut form = FormState::new();
        form.add_evidence([file("a.jpg")]);
        assert!(form.remove_evidence(3).is_err());
        assert_eq!(form.evidence_files.len(), 1);
    }

    #[test]
    fn test_has_description_ignores_whitespace() {
        let form = FormState {
            description: "   \n ".to_string(),
            ..Default::default()
        };
        assert!(!form.has_description());
        assert!(form.has_content());
    }

    #[test]
    fn test_description_len_counts_chars() {
        let form = FormState {
            description: "దొంగతనం".to_string(),
            ..Default::default()
        };
        assert_eq!(form.description_len(), 7);
    }

    #[test]
    fn test_clear() {
        let mut form = FormState {
            name: "Ravi".to_string(),
            show_witness: true,
            ..Default::default()
        };
        form.add_evidence([file("a.jpg")]);
        form.clear();
        assert_eq!(form, FormState::default());
    }
}
