//! 等幅テキストのページ割り付け（A4 / Courier 9pt）。

/// mm → pt 変換係数
pub const MM_TO_PT: f32 = 72.0 / 25.4;
/// Courier の1文字幅（em 比）
const COURIER_ADVANCE_EM: f32 = 0.6;

/// ページレイアウト設定（単位: mm / pt）
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub font_size_pt: f32,
    pub line_advance_mm: f32,
    /// これより長い行だけを折り返す
    pub wrap_threshold: usize,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_mm: 15.0,
            font_size_pt: 9.0,
            line_advance_mm: 4.0,
            wrap_threshold: 80,
        }
    }
}

impl PageLayout {
    pub fn content_width_mm(&self) -> f32 {
        self.page_width_mm - self.margin_mm * 2.0
    }

    /// 本文幅に収まる文字数
    pub fn chars_per_line(&self) -> usize {
        let char_width_pt = self.font_size_pt * COURIER_ADVANCE_EM;
        let width = (self.content_width_mm() * MM_TO_PT / char_width_pt).floor() as usize;
        width.max(1)
    }

    fn bottom_limit_mm(&self) -> f32 {
        self.page_height_mm - self.margin_mm
    }
}

/// 1行分の配置（y はページ上端からのベースライン位置）
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub y_mm: f32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

/// 単語単位で折り返す。1単語が幅を超える場合は強制分割する。
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in line.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if current_len > 0 {
                out.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            out.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current_len == 0 {
            word.len()
        } else {
            current_len + 1 + word.len()
        };
        if needed > width && current_len > 0 {
            out.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 || out.is_empty() {
        out.push(current);
    }
    out
}

/// Courier (WinAnsi) で描けない文字を '?' に置き換える。
/// C0/C1 制御文字は WinAnsi では別のグリフ（€ など）になるため除外する。
pub fn sanitize_latin1(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\t' => ' ',
            c if c.is_control() => '?',
            c if (c as u32) <= 0xFF => c,
            _ => '?',
        })
        .collect()
}

/// 改行で分割し、長い行を折り返してページへ割り付ける。
/// 次のベースラインが下マージンを越えるときは改ページする。
pub fn paginate(text: &str, layout: &PageLayout) -> Vec<Page> {
    let width = layout.chars_per_line();
    let mut pages = vec![Page::default()];
    let mut y = layout.margin_mm;

    let rows = text.split('\n').flat_map(|raw| {
        let line = sanitize_latin1(raw.trim_end_matches('\r'));
        if line.chars().count() > layout.wrap_threshold {
            wrap_line(&line, width)
        } else {
            vec![line]
        }
    });

    for row in rows {
        if y > layout.bottom_limit_mm() {
            pages.push(Page::default());
            y = layout.margin_mm;
        }
        if let Some(page) = pages.last_mut() {
            page.lines.push(PlacedLine { y_mm: y, text: row });
        }
        y += layout.line_advance_mm;
    }

    pages
}
