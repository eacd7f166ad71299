//! Pagination of long markdown for Telegram.
//!
//! Telegram rejects messages longer than [`MESSAGE_LENGTH_LIMIT`] UTF-16
//! code units. [`Paginator`] splits raw markdown on line boundaries into
//! pages that stay under a soft budget once converted to MarkdownV2, and
//! converts every page independently.
//!
//! Lines longer than the budget are cut where they still fit and marked
//! with `...` on both sides of the cut. Code fences left open at the end of
//! a page are closed there and reopened on the next page, so every page is
//! valid on its own.
//!
//! # Example
//!
//! ```
//! use tgmark_paginate::Paginator;
//!
//! let text = "line\n".repeat(2000);
//! let pages = Paginator::new().paginate(&text);
//! assert!(pages.len() > 1);
//! assert!(pages[0].starts_with("📃 PAGE 1 / "));
//! ```

use tgmark_renderer::Converter;

/// Maximum message length accepted by Telegram, in UTF-16 code units.
pub const MESSAGE_LENGTH_LIMIT: usize = 4096;

/// Default soft budget of a page.
pub const DEFAULT_PAGE_SIZE: usize = MESSAGE_LENGTH_LIMIT * 9 / 10;

/// Largest accepted soft budget, strictly below the hard limit.
pub const MAX_PAGE_SIZE: usize = MESSAGE_LENGTH_LIMIT - 1;

/// Page count whose banner is reserved while pages are being built.
const MAX_BANNER_PAGES: usize = 99_999;

/// Marker placed on both sides of a cut inside a line.
const CONTINUATION: &str = "...";

/// Longest language tag accepted on an opening fence line.
const MAX_FENCE_INFO: usize = 20;

/// Length of `text` as counted by Telegram.
#[must_use]
pub fn display_len(text: &str) -> usize {
    text.encode_utf16().count()
}

fn banner(page: usize, total: usize) -> String {
    format!("📃 PAGE {page} / {total}:\n\n")
}

/// Options of [`paginate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaginateOptions {
    /// Soft page budget; `None` or `Some(0)` selects [`DEFAULT_PAGE_SIZE`].
    pub size: Option<usize>,
    /// Do not prefix pages with a page-number banner.
    pub no_page_num: bool,
}

/// Split `message` into converted pages using the default converter.
#[must_use]
pub fn paginate(message: &str, options: PaginateOptions) -> Vec<String> {
    Paginator::new()
        .with_size(options.size.unwrap_or_default())
        .with_page_numbers(!options.no_page_num)
        .paginate(message)
}

/// Splits markdown into pages of converted MarkdownV2.
#[derive(Clone, Debug)]
pub struct Paginator {
    converter: Converter,
    size: usize,
    page_numbers: bool,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new()
    }
}

impl Paginator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            converter: Converter::new(),
            size: DEFAULT_PAGE_SIZE,
            page_numbers: true,
        }
    }

    /// Converter used both to measure pages and to render them.
    #[must_use]
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    /// Set the soft page budget.
    ///
    /// The budget covers the whole converted page, including the banner,
    /// continuation markers and fence lines. Zero selects
    /// [`DEFAULT_PAGE_SIZE`]; values above [`MAX_PAGE_SIZE`] are capped.
    #[must_use]
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = if size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            size.min(MAX_PAGE_SIZE)
        };
        self
    }

    /// Prefix pages with `📃 PAGE i / N:` when there is more than one.
    #[must_use]
    pub fn with_page_numbers(mut self, enabled: bool) -> Self {
        self.page_numbers = enabled;
        self
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Split `message` into pages and convert each page.
    ///
    /// Always returns at least one page; empty input gives one empty page.
    #[must_use]
    pub fn paginate(&self, message: &str) -> Vec<String> {
        let mut builder = PageBuilder::new(self);
        let mut rest = message;

        while !rest.is_empty() {
            let line_end = rest.find('\n').map_or(rest.len(), |index| index + 1);
            let line = &rest[..line_end];

            if builder.measure(line, false) <= self.size {
                builder.push_line(line);
                rest = &rest[line_end..];
                continue;
            }
            if builder.has_content() {
                builder.submit();
                continue;
            }

            let content = line.strip_suffix('\n').unwrap_or(line);
            let taken = builder.fit(content);
            let consumed = if taken == content.len() {
                line_end
            } else {
                builder.continuation = true;
                taken
            };
            builder.push_line(&content[..taken]);
            if builder.continuation {
                builder.submit();
            }
            rest = &rest[consumed..];
        }
        builder.submit();

        let pages = builder.finish();
        tracing::debug!(pages = pages.len(), size = self.size, "Paginated message");
        pages
    }
}

/// An open code fence.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Fence {
    /// Opening line, reused to reopen the fence on the next page.
    line: String,
    /// Length of the backtick run.
    run: usize,
}

impl Fence {
    /// Parse an opening fence line: three or more backticks and a short tag.
    fn open(line: &str) -> Option<Self> {
        let run = line.chars().take_while(|&c| c == '`').count();
        let info = &line[run..];
        (run >= 3 && !info.contains('`') && info.chars().count() <= MAX_FENCE_INFO).then(|| {
            Self {
                line: line.to_owned(),
                run,
            }
        })
    }

    fn is_closed_by(&self, line: &str) -> bool {
        line.len() >= self.run && line.chars().all(|c| c == '`')
    }

    fn closing(&self) -> String {
        "`".repeat(self.run)
    }
}

/// Page assembly state of one pagination.
struct PageBuilder<'a> {
    paginator: &'a Paginator,
    pages: Vec<String>,
    lines: Vec<String>,
    prefix: String,
    fence: Option<Fence>,
    continuation: bool,
    banner_reserve: usize,
}

impl<'a> PageBuilder<'a> {
    fn new(paginator: &'a Paginator) -> Self {
        Self {
            paginator,
            pages: Vec::new(),
            lines: Vec::new(),
            prefix: String::new(),
            fence: None,
            continuation: false,
            banner_reserve: if paginator.page_numbers {
                display_len(&banner(MAX_BANNER_PAGES, MAX_BANNER_PAGES))
            } else {
                0
            },
        }
    }

    /// Length of the finished page if `candidate` were its last line.
    ///
    /// Counts the larger of the raw and the converted length, since escaping
    /// can grow the text and conversion can shrink it. The page is measured
    /// with its decorations: the continuation marker when `cut` is set, the
    /// closing fence and room for the banner.
    fn measure(&self, candidate: &str, cut: bool) -> usize {
        let candidate = candidate.trim_end();
        let mut text = self.prefix.clone();
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(candidate);
        if cut {
            text.push_str(CONTINUATION);
        }
        if let Some(closing) = self.closing_after(candidate) {
            text.push('\n');
            text.push_str(&closing);
        }
        let len = display_len(&text).max(display_len(&self.paginator.converter.convert(&text)));
        len + self.banner_reserve
    }

    /// Closing fence the page needs once `line` is pushed.
    fn closing_after(&self, line: &str) -> Option<String> {
        match &self.fence {
            Some(fence) if fence.is_closed_by(line) => None,
            Some(fence) => Some(fence.closing()),
            None => Fence::open(line).map(|fence| fence.closing()),
        }
    }

    /// Whether the page holds more than blank lines and the opener of the
    /// current fence.
    fn has_content(&self) -> bool {
        let opener = self.fence.as_ref().map(|fence| fence.line.as_str());
        self.lines
            .iter()
            .any(|line| !line.is_empty() && Some(line.as_str()) != opener)
    }

    /// Byte length of the longest prefix of `content` that fits the budget.
    ///
    /// Takes at least one character so that pagination always advances.
    fn fit(&self, content: &str) -> usize {
        let offsets: Vec<usize> = content
            .char_indices()
            .map(|(index, _)| index)
            .skip(1)
            .chain(std::iter::once(content.len()))
            .collect();
        let mut low = 1;
        let mut high = offsets.len().min(self.paginator.size).max(1);
        while low < high {
            let mid = (low + high).div_ceil(2);
            if self.measure(&content[..offsets[mid - 1]], true) <= self.paginator.size {
                low = mid;
            } else {
                high = mid - 1;
            }
        }
        let taken = offsets.get(low - 1).copied().unwrap_or(content.len());
        tracing::trace!(chars = low, bytes = taken, "Cut oversized line");
        taken
    }

    fn push_line(&mut self, line: &str) {
        let line = line.trim_end();
        match &self.fence {
            Some(fence) if fence.is_closed_by(line) => self.fence = None,
            Some(_) => {}
            None => self.fence = Fence::open(line),
        }
        self.lines.push(line.to_owned());
    }

    fn submit(&mut self) {
        let joined = self.lines.join("\n");
        let content = joined.trim();
        if !content.is_empty() {
            let mut page = std::mem::take(&mut self.prefix);
            page.push_str(content);
            if self.continuation {
                page.push_str(CONTINUATION);
            }
            if let Some(fence) = &self.fence {
                page.push('\n');
                page.push_str(&fence.closing());
            }
            tracing::trace!(page = self.pages.len() + 1, len = display_len(&page), "Submitted page");
            self.pages.push(page);
        }

        self.lines.clear();
        self.prefix.clear();
        if let Some(fence) = &self.fence {
            self.prefix.push_str(&fence.line);
            self.prefix.push('\n');
        }
        if std::mem::take(&mut self.continuation) {
            self.prefix.push_str(CONTINUATION);
        }
    }

    fn finish(self) -> Vec<String> {
        let converter = &self.paginator.converter;
        if self.pages.is_empty() {
            return vec![converter.convert("")];
        }

        let total = self.pages.len();
        let numbered = total > 1 && self.paginator.page_numbers;
        self.pages
            .iter()
            .enumerate()
            .map(|(index, page)| {
                if numbered {
                    converter.convert(&format!("{}{page}", banner(index + 1, total)))
                } else {
                    converter.convert(page)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_text_is_one_page() {
        let pages = paginate("Short text!", PaginateOptions::default());
        assert_eq!(pages, vec![r"Short text\!".to_owned()]);
    }

    #[test]
    fn test_empty_input_is_one_empty_page() {
        assert_eq!(paginate("", PaginateOptions::default()), vec![String::new()]);
    }

    #[test]
    fn test_long_line_is_split_under_limit() {
        let text = "a".repeat(MESSAGE_LENGTH_LIMIT + 100);
        let pages = paginate(&text, PaginateOptions::default());
        assert!(pages.len() > 1);
        for page in &pages {
            assert!(display_len(page) <= MESSAGE_LENGTH_LIMIT);
        }
        assert!(pages[0].starts_with("📃 PAGE 1 / 2:\n\n"));
        assert!(pages[0].ends_with(r"\.\.\."));
        assert!(pages[1].starts_with("📃 PAGE 2 / 2:\n\n\\.\\.\\.a"));
    }

    #[test]
    fn test_exact_limit() {
        let text = "a".repeat(MESSAGE_LENGTH_LIMIT);
        let pages = paginate(&text, PaginateOptions::default());
        assert!(!pages.is_empty());
        for page in &pages {
            assert!(display_len(page) <= MESSAGE_LENGTH_LIMIT);
        }
    }

    #[test]
    fn test_lines_are_preserved_in_order() {
        let text = (1..=30)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let pages = Paginator::new()
            .with_size(40)
            .with_page_numbers(false)
            .paginate(&text);
        assert!(pages.len() > 1);
        for page in &pages {
            assert!(display_len(page) <= 40);
        }
        assert_eq!(pages.join("\n"), text);
    }

    #[test]
    fn test_no_banner_when_disabled() {
        let text = "word ".repeat(2000);
        let pages = paginate(
            &text,
            PaginateOptions {
                size: None,
                no_page_num: true,
            },
        );
        assert!(pages.len() > 1);
        assert!(pages.iter().all(|page| !page.starts_with("📃")));
    }

    #[test]
    fn test_code_fence_is_reopened() {
        let body = "let x = 1;\n".repeat(50);
        let text = format!("```rust\n{body}```\n\nafter");
        let pages = Paginator::new()
            .with_size(200)
            .with_page_numbers(false)
            .paginate(&text);
        assert!(pages.len() > 1);
        for page in &pages {
            let fences = page.lines().filter(|line| line.starts_with("```")).count();
            assert_eq!(fences % 2, 0, "unbalanced fences in {page:?}");
            assert!(display_len(page) <= MESSAGE_LENGTH_LIMIT);
        }
        assert!(pages[1].starts_with("```rust\n"));
    }

    #[test]
    fn test_size_zero_selects_default() {
        assert_eq!(Paginator::new().with_size(0).size(), DEFAULT_PAGE_SIZE);
        assert_eq!(Paginator::new().with_size(10_000).size(), MAX_PAGE_SIZE);
        assert_eq!(
            Paginator::new().with_size(MESSAGE_LENGTH_LIMIT).size(),
            MAX_PAGE_SIZE
        );
    }

    #[test]
    fn test_largest_size_stays_under_message_limit() {
        let paginator = Paginator::new().with_size(MESSAGE_LENGTH_LIMIT);
        let texts = [
            "a".repeat(10_000),
            format!("```\n{}\n```", "a".repeat(10_000)),
            "a.b (c)\n".repeat(2000),
        ];
        for text in &texts {
            let pages = paginator.paginate(text);
            assert!(pages.len() > 1);
            for page in &pages {
                assert!(
                    display_len(page) <= MESSAGE_LENGTH_LIMIT,
                    "page of {} units",
                    display_len(page)
                );
            }
        }
    }

    #[test]
    fn test_banner_counts_against_size() {
        let pages = Paginator::new().with_size(100).paginate(&"word\n".repeat(200));
        assert!(pages.len() > 1);
        assert!(pages[0].starts_with("📃 PAGE 1 / "));
        for page in &pages {
            assert!(display_len(page) <= 100, "{page:?}");
        }
    }

    #[test]
    fn test_fenced_document_keeps_every_line() {
        let mut text = String::from("Intro paragraph.\n\n```rust\n");
        for i in 0..40 {
            text.push_str(&format!("let value_{i} = {i};\n"));
        }
        text.push_str("```\n\nOutro (done)!");

        let content_lines = |page: &str| -> Vec<String> {
            page.lines()
                .filter(|line| !line.is_empty() && !line.starts_with("```"))
                .map(str::to_owned)
                .collect()
        };
        let pages = Paginator::new()
            .with_size(120)
            .with_page_numbers(false)
            .paginate(&text);
        assert!(pages.len() > 2);

        let whole = content_lines(&Converter::new().convert(&text));
        let paged: Vec<String> = pages.iter().flat_map(|page| content_lines(page)).collect();
        assert_eq!(paged, whole);
    }

    #[test]
    fn test_oversized_line_after_fence_opener() {
        let text = format!("```rust\n{}\n```", "x".repeat(300));
        let pages = Paginator::new()
            .with_size(100)
            .with_page_numbers(false)
            .paginate(&text);
        assert!(pages.len() > 1);
        assert!(pages[0].starts_with("```rust\nx"), "{:?}", pages[0]);
        for page in &pages {
            assert!(!page.contains("```rust\n\n```"), "empty code page {page:?}");
            assert!(display_len(page) <= 100);
        }
        let total: usize = pages.iter().map(|page| page.matches('x').count()).sum();
        assert_eq!(total, 300);
    }

    #[test]
    fn test_fence_detection() {
        let fence = Fence::open("````markdown").unwrap();
        assert_eq!(fence.run, 4);
        assert!(!fence.is_closed_by("```"));
        assert!(fence.is_closed_by("````"));
        assert!(Fence::open("```").is_some());
        assert!(Fence::open("``not").is_none());
        assert!(Fence::open("```a`b").is_none());
        assert!(Fence::open(&format!("```{}", "x".repeat(21))).is_none());
    }

    #[test]
    fn test_display_len_counts_utf16() {
        assert_eq!(display_len("abc"), 3);
        assert_eq!(display_len("📃"), 2);
    }
}
