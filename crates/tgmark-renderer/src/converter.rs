//! Markdown to Telegram MarkdownV2 conversion.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use pulldown_cmark::Options;
use regex::Regex;

use crate::ast::Document;
use crate::error::OptionError;
use crate::policy::UnsupportedTagsStrategy;
use crate::renderer::Renderer;

/// Block separators left behind by the renderer.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<!---->\n").unwrap());

/// How tables are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum TableMode {
    /// Numbered list of records, one per data row.
    #[default]
    List,
    /// Native pipe table, handled by the unsupported-element policy.
    Unsupported,
}

impl TableMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for TableMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableMode {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => Ok(Self::List),
            "unsupported" => Ok(Self::Unsupported),
            _ => Err(OptionError::TableMode(s.to_owned())),
        }
    }
}

/// Options of a single conversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Strategy for blockquotes, raw HTML, thematic breaks and unsupported
    /// tables.
    pub unsupported_tags: UnsupportedTagsStrategy,
    /// Table rendering mode.
    pub table: TableMode,
}

/// Markdown to MarkdownV2 converter.
///
/// # Example
///
/// ```
/// use tgmark_renderer::{Converter, UnsupportedTagsStrategy};
///
/// let converter = Converter::new().with_unsupported_tags(UnsupportedTagsStrategy::Remove);
/// assert_eq!(converter.convert("**Hello** world!\n\n> quoted"), r"*Hello* world\!");
/// ```
#[derive(Clone, Debug)]
pub struct Converter {
    options: ConvertOptions,
    gfm: bool,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    /// Create a converter with default options and GFM extensions enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: ConvertOptions::default(),
            gfm: true,
        }
    }

    #[must_use]
    pub fn with_unsupported_tags(mut self, strategy: UnsupportedTagsStrategy) -> Self {
        self.options.unsupported_tags = strategy;
        self
    }

    #[must_use]
    pub fn with_table_mode(mut self, mode: TableMode) -> Self {
        self.options.table = mode;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable or disable GFM tables, strikethrough and task lists.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    #[must_use]
    pub fn options(&self) -> ConvertOptions {
        self.options
    }

    fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
        } else {
            Options::empty()
        }
    }

    /// Convert markdown to MarkdownV2.
    ///
    /// The result has no trailing whitespace and no leading blank lines.
    #[must_use]
    pub fn convert(&self, markdown: &str) -> String {
        let mut document = Document::parse(markdown, self.parser_options());
        document.strip_comments();
        tracing::trace!(
            blocks = document.children.len(),
            definitions = document.definitions.len(),
            "Parsed markdown"
        );

        let rendered = Renderer::new(&document.definitions, self.options).render(&document.children);
        let output = PLACEHOLDER.replace_all(&rendered, "");
        let output = output.trim_end().trim_start_matches('\n').to_owned();

        tracing::debug!(
            input_len = markdown.len(),
            output_len = output.len(),
            unsupported_tags = %self.options.unsupported_tags,
            table = %self.options.table,
            "Converted markdown"
        );
        output
    }
}

/// Convert markdown to Telegram MarkdownV2 with the given options.
#[must_use]
pub fn convert(markdown: &str, options: ConvertOptions) -> String {
    Converter::new().with_options(options).convert(markdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn md(markdown: &str) -> String {
        Converter::new().convert(markdown)
    }

    fn md_with(markdown: &str, strategy: UnsupportedTagsStrategy, table: TableMode) -> String {
        Converter::new()
            .with_unsupported_tags(strategy)
            .with_table_mode(table)
            .convert(markdown)
    }

    #[test]
    fn test_text() {
        assert_eq!(md("Hello world!"), r"Hello world\!");
        assert_eq!(
            md("Simple t`ext 2 + 2 * (32 / 32) = 4"),
            r"Simple t\`ext 2 \+ 2 \* \(32 / 32\) \= 4"
        );
    }

    #[test]
    fn test_headings() {
        assert_eq!(
            md("# heading 1\n## heading 2\n### heading 3"),
            "*heading 1*\n\n*heading 2*\n\n*heading 3*"
        );
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(md("**bold text**"), "*bold text*");
        assert_eq!(md("he**l**lo"), "he*l*lo");
        assert_eq!(md("*italic text*"), "_italic text_");
        assert_eq!(md("***bold+italic***"), r"_*bold\+italic*_");
        assert_eq!(md("~~strike text~~"), "~strike text~");
    }

    #[test]
    fn test_strikethrough_requires_gfm() {
        assert_eq!(
            Converter::new().with_gfm(false).convert("~~strike~~"),
            r"\~\~strike\~\~"
        );
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            md("* list\n* list\n* list"),
            "•   list\n•   list\n•   list"
        );
        assert_eq!(
            md("1. list\n2. list\n3. list"),
            "1\\.  list\n2\\.  list\n3\\.  list"
        );
    }

    #[test]
    fn test_task_list() {
        assert_eq!(
            md("- [x] done\n- [ ] todo"),
            "•   \\[x\\] done\n•   \\[ \\] todo"
        );
    }

    #[test]
    fn test_bold_text_in_lists() {
        assert_eq!(
            md("- To make text **bold**, surround it with double asterisks (`**`): `**This text is bold.**`"),
            "•   To make text *bold*, surround it with double asterisks \\(`**`\\): `**This text is bold.**`"
        );
    }

    #[test]
    fn test_links() {
        assert_eq!(
            md(r#"[](http://atlassian.com "Atlas+sian")"#),
            r"[Atlas\+sian](http://atlassian.com)"
        );
        assert_eq!(
            md("[t.e.s+t](http://atlassian.com)"),
            r"[t\.e\.s\+t](http://atlassian.com)"
        );
        assert_eq!(
            md(r#"[test](http://atlassian.com "Atlassian")"#),
            "[test](http://atlassian.com)"
        );
        assert_eq!(
            md("[](http://atlassian.com)"),
            r"[http://atlassian\.com](http://atlassian.com)"
        );
        assert_eq!(md("[test](/atlassian)"), "test");
        assert_eq!(
            md("[Atlassian](http://atlas()sian.com)"),
            r"[Atlassian](http://atlas\(\)sian.com)"
        );
    }

    #[test]
    fn test_link_is_percent_encoded() {
        assert_eq!(
            md("[wiki](https://ru.wikipedia.org/wiki/Тест)"),
            "[wiki](https://ru.wikipedia.org/wiki/%D0%A2%D0%B5%D1%81%D1%82)"
        );
    }

    #[test]
    fn test_reference_links() {
        assert_eq!(
            md("[Atlassian]\n\n[atlassian]: http://atlassian.com"),
            "[Atlassian](http://atlassian.com)"
        );
        assert_eq!(
            md("[Atlassian][test]\n\n[test]: http://atlassian.com"),
            "[Atlassian](http://atlassian.com)"
        );
        assert_eq!(
            md("[Atlassian]\n\n[atlassian]: http://atlassian.com \"Title\""),
            "[Atlassian](http://atlassian.com)"
        );
        assert_eq!(md("[Atlassian][test]\n\n[test]: /atlassian"), "Atlassian");
    }

    #[test]
    fn test_images() {
        assert_eq!(
            md(r#"![](https://bitbucket.org/repo/123/images/logo.png "test")"#),
            "[test](https://bitbucket.org/repo/123/images/logo.png)"
        );
        assert_eq!(
            md("![logo.png](https://bitbucket.org/repo/123/images/logo.png)"),
            r"[logo\.png](https://bitbucket.org/repo/123/images/logo.png)"
        );
        assert_eq!(
            md("![logo.png](https://bitbucket.org/repo/123/images/logo.png 'test')"),
            r"[logo\.png](https://bitbucket.org/repo/123/images/logo.png)"
        );
        assert_eq!(
            md("![logo.png](/relative-path-logo.png 'test')"),
            r"logo\.png"
        );
    }

    #[test]
    fn test_reference_images() {
        assert_eq!(
            md("![Atlassian]\n\n[atlassian]: https://bitbucket.org/repo/123/images/logo.png"),
            "[Atlassian](https://bitbucket.org/repo/123/images/logo.png)"
        );
        assert_eq!(
            md("![Atlassian][test]\n\n[test]: https://bitbucket.org/repo/123/images/logo.png"),
            "[Atlassian](https://bitbucket.org/repo/123/images/logo.png)"
        );
        assert_eq!(
            md("![Atlassian][test]\n\n[test]: /relative-path-logo.png"),
            "Atlassian"
        );
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(md("hello `world`"), "hello `world`");
        assert_eq!(md("use `` ` `` symbol"), r"use \` symbol");
    }

    #[test]
    fn test_code_blocks() {
        assert_eq!(md("```\ncode block\n```"), "```\ncode block\n```");
        assert_eq!(md("```\ncode\n\n\nblock\n```"), "```\ncode\n\n\nblock\n```");
        assert_eq!(
            md("```javascript\ncode block\n```"),
            "```javascript\ncode block\n```"
        );
        assert_eq!(md("```py$thon\ncode block\n```"), "```\ncode block\n```");
        assert_eq!(
            md("```\n#!javascript\ncode block\n```"),
            "```\ncode block\n```"
        );
    }

    #[test]
    fn test_nested_code_blocks() {
        let markdown = "\n````markdown\n\n```python\nfoo = 'bar'\n```\n\n````\n\n\t\t";
        assert_eq!(
            md(markdown),
            "```markdown\n\n\\`\\`\\`python\nfoo = 'bar'\n\\`\\`\\`\n\n```"
        );
    }

    #[test]
    fn test_code_after_list() {
        assert_eq!(
            md("1. Foo:\n\n```\nBar\n```"),
            "1\\.  Foo:\n\n\n```\nBar\n```"
        );
        assert_eq!(
            md("1. Foo:\n\n```\nBar\n```\n\n2. Baz:\n\n```\nQux\n```"),
            "1\\.  Foo:\n\n\n```\nBar\n```\n\n2\\.  Baz:\n\n\n```\nQux\n```"
        );
    }

    #[test]
    fn test_user_mention_and_comment() {
        assert_eq!(md("<@UPXGB22A2>"), r"<@UPXGB22A2\>");
        assert_eq!(md("<!-- Comment -->"), "");
    }

    #[test]
    fn test_tables_as_list() {
        let markdown = "| Name | Role | Score |\n| - | - | - |\n| Alice | Admin | 95 |\n| Bob | User | 88 |";
        assert_eq!(
            md(markdown),
            "1\\. Name: Alice\n- Role: Admin\n- Score: 95\n\n2\\. Name: Bob\n- Role: User\n- Score: 88"
        );
        assert_eq!(
            md_with(
                "| Name | Role |\n| - | - |\n| Alice | Admin |",
                UnsupportedTagsStrategy::Remove,
                TableMode::List
            ),
            "1\\. Name: Alice\n- Role: Admin"
        );
        assert_eq!(
            md("| Name | Role |\n| - | - |\n| Alice | |"),
            "1\\. Name: Alice\n- Role: \\-"
        );
        assert_eq!(
            md("| Metric+Name | Value(raw) |\n| - | - |\n| delta-1 | (ok)! |"),
            "1\\. Metric\\+Name: delta\\-1\n- Value\\(raw\\): \\(ok\\)\\!"
        );
        assert_eq!(
            md("| Name | Link |\n| - | - |\n| **Alice** | [Profile](http://example.com/user?id=1) |"),
            "1\\. Name: *Alice*\n- Link: [Profile](http://example.com/user?id=1)"
        );
        assert_eq!(md("| Name | Role |\n| - | - |"), "");
    }

    #[test]
    fn test_table_unsupported() {
        let markdown = "| Column |\n| - |\n| (text) |";
        assert_eq!(
            md_with(markdown, UnsupportedTagsStrategy::Escape, TableMode::Unsupported),
            [
                r"\| Column   \|",
                r"\| \-\-\-\-\-\-\-\- \|",
                r"\| \(text\) \|",
            ]
            .join("\n")
        );
        assert_eq!(
            md_with(markdown, UnsupportedTagsStrategy::Remove, TableMode::Unsupported),
            ""
        );
    }

    #[test]
    fn test_unsupported_escape() {
        assert_eq!(md("> test"), r"\> test");
        assert_eq!(md("<div></div>"), r"<div\></div\>");
        assert_eq!(md("---"), r"\-\-\-");
    }

    #[test]
    fn test_unsupported_remove() {
        for markdown in ["> test", "<div></div>", "---"] {
            assert_eq!(
                md_with(markdown, UnsupportedTagsStrategy::Remove, TableMode::List),
                ""
            );
        }
    }

    #[test]
    fn test_unsupported_keep() {
        assert_eq!(
            md_with("> test", UnsupportedTagsStrategy::Keep, TableMode::List),
            "> test"
        );
        assert_eq!(
            md_with("---", UnsupportedTagsStrategy::Keep, TableMode::List),
            "---"
        );
    }

    #[test]
    fn test_table_mode_from_str() {
        assert_eq!("list".parse::<TableMode>(), Ok(TableMode::List));
        assert_eq!(" Unsupported ".parse::<TableMode>(), Ok(TableMode::Unsupported));
        assert_eq!(
            "grid".parse::<TableMode>(),
            Err(OptionError::TableMode("grid".to_owned()))
        );
    }

    #[test]
    fn test_free_function_matches_builder() {
        let options = ConvertOptions {
            unsupported_tags: UnsupportedTagsStrategy::Remove,
            table: TableMode::Unsupported,
        };
        assert_eq!(convert("text\n\n> quote", options), "text");
    }
}
