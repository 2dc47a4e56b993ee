use crate::traits::MarkdownRenderer;
use ammonia::{Builder, Url, UrlRelative};
use pulldown_cmark::{html, Options, Parser};

/// CommonMark rendering with ammonia-based cleaning.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMark;

fn rebase(builder: &mut Builder<'_>, base_url: &str) {
    if let Ok(base) = Url::parse(base_url) {
        builder.url_relative(UrlRelative::RewriteWithBase(base));
    }
}

impl MarkdownRenderer for CommonMark {
    fn to_html(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let parser = Parser::new_ext(markdown, options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }

    fn clean(&self, html: &str, base_url: &str) -> String {
        let mut builder = Builder::default();
        rebase(&mut builder, base_url);
        builder.clean(html).to_string()
    }

    fn clean_thought(&self, html: &str, base_url: &str) -> String {
        let mut builder = Builder::default();
        builder
            .add_tags(&["span", "hr", "iframe", "audio"])
            .add_generic_attributes(&["id", "target", "class"])
            .add_tag_attributes("iframe", &["src", "width", "height"])
            .add_tag_attributes("audio", &["controls", "src"]);
        rebase(&mut builder, base_url);
        builder.clean(html).to_string()
    }
}
