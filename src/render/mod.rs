//! Rendering layer: tree to LaTeX, then a fixed chain of text passes.
//!
//! The tree renderer leaves tables, images and links behind as literal
//! markup. The passes below rewrite those islands once the whole document
//! text is available:
//!
//! unescape → math → image → table → link → root-strip

pub mod image;
pub mod latex;
pub mod link;
pub mod math;
pub mod table;

pub use image::{ImageResolver, NoRemoteImages};
#[cfg(feature = "remote-images")]
pub use image::HttpImageResolver;
pub use latex::render_node;

use crate::ast::Node;
use crate::config::LatexConfig;
use crate::error::Result;
use crate::escape::{decode_markup_entities, normalize_typographic_markup};
use image::ImagePass;
use link::LinkPass;
use math::MathPass;
use table::TablePass;

const ROOT_OPEN: &str = "<root>";
const ROOT_CLOSE: &str = "</root>";

/// One stage of post-processing: text in, text out.
pub trait TextPass {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    fn run(&self, input: &str) -> Result<String>;
}

/// Typographic entities become LaTeX quoting, the rest decode to text.
struct UnescapeEntities;

impl TextPass for UnescapeEntities {
    fn name(&self) -> &'static str {
        "unescape"
    }

    fn run(&self, input: &str) -> Result<String> {
        Ok(decode_markup_entities(&normalize_typographic_markup(input)))
    }
}

/// Removes the wrapper the renderer puts around the document.
struct RootStrip;

impl TextPass for RootStrip {
    fn name(&self) -> &'static str {
        "root-strip"
    }

    /// Only the outermost wrapper lines are removed.
    fn run(&self, input: &str) -> Result<String> {
        let body = input
            .strip_prefix(ROOT_OPEN)
            .and_then(|rest| rest.strip_prefix('\n'))
            .unwrap_or(input);
        let body = body
            .strip_suffix(ROOT_CLOSE)
            .and_then(|rest| rest.strip_suffix('\n'))
            .unwrap_or(body);
        Ok(body.to_string())
    }
}

/// Run every pass over `text` in order.
pub fn postprocess(text: String, resolver: &dyn ImageResolver) -> Result<String> {
    let passes: [&dyn TextPass; 6] = [
        &UnescapeEntities,
        &MathPass,
        &ImagePass::new(resolver),
        &TablePass,
        &LinkPass,
        &RootStrip,
    ];

    passes.iter().try_fold(text, |text, pass| {
        log::debug!("running {} pass", pass.name());
        pass.run(&text)
    })
}

/// Renders document trees with a fixed image resolver.
pub struct LatexRenderer {
    resolver: Box<dyn ImageResolver>,
}

impl LatexRenderer {
    /// Renderer for `config`. Remote images are downloaded only when the
    /// `remote-images` feature is compiled in and the config asks for it.
    pub fn new(config: &LatexConfig) -> Self {
        Self {
            resolver: default_resolver(config),
        }
    }

    /// Renderer using a caller-supplied resolver.
    pub fn with_resolver(resolver: Box<dyn ImageResolver>) -> Self {
        Self { resolver }
    }

    /// Render `root` to LaTeX.
    pub fn render(&self, root: &Node) -> Result<String> {
        let body = render_node(root);
        postprocess(
            format!("{}\n{}\n{}", ROOT_OPEN, body, ROOT_CLOSE),
            self.resolver.as_ref(),
        )
    }
}

#[cfg(feature = "remote-images")]
fn default_resolver(config: &LatexConfig) -> Box<dyn ImageResolver> {
    if !config.fetch_remote_images {
        return Box::new(NoRemoteImages);
    }
    match HttpImageResolver::new(config.image_timeout()) {
        Ok(resolver) => Box::new(resolver),
        Err(e) => {
            log::warn!("Remote images disabled, HTTP client unavailable: {e}");
            Box::new(NoRemoteImages)
        }
    }
}

#[cfg(not(feature = "remote-images"))]
fn default_resolver(_config: &LatexConfig) -> Box<dyn ImageResolver> {
    Box::new(NoRemoteImages)
}

/// Render a document tree with a renderer built from `config`.
pub fn render_document(root: &Node, config: &LatexConfig) -> Result<String> {
    LatexRenderer::new(config).render(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Tag;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_root_strip_without_wrapper() {
        assert_eq!(RootStrip.run("plain text").unwrap(), "plain text");
        assert_eq!(RootStrip.run("<root>\nx\n</root>").unwrap(), "x");
    }

    #[test]
    fn test_root_strip_keeps_inner_tags() {
        assert_eq!(
            RootStrip.run("<root>\na <root> and </root> b\n</root>").unwrap(),
            "a <root> and </root> b"
        );
        assert_eq!(RootStrip.run("x\n</root> y").unwrap(), "x\n</root> y");
    }

    #[test]
    fn test_unescape_pass() {
        assert_eq!(
            UnescapeEntities.run("&ldquo;X&rdquo; &gt; 1").unwrap(),
            "\\enquote{X} > 1"
        );
    }

    #[test]
    fn test_render_heading() {
        let root = Node::new(Tag::Root).with_child(Node::new(Tag::H2).with_text("Hi"));
        let renderer = LatexRenderer::with_resolver(Box::new(NoRemoteImages));
        assert_eq!(renderer.render(&root).unwrap().trim(), "\\section{Hi}");
    }

    #[test]
    fn test_passes_run_in_order() {
        // The table pass sees cells after math conversion, and the link pass
        // sees anchors the table pass wrote back.
        let table = Node::new(Tag::Table).with_child(
            Node::new(Tag::Tr)
                .with_child(Node::new(Tag::Td).with_text("$x$"))
                .with_child(
                    Node::new(Tag::Td).with_child(
                        Node::new(Tag::A).with_attr("href", "https://a.org").with_text("a"),
                    ),
                ),
        );
        let root = Node::new(Tag::Root).with_child(table);
        let latex = LatexRenderer::with_resolver(Box::new(NoRemoteImages))
            .render(&root)
            .unwrap();

        assert!(latex.contains("\\begin{tabular}{|l|l|}"));
        assert!(latex.contains("\\(x\\) & \\href{https://a.org}{a} \\\\"));
        assert!(!latex.contains("<root>"));
    }

    #[test]
    fn test_render_document_without_downloads() {
        let config = LatexConfig {
            fetch_remote_images: false,
            ..Default::default()
        };
        let root = Node::new(Tag::Root).with_child(
            Node::new(Tag::P).with_child(
                Node::new(Tag::Img)
                    .with_attr("src", "https://x.org/a.png")
                    .with_attr("alt", "A"),
            ),
        );
        let latex = render_document(&root, &config).unwrap();
        assert!(latex.contains("\\includegraphics[max width=\\linewidth]{https://x.org/a.png}"));
    }
}
