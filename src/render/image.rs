//! Image pass: `<img>` islands become `figure` environments.
//!
//! Sources with a URL scheme are handed to an [`ImageResolver`], which may
//! return a local path to use instead. Network access lives behind that
//! trait so the pass itself stays pure.

use super::TextPass;
use crate::ast::Tag;
use crate::error::{ParseError, Result};
use crate::parser::markup::parse_fragment;
use crate::parser::url_scheme;

/// Supplies local copies of remote images.
pub trait ImageResolver {
    /// Local path for `url`, or `None` to keep the original source.
    fn fetch(&self, url: &str) -> Option<String>;
}

/// Resolver that never downloads anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRemoteImages;

impl ImageResolver for NoRemoteImages {
    fn fetch(&self, _url: &str) -> Option<String> {
        None
    }
}

#[cfg(feature = "remote-images")]
pub use self::http::HttpImageResolver;

#[cfg(feature = "remote-images")]
mod http {
    use super::ImageResolver;
    use reqwest::blocking::Client;
    use reqwest::StatusCode;
    use std::path::PathBuf;
    use std::time::Duration;

    #[derive(Debug, thiserror::Error)]
    enum FetchError {
        #[error("request failed: {0}")]
        Http(#[from] reqwest::Error),

        #[error("could not store image: {0}")]
        Io(#[from] std::io::Error),

        #[error("HEAD returned {0}")]
        Status(StatusCode),
    }

    /// Downloads each image into its own temporary directory.
    #[derive(Debug, Clone)]
    pub struct HttpImageResolver {
        client: Client,
    }

    impl HttpImageResolver {
        /// Build a resolver whose requests give up after `timeout`.
        pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
            let client = Client::builder().timeout(timeout).build()?;
            Ok(Self { client })
        }

        fn download(&self, url: &str) -> Result<PathBuf, FetchError> {
            let head = self.client.head(url).send()?;
            if head.status() != StatusCode::OK {
                return Err(FetchError::Status(head.status()));
            }

            let bytes = self.client.get(url).send()?.error_for_status()?.bytes()?;
            let dir = tempfile::tempdir()?.into_path();
            let path = dir.join(file_name(url));
            std::fs::write(&path, &bytes)?;
            Ok(path)
        }
    }

    impl ImageResolver for HttpImageResolver {
        fn fetch(&self, url: &str) -> Option<String> {
            match self.download(url) {
                Ok(path) => {
                    log::debug!("downloaded {} to {}", url, path.display());
                    Some(path.to_string_lossy().into_owned())
                }
                Err(e) => {
                    log::warn!("Failed to fetch image from {url}: {e}");
                    None
                }
            }
        }
    }

    /// Last path segment of `url`, without query or fragment.
    pub(super) fn file_name(url: &str) -> &str {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        match path.rsplit('/').next() {
            Some(name) if !name.is_empty() => name,
            _ => "image",
        }
    }
}

/// Whether `src` names a resource by URL rather than by local path.
pub fn has_url_scheme(src: &str) -> bool {
    url_scheme(src).is_ok()
}

/// Replace every image island in `input`.
pub fn convert_images(input: &str, resolver: &dyn ImageResolver) -> Result<String> {
    let blocks = input
        .split("\n\n")
        .map(|block| {
            let stripped = block.trim();
            if stripped.starts_with("<img") {
                figure(stripped, resolver)
            } else {
                Ok(block.to_string())
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(blocks.join("\n\n"))
}

fn figure(island: &str, resolver: &dyn ImageResolver) -> Result<String> {
    let img = parse_fragment(island)?;
    if img.tag != Tag::Img {
        return Err(ParseError::Markup {
            offset: 0,
            message: format!("expected a single <img>, found <{}>", img.tag.name()),
        }
        .into());
    }

    let mut src = img.get("src").unwrap_or_default().to_string();
    if has_url_scheme(&src) {
        if let Some(local) = resolver.fetch(&src) {
            src = local;
        }
    }
    log::debug!("converting image island {}", src);

    Ok(format!(
        "\\begin{{figure}}[H]\n\\centering\n\\includegraphics[max width=\\linewidth]{{{}}}\n\\caption{{{}}}\n\\end{{figure}}",
        src,
        img.get("alt").unwrap_or_default()
    ))
}

/// Pipeline stage wrapping [`convert_images`].
pub struct ImagePass<'a> {
    resolver: &'a dyn ImageResolver,
}

impl<'a> ImagePass<'a> {
    pub fn new(resolver: &'a dyn ImageResolver) -> Self {
        Self { resolver }
    }
}

impl TextPass for ImagePass<'_> {
    fn name(&self) -> &'static str {
        "image"
    }

    fn run(&self, input: &str) -> Result<String> {
        convert_images(input, self.resolver)
    }
}
