//! Resource loading for URLs the compiler encounters for the first time.
use std::{fmt, io};

use url::Url;

/// The boxed error a loader may fail with.
pub type LoadErrorSource = Box<dyn std::error::Error + Send + Sync>;

/// Fetches the bytes of a schema resource.
///
/// The hook receives a normalized absolute URL without fragment and is
/// invoked exactly once per URL per compiler; fragments are applied after
/// the document is parsed.
pub trait UrlLoader: Send + Sync {
    /// Return a byte stream for `url`.
    ///
    /// # Errors
    ///
    /// Any transport failure; it is reported as [`crate::CompileError::LoadError`].
    fn load(&self, url: &str) -> Result<Box<dyn io::Read>, LoadErrorSource>;
}

impl<F> UrlLoader for F
where
    F: Fn(&str) -> Result<Box<dyn io::Read>, LoadErrorSource> + Send + Sync,
{
    fn load(&self, url: &str) -> Result<Box<dyn io::Read>, LoadErrorSource> {
        self(url)
    }
}

/// Loader used when no hook is configured: handles `file://` and, with the
/// `resolve-http` feature, `http(s)://`.
#[derive(Debug, Default)]
pub struct DefaultLoader;

impl UrlLoader for DefaultLoader {
    fn load(&self, url: &str) -> Result<Box<dyn io::Read>, LoadErrorSource> {
        let url = Url::parse(url).map_err(|error| Box::new(error) as LoadErrorSource)?;
        match url.scheme() {
            #[cfg(feature = "resolve-file")]
            "file" => {
                let path = percent_encoding::percent_decode_str(url.path())
                    .decode_utf8()
                    .map_err(|error| Box::new(error) as LoadErrorSource)?;
                let file = std::fs::File::open(path.as_ref())?;
                Ok(Box::new(file))
            }
            #[cfg(feature = "resolve-http")]
            "http" | "https" => {
                let response = reqwest::blocking::get(url)?.error_for_status()?;
                Ok(Box::new(response))
            }
            other => Err(Box::new(UnsupportedUrlScheme {
                scheme: other.to_string(),
            })),
        }
    }
}

/// The default loader has no handler for the URL's scheme.
#[derive(Debug)]
pub struct UnsupportedUrlScheme {
    scheme: String,
}

impl fmt::Display for UnsupportedUrlScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the URL scheme '{}' is not supported", self.scheme)
    }
}

impl std::error::Error for UnsupportedUrlScheme {}
