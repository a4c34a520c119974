use crate::element::Element;
use crate::parse::parse;
use crate::registry::IconError;
use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("request for `{url}` failed with status {status}")]
    Status { url: String, status: u16 },
    #[error("request for `{url}` failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("could not read `{url}`")]
    Io {
        url: String,
        #[source]
        source: Arc<std::io::Error>,
    },
    #[error("`{url}` uses a scheme this transport cannot load")]
    UnsupportedScheme { url: String },
}

/// Loads the text behind a URL.
///
/// The registry calls `get` once per fetch and never while it holds internal state borrowed,
/// so implementations are free to call back into the registry.
/// No timeout is imposed on the returned future; bound it here if one is needed.
pub trait Transport {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<String, FetchError>>;
}

impl<F> Transport for F
where
    F: Fn(&str) -> LocalBoxFuture<'static, Result<String, FetchError>>,
{
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<String, FetchError>> {
        self(url)
    }
}

/// Decides whether a resource URL may be fetched, returning the URL to use if so.
pub trait UrlPolicy {
    fn sanitize(&self, url: &str) -> Option<String>;
}

/// Accepts relative references and `http`, `https` and `file` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultUrlPolicy;

impl DefaultUrlPolicy {
    const SCHEMES: [&'static str; 3] = ["http", "https", "file"];
}

impl UrlPolicy for DefaultUrlPolicy {
    fn sanitize(&self, url: &str) -> Option<String> {
        let url = url.trim();
        if url.is_empty() || url.chars().any(char::is_control) {
            return None;
        }

        match url::Url::parse(url) {
            Ok(parsed) if Self::SCHEMES.contains(&parsed.scheme()) => Some(url.to_owned()),
            Ok(_) => None,
            Err(url::ParseError::RelativeUrlWithoutBase) => Some(url.to_owned()),
            Err(_) => None,
        }
    }
}

/// A [Transport] that reads icon sources from the local filesystem.
///
/// Accepts plain paths and `file://` URLs. When a root is set, plain paths are resolved
/// below it (a leading `/` included) and may not contain `..`; otherwise they are used as-is.
#[derive(Debug, Clone, Default)]
pub struct FileTransport {
    root: Option<PathBuf>,
}

impl FileTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn path_for(&self, url: &str) -> Result<PathBuf, FetchError> {
        match url::Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "file" => {
                parsed.to_file_path().map_err(|()| FetchError::Transport {
                    url: url.to_owned(),
                    reason: "not a local file path".into(),
                })
            }
            Ok(_) => Err(FetchError::UnsupportedScheme {
                url: url.to_owned(),
            }),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.root {
                Some(root) => {
                    let relative = Path::new(url.trim_start_matches('/'));
                    if relative
                        .components()
                        .any(|component| matches!(component, Component::ParentDir))
                    {
                        return Err(FetchError::Transport {
                            url: url.to_owned(),
                            reason: "path escapes the transport root".into(),
                        });
                    }

                    Ok(root.join(relative))
                }
                None => Ok(PathBuf::from(url)),
            },
            Err(e) => Err(FetchError::Transport {
                url: url.to_owned(),
                reason: e.to_string(),
            }),
        }
    }
}

impl Transport for FileTransport {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<String, FetchError>> {
        let result = self.path_for(url).and_then(|path| {
            std::fs::read_to_string(&path).map_err(|e| FetchError::Io {
                url: url.to_owned(),
                source: Arc::new(e),
            })
        });

        future::ready(result).boxed_local()
    }
}

/// Checks `url` against the policy and starts fetching it, returning a future that parses the
/// response once it arrives.
///
/// The policy check and the call to [Transport::get] both happen before this returns.
pub(crate) fn fetch_element(
    transport: &dyn Transport,
    policy: &dyn UrlPolicy,
    url: &str,
) -> Result<LocalBoxFuture<'static, Result<Element, IconError>>, IconError> {
    let Some(safe_url) = policy.sanitize(url) else {
        #[cfg(feature = "log")]
        log::warn!("refusing to fetch unsafe icon url {url:?}");

        return Err(IconError::UnsafeSource {
            url: url.to_owned(),
        });
    };

    #[cfg(feature = "log")]
    log::debug!("fetching icon source {safe_url:?}");

    let request = transport.get(&safe_url);

    Ok(async move {
        let text = request.await.inspect_err(|_e| {
            #[cfg(feature = "log")]
            log::debug!("fetch failed: {_e}");
        })?;

        Ok::<_, IconError>(parse(&text)?)
    }
    .boxed_local())
}
