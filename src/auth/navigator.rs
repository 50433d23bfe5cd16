//! User-agent port
//!
//! The authorization flow never talks to a browser directly. It asks a
//! [`Navigator`] to send the user somewhere (the provider's consent page,
//! or back to the application root after a failure) and to rewrite the
//! current location once the single-use `code` has been consumed.

use url::Url;

/// Moves the user agent between locations
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Full navigation to `url` (consent page or application root)
    fn navigate(&self, url: &Url);

    /// Replace the current location without navigating, e.g. to drop `code`
    fn replace_location(&self, url: &Url);
}

/// Navigator backed by the desktop's default browser
///
/// Prints every external navigation target to stderr so the user can copy
/// it when no browser can be launched. The application root is this
/// process, so navigating there only logs the restart.
#[derive(Debug, Clone)]
pub struct SystemBrowser {
    root: Url,
}

impl SystemBrowser {
    /// Creates a navigator whose application root is `root`
    pub fn new(root: Url) -> Self {
        Self { root }
    }

    fn is_root(&self, url: &Url) -> bool {
        url.origin() == self.root.origin() && url.path() == self.root.path()
    }
}

impl Navigator for SystemBrowser {
    fn navigate(&self, url: &Url) {
        if self.is_root(url) {
            tracing::info!("Returning to application root; authorization restarts");
            return;
        }
        eprintln!("Open the following URL in your browser:\n{}", url);
        try_open_browser(url.as_str());
    }

    fn replace_location(&self, url: &Url) {
        // The loopback request that carried the code is already answered;
        // there is no address bar to rewrite.
        tracing::debug!("Location replaced with {}", url);
    }
}

/// Attempts to open `url` in the user's default browser.
///
/// Errors are ignored; the URL has already been printed.
fn try_open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    {
        let _ = std::process::Command::new("open").arg(url).spawn();
    }
    #[cfg(target_os = "linux")]
    {
        let _ = std::process::Command::new("xdg-open").arg(url).spawn();
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        let _ = url;
    }
}
