//! Collaborators provided by the host application.
//!
//! The policy engine never touches the platform directly: launching apps,
//! showing dialogs, driving the download manager or swapping views all go
//! through these traits. Everything runs on the UI thread, hence `&self` and
//! no `Send` bounds.

use url::Url;

use crate::challenge::{AuthResponse, CertificateDecision};
use crate::error::ShellError;
use crate::lifecycle::ViewEffect;
use crate::sink::ResolutionSink;
use crate::transfer::{DownloadJob, FileChooserRequest};

/// Transient user-facing message (toast, snackbar, status line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// First back press at the navigation root: press again to exit.
    ExitArmed,
    DownloadStarted { file_name: String },
    DownloadFailed { file_name: String },
    NoHandler { url: String },
    FilePickerUnavailable,
}

/// User-confirmation dialogs. Each call owns its sink and must resolve it,
/// typically from a later button callback.
pub trait Prompter {
    /// "Open this link in the browser?". Resolves `true` on accept.
    fn confirm_external_open(&self, url: &Url, sink: ResolutionSink<bool>);

    /// Invalid certificate for `hostname`: continue once or cancel.
    fn confirm_certificate(&self, hostname: &str, sink: ResolutionSink<CertificateDecision>);

    /// Username/password dialog. Dismissal resolves [`AuthResponse::Cancel`].
    fn prompt_credentials(&self, host: &str, realm: &str, sink: ResolutionSink<AuthResponse>);
}

/// Platform side of the shell: app launching, downloads, views, exit.
pub trait HostShell {
    /// Hands `url` to whichever application handles it.
    fn launch_external(&self, url: &Url) -> Result<(), ShellError>;

    /// Opens the native file picker. The result comes back through
    /// [`SiteShell::complete_file_selection`](crate::shell::SiteShell::complete_file_selection).
    fn launch_file_picker(&self, request: &FileChooserRequest) -> Result<(), ShellError>;

    fn enqueue_download(&self, job: &DownloadJob) -> Result<(), ShellError>;

    /// Applies one visibility change (spinner, content, error overlay).
    fn apply_view(&self, effect: ViewEffect);

    fn can_go_back(&self) -> bool;

    fn go_back(&self);

    /// Closes the application window.
    fn terminate(&self);

    /// Shows a transient notice. Default: ignored.
    fn notify(&self, _notice: Notice) {}
}
