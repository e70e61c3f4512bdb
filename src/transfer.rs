//! File-chooser correlation and download interception.
//!
//! ## File chooser
//!
//! At most one selection is pending at any time. A new chooser request hands
//! back the stale one, which the caller resolves with "no selection". Sinks
//! always leave the slot before they are resolved: an engine callback may
//! re-enter the owner of the interceptor.
//!
//! ## Downloads
//!
//! A download request becomes a [`DownloadJob`] (file name guessed from
//! `Content-Disposition`, URL and MIME type; cookie and user-agent headers
//! attached) handed to the platform download manager. Enqueue failures are
//! reported and logged; they never touch navigation or page state.

use tracing::{debug, info, warn};
use url::Url;

use crate::error::ShellError;
use crate::host::{HostShell, Notice};
use crate::sink::ResolutionSink;

const DOWNLOAD_DESCRIPTION: &str = "Downloading file...";
const FALLBACK_FILE_NAME: &str = "downloadfile";

/// Result of a file selection. `None` = nothing selected (cancel, dismiss,
/// superseded request).
pub type FileSelection = Option<Vec<Url>>;

// ─────────────────────────────────────────────────────────────────────────────
// File chooser
// ─────────────────────────────────────────────────────────────────────────────

/// What the native picker should be opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChooserRequest {
    /// `image/*` or `*/*`.
    pub mime_hint: String,
    pub allow_multiple: bool,
}

impl FileChooserRequest {
    /// Pickers default to images; any other first accept type widens to `*/*`.
    pub fn from_accept_types(accept_types: &[String], allow_multiple: bool) -> Self {
        let mime_hint = match accept_types.first().map(|t| t.trim()) {
            Some(first) if !first.is_empty() && !first.contains("image") => "*/*",
            _ => "image/*",
        };
        Self {
            mime_hint: mime_hint.to_string(),
            allow_multiple,
        }
    }
}

/// The one in-flight file-chooser request.
#[derive(Debug)]
pub struct PendingFileSelection {
    sink: ResolutionSink<FileSelection>,
    accept_types: Vec<String>,
    allow_multiple: bool,
}

impl PendingFileSelection {
    pub fn accept_types(&self) -> &[String] {
        &self.accept_types
    }

    pub fn allow_multiple(&self) -> bool {
        self.allow_multiple
    }

    /// Delivers the picker result. An empty list is "no selection"; a
    /// single-select chooser only gets the first URI.
    pub fn resolve(self, selection: FileSelection) {
        let allow_multiple = self.allow_multiple;
        let selection = selection
            .filter(|uris| !uris.is_empty())
            .map(|mut uris| {
                if !allow_multiple {
                    uris.truncate(1);
                }
                uris
            });
        debug!(
            count = selection.as_ref().map_or(0, Vec::len),
            "File selection completed"
        );
        self.sink.resolve(selection);
    }

    /// Resolves with "no selection".
    pub fn cancel(self) {
        self.sink.resolve(None);
    }
}

/// Owns the pending file-selection slot and builds download jobs.
#[derive(Debug, Default)]
pub struct TransferInterceptor {
    pending: Option<PendingFileSelection>,
}

impl TransferInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a chooser request. The superseded selection, if any, is
    /// returned unresolved.
    #[must_use]
    pub fn begin_file_selection(
        &mut self,
        accept_types: Vec<String>,
        allow_multiple: bool,
        sink: ResolutionSink<FileSelection>,
    ) -> (FileChooserRequest, Option<PendingFileSelection>) {
        let request = FileChooserRequest::from_accept_types(&accept_types, allow_multiple);
        let superseded = self.pending.replace(PendingFileSelection {
            sink,
            accept_types,
            allow_multiple,
        });
        if superseded.is_some() {
            debug!("Superseding pending file selection");
        }
        (request, superseded)
    }

    /// Empties the slot. `None` when nothing is pending.
    pub fn take_pending(&mut self) -> Option<PendingFileSelection> {
        self.pending.take()
    }

    pub fn has_pending_selection(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_selection(&self) -> Option<&PendingFileSelection> {
        self.pending.as_ref()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Downloads
// ─────────────────────────────────────────────────────────────────────────────

/// Builds the job for `request` and hands it to the download manager.
pub fn intercept_download(
    request: &DownloadRequest,
    host: &dyn HostShell,
) -> Result<DownloadJob, ShellError> {
    let job = DownloadJob::from_request(request);
    match host.enqueue_download(&job) {
        Ok(()) => {
            info!(url = %job.url, file = %job.file_name, "Download enqueued");
            host.notify(Notice::DownloadStarted {
                file_name: job.file_name.clone(),
            });
            Ok(job)
        }
        Err(e) => {
            warn!(url = %job.url, error = %e, "Failed to start download");
            host.notify(Notice::DownloadFailed {
                file_name: job.file_name.clone(),
            });
            Err(e)
        }
    }
}

/// Download event raised by the engine.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: Url,
    pub mime_type: String,
    pub content_disposition: String,
    /// Cookies the engine holds for `url`, `k=v; k2=v2`.
    pub cookies: Option<String>,
    pub user_agent: String,
}

/// Job description for the platform download manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub url: Url,
    pub mime_type: String,
    pub file_name: String,
    pub title: String,
    pub description: String,
    pub headers: Vec<(String, String)>,
    pub notify_on_completion: bool,
}

impl DownloadJob {
    pub fn from_request(request: &DownloadRequest) -> Self {
        let file_name = guess_file_name(
            &request.url,
            &request.content_disposition,
            &request.mime_type,
        );

        let mut headers = Vec::new();
        if let Some(cookies) = request.cookies.as_deref().filter(|c| !c.is_empty()) {
            headers.push(("cookie".to_string(), cookies.to_string()));
        }
        if !request.user_agent.is_empty() {
            headers.push(("User-Agent".to_string(), request.user_agent.clone()));
        }

        Self {
            url: request.url.clone(),
            mime_type: request.mime_type.clone(),
            title: file_name.clone(),
            file_name,
            description: DOWNLOAD_DESCRIPTION.to_string(),
            headers,
            notify_on_completion: true,
        }
    }
}

/// Guesses the target file name of a download.
///
/// `Content-Disposition` (`filename*=` then `filename=`) wins, then the last
/// URL path segment, then `downloadfile`. A missing extension is derived from
/// the MIME type (`.bin` when unknown).
pub fn guess_file_name(url: &Url, content_disposition: &str, mime_type: &str) -> String {
    let name = disposition_file_name(content_disposition)
        .or_else(|| url_file_name(url))
        .map(|n| sanitize_file_name(&n))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());

    if name.contains('.') {
        return name;
    }
    format!("{name}.{}", extension_for_mime(mime_type))
}

fn disposition_file_name(header: &str) -> Option<String> {
    let params: Vec<(String, &str)> = header
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            Some((key.trim().to_ascii_lowercase(), value.trim()))
        })
        .collect();

    // RFC 5987: filename*=UTF-8''na%C3%AFve.txt
    if let Some((_, value)) = params.iter().find(|(k, _)| k == "filename*") {
        let encoded = value.rsplit("''").next().unwrap_or_default();
        let decoded = percent_decode(encoded.trim_matches('"'));
        if !decoded.is_empty() {
            return Some(decoded);
        }
    }

    params
        .iter()
        .find(|(k, _)| k == "filename")
        .map(|(_, v)| v.trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}

fn url_file_name(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    Some(percent_decode(segment))
}

/// Keeps only the last path component and drops control characters.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.chars().filter(|c| !c.is_control()).collect::<String>().trim().to_string()
}

fn extension_for_mime(mime_type: &str) -> &'static str {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "text/html" => "html",
        "text/css" => "css",
        "text/csv" => "csv",
        "application/pdf" => "pdf",
        "application/zip" => "zip",
        "application/json" => "json",
        "application/vnd.android.package-archive" => "apk",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "audio/mpeg" => "mp3",
        "video/mp4" => "mp4",
        other if other.starts_with("text/") => "txt",
        _ => "bin",
    }
}

/// Percent-decoding for path segments and RFC 5987 values.
fn percent_decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut iter = s.bytes();
    while let Some(b) = iter.next() {
        if b != b'%' {
            bytes.push(b);
            continue;
        }
        let hi = iter.next();
        let lo = iter.next();
        match (hi.and_then(hex_val), lo.and_then(hex_val)) {
            (Some(h), Some(l)) => bytes.push(h << 4 | l),
            _ => {
                bytes.push(b'%');
                bytes.extend(hi);
                bytes.extend(lo);
            }
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ViewEffect;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn selection_sink(log: &Rc<RefCell<Vec<FileSelection>>>) -> ResolutionSink<FileSelection> {
        let log = Rc::clone(log);
        ResolutionSink::new("file-chooser", move |s| log.borrow_mut().push(s))
    }

    fn uri(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_resolve_delivers_and_clears() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut transfer = TransferInterceptor::new();
        let (request, superseded) =
            transfer.begin_file_selection(vec!["image/png".into()], false, selection_sink(&log));
        assert_eq!(request.mime_hint, "image/*");
        assert!(superseded.is_none());
        assert!(transfer.has_pending_selection());

        transfer
            .take_pending()
            .unwrap()
            .resolve(Some(vec![uri("content://media/1")]));
        assert!(!transfer.has_pending_selection());
        assert_eq!(*log.borrow(), vec![Some(vec![uri("content://media/1")])]);
    }

    #[test]
    fn test_second_begin_hands_back_first() {
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        let mut transfer = TransferInterceptor::new();

        let (_, none) = transfer.begin_file_selection(vec![], false, selection_sink(&first));
        assert!(none.is_none());
        let (_, stale) = transfer.begin_file_selection(vec![], true, selection_sink(&second));
        // Toujours non résolu : l'appelant s'en charge hors emprunt.
        assert!(first.borrow().is_empty());
        stale.unwrap().cancel();
        assert_eq!(*first.borrow(), vec![None]);
        assert!(second.borrow().is_empty());

        transfer.take_pending().unwrap().cancel();
        assert_eq!(*second.borrow(), vec![None]);
    }

    #[test]
    fn test_take_without_pending_is_none() {
        let mut transfer = TransferInterceptor::new();
        assert!(transfer.take_pending().is_none());
    }

    #[test]
    fn test_empty_selection_is_no_selection() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut transfer = TransferInterceptor::new();
        let (_, _) = transfer.begin_file_selection(vec![], true, selection_sink(&log));
        transfer.take_pending().unwrap().resolve(Some(vec![]));
        assert_eq!(*log.borrow(), vec![None]);
    }

    #[test]
    fn test_single_select_keeps_first_uri() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut transfer = TransferInterceptor::new();
        let (_, _) = transfer.begin_file_selection(vec![], false, selection_sink(&log));
        transfer
            .take_pending()
            .unwrap()
            .resolve(Some(vec![uri("content://a/1"), uri("content://a/2")]));
        assert_eq!(*log.borrow(), vec![Some(vec![uri("content://a/1")])]);
    }

    #[test]
    fn test_pending_selection_keeps_filters() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut transfer = TransferInterceptor::new();
        let (_, _) = transfer.begin_file_selection(vec![".pdf".into()], true, selection_sink(&log));
        let pending = transfer.pending_selection().unwrap();
        assert_eq!(pending.accept_types(), [".pdf".to_string()]);
        assert!(pending.allow_multiple());
        transfer.take_pending().unwrap().cancel();
    }

    #[test]
    fn test_chooser_mime_hint() {
        let hint = |types: &[&str]| {
            let types: Vec<String> = types.iter().map(|t| t.to_string()).collect();
            FileChooserRequest::from_accept_types(&types, false).mime_hint
        };
        assert_eq!(hint(&[]), "image/*");
        assert_eq!(hint(&[""]), "image/*");
        assert_eq!(hint(&["image/png"]), "image/*");
        assert_eq!(hint(&["application/pdf", "image/png"]), "*/*");
    }

    #[test]
    fn test_guess_file_name_from_disposition() {
        let url = uri("https://example.com/download?id=7");
        assert_eq!(
            guess_file_name(&url, "attachment; filename=\"report.pdf\"", "application/pdf"),
            "report.pdf"
        );
        assert_eq!(
            guess_file_name(&url, "attachment; filename*=UTF-8''na%C3%AFve%20notes.txt", ""),
            "naïve notes.txt"
        );
    }

    #[test]
    fn test_guess_file_name_from_url_path() {
        let url = uri("https://cdn.example.com/files/My%20Photo.jpeg");
        assert_eq!(guess_file_name(&url, "", "image/jpeg"), "My Photo.jpeg");
    }

    #[test]
    fn test_guess_file_name_adds_extension_from_mime() {
        let url = uri("https://example.com/export/invoice");
        assert_eq!(guess_file_name(&url, "", "application/pdf"), "invoice.pdf");
        assert_eq!(guess_file_name(&url, "", "text/markdown; charset=utf-8"), "invoice.txt");
        assert_eq!(guess_file_name(&url, "", "application/octet-stream"), "invoice.bin");
    }

    #[test]
    fn test_guess_file_name_fallback() {
        let url = uri("https://example.com/");
        assert_eq!(guess_file_name(&url, "inline", "text/html"), "downloadfile.html");
    }

    #[test]
    fn test_disposition_path_components_stripped() {
        let url = uri("https://example.com/");
        assert_eq!(
            guess_file_name(&url, "attachment; filename=\"../../etc/passwd.txt\"", ""),
            "passwd.txt"
        );
    }

    #[test]
    fn test_percent_decode_keeps_invalid_sequences() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("a%zzb"), "a%zzb");
        assert_eq!(percent_decode("a%20b"), "a b");
    }

    #[test]
    fn test_download_job_headers() {
        let request = DownloadRequest {
            url: uri("https://example.com/a.zip"),
            mime_type: "application/zip".into(),
            content_disposition: String::new(),
            cookies: Some("session=abc".into()),
            user_agent: "SiteShell/1.0".into(),
        };
        let job = DownloadJob::from_request(&request);
        assert_eq!(job.file_name, "a.zip");
        assert_eq!(job.title, "a.zip");
        assert!(job.notify_on_completion);
        assert_eq!(
            job.headers,
            vec![
                ("cookie".to_string(), "session=abc".to_string()),
                ("User-Agent".to_string(), "SiteShell/1.0".to_string()),
            ]
        );
    }

    struct DownloadHost {
        fail: bool,
        notices: RefCell<Vec<Notice>>,
    }

    impl HostShell for DownloadHost {
        fn launch_external(&self, _url: &Url) -> Result<(), ShellError> {
            Ok(())
        }
        fn launch_file_picker(&self, _request: &FileChooserRequest) -> Result<(), ShellError> {
            Ok(())
        }
        fn enqueue_download(&self, _job: &DownloadJob) -> Result<(), ShellError> {
            if self.fail {
                Err(ShellError::TransferFailure("storage unavailable".into()))
            } else {
                Ok(())
            }
        }
        fn apply_view(&self, _effect: ViewEffect) {}
        fn can_go_back(&self) -> bool {
            false
        }
        fn go_back(&self) {}
        fn terminate(&self) {}
        fn notify(&self, notice: Notice) {
            self.notices.borrow_mut().push(notice);
        }
    }

    fn download_request() -> DownloadRequest {
        DownloadRequest {
            url: uri("https://example.com/a.zip"),
            mime_type: "application/zip".into(),
            content_disposition: String::new(),
            cookies: None,
            user_agent: String::new(),
        }
    }

    #[test]
    fn test_intercept_download_reports_success() {
        let host = DownloadHost { fail: false, notices: RefCell::new(Vec::new()) };
        let job = intercept_download(&download_request(), &host).unwrap();
        assert!(job.headers.is_empty());
        assert_eq!(
            *host.notices.borrow(),
            vec![Notice::DownloadStarted { file_name: "a.zip".into() }]
        );
    }

    #[test]
    fn test_intercept_download_reports_failure() {
        let host = DownloadHost { fail: true, notices: RefCell::new(Vec::new()) };
        let result = intercept_download(&download_request(), &host);
        assert!(matches!(result, Err(ShellError::TransferFailure(_))));
        assert_eq!(
            *host.notices.borrow(),
            vec![Notice::DownloadFailed { file_name: "a.zip".into() }]
        );
    }
}
