use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Status};

use crate::error::PppError;

#[derive(Debug)]
pub enum FetchFailure {
    Transient(String),
    Fatal(String),
}

impl FetchFailure {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchFailure::Transient(_))
    }

    pub fn message(&self) -> &str {
        match self {
            FetchFailure::Transient(message) | FetchFailure::Fatal(message) => message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Ftp,
    Http,
}

pub fn scheme_of(url: &str) -> Option<Scheme> {
    if url.starts_with("ftp://") {
        Some(Scheme::Ftp)
    } else if url.starts_with("http://") || url.starts_with("https://") {
        Some(Scheme::Http)
    } else {
        None
    }
}

/// Single-attempt byte transfer into a local file. Retries live in the
/// executor, not here.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchFailure>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, PppError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("ppp-pm/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PppError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| PppError::Http(err.to_string()))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchFailure> {
        tracing::debug!(url, "http fetch");
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(classify_reqwest_error)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = format!("{url} returned status {status}");
            return Err(if is_retryable_status(status) {
                FetchFailure::Transient(message)
            } else {
                FetchFailure::Fatal(message)
            });
        }
        let mut file =
            File::create(destination).map_err(|err| FetchFailure::Fatal(err.to_string()))?;
        io::copy(&mut response, &mut file)
            .map_err(|err| FetchFailure::Transient(err.to_string()))?;
        Ok(())
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn classify_reqwest_error(err: reqwest::Error) -> FetchFailure {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        FetchFailure::Transient(err.to_string())
    } else {
        FetchFailure::Fatal(err.to_string())
    }
}

/// Anonymous FTP transfers. Each fetch opens its own control connection and
/// quits it before returning, so nothing is shared across retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct FtpFetcher;

impl FtpFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl Fetcher for FtpFetcher {
    fn fetch(&self, url: &str, destination: &Path) -> Result<(), FetchFailure> {
        let (host, path) = split_ftp_url(url)?;
        tracing::debug!(%host, %path, "ftp fetch");
        let mut stream = FtpStream::connect(format!("{host}:21"))
            .map_err(|err| FetchFailure::Transient(err.to_string()))?;
        let result = retrieve(&mut stream, &path, destination);
        let _ = stream.quit();
        result
    }
}

fn retrieve(stream: &mut FtpStream, path: &str, destination: &Path) -> Result<(), FetchFailure> {
    stream
        .login("anonymous", "anonymous")
        .map_err(|err| FetchFailure::Transient(err.to_string()))?;
    stream
        .transfer_type(FileType::Binary)
        .map_err(|err| FetchFailure::Transient(err.to_string()))?;
    let mut data = stream.retr_as_stream(path).map_err(classify_ftp_error)?;
    let mut file = File::create(destination).map_err(|err| FetchFailure::Fatal(err.to_string()))?;
    io::copy(&mut data, &mut file).map_err(|err| FetchFailure::Transient(err.to_string()))?;
    stream
        .finalize_retr_stream(data)
        .map_err(|err| FetchFailure::Transient(err.to_string()))?;
    Ok(())
}

fn classify_ftp_error(err: FtpError) -> FetchFailure {
    match &err {
        FtpError::UnexpectedResponse(response) if response.status == Status::FileUnavailable => {
            FetchFailure::Fatal(err.to_string())
        }
        _ => FetchFailure::Transient(err.to_string()),
    }
}

fn split_ftp_url(url: &str) -> Result<(String, String), FetchFailure> {
    let rest = url
        .strip_prefix("ftp://")
        .ok_or_else(|| FetchFailure::Fatal(format!("not an ftp url: {url}")))?;
    let (host, path) = rest
        .split_once('/')
        .ok_or_else(|| FetchFailure::Fatal(format!("no path in ftp url: {url}")))?;
    Ok((host.to_string(), format!("/{path}")))
}
