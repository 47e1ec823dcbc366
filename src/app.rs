use std::fs;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::config::DEFAULT_MAX_RETRIES;
use crate::decompress::{Decompressor, compressed_suffix};
use crate::domain::ResolvedEpoch;
use crate::error::PppError;
use crate::manifest::{ManifestEntry, ProductId, build_manifest};
use crate::rename;
use crate::store::Store;
use crate::transport::{Fetcher, Scheme, scheme_of};

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub max_retries: u32,
    pub dry_run: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Fetched,
    Failed,
    DecompressionFailed,
    Planned,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryReport {
    pub product: ProductId,
    pub url: String,
    pub local_path: String,
    pub status: EntryStatus,
    pub failed_attempts: u32,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObservationReport {
    pub observation: String,
    pub directory_tag: Option<String>,
    pub entries: Vec<EntryReport>,
    pub error: Option<String>,
}

impl ObservationReport {
    fn skipped(observation: &str, error: &PppError) -> Self {
        Self {
            observation: observation.to_string(),
            directory_tag: None,
            entries: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn failed_entries(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| {
                matches!(
                    entry.status,
                    EntryStatus::Failed | EntryStatus::DecompressionFailed
                )
            })
            .count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub completed_at: String,
    pub observations: Vec<ObservationReport>,
}

impl FetchReport {
    pub fn total_failures(&self) -> usize {
        self.observations
            .iter()
            .map(|obs| obs.failed_entries() + usize::from(obs.error.is_some()))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenameStatus {
    Copied,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameEntry {
    pub long_name: String,
    pub short_name: Option<String>,
    pub status: RenameStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameReport {
    pub completed_at: String,
    pub target_dir: String,
    pub entries: Vec<RenameEntry>,
}

impl RenameReport {
    pub fn total_failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.status == RenameStatus::Failed)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct App<H: Fetcher, T: Fetcher, D: Decompressor> {
    store: Store,
    http: H,
    ftp: T,
    decompressor: D,
}

impl<H: Fetcher, T: Fetcher, D: Decompressor> App<H, T, D> {
    pub fn new(store: Store, http: H, ftp: T, decompressor: D) -> Self {
        Self {
            store,
            http,
            ftp,
            decompressor,
        }
    }

    pub fn fetch_folder(
        &self,
        folder: &Utf8Path,
        options: FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<FetchReport, PppError> {
        let names = list_observation_files(folder)?;
        if names.is_empty() {
            return Err(PppError::NoObservationFiles(
                folder.as_std_path().to_path_buf(),
            ));
        }
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; found {} observation files", names.len()),
            elapsed: None,
        });

        let mut observations = Vec::new();
        for name in &names {
            observations.push(self.fetch_observation(name, options, sink));
        }
        Ok(FetchReport {
            completed_at: iso_timestamp(),
            observations,
        })
    }

    pub fn fetch_observation(
        &self,
        observation: &str,
        options: FetchOptions,
        sink: &dyn ProgressSink,
    ) -> ObservationReport {
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; {observation}"),
            elapsed: None,
        });
        let epoch = match observation.parse::<ResolvedEpoch>() {
            Ok(epoch) => epoch,
            Err(err) => return ObservationReport::skipped(observation, &err),
        };

        let manifest = build_manifest(&epoch);
        if !options.dry_run {
            if let Err(err) = self.store.ensure_session_dirs(&epoch.directory_tag) {
                return ObservationReport::skipped(observation, &err);
            }
        }

        let mut entries = Vec::new();
        for entry in &manifest.entries {
            entries.push(self.fetch_entry(&epoch.directory_tag, entry, options, sink));
        }
        ObservationReport {
            observation: observation.to_string(),
            directory_tag: Some(epoch.directory_tag),
            entries,
            error: None,
        }
    }

    fn fetch_entry(
        &self,
        directory_tag: &str,
        entry: &ManifestEntry,
        options: FetchOptions,
        sink: &dyn ProgressSink,
    ) -> EntryReport {
        let dest = self
            .store
            .product_path(directory_tag, entry.subdir, &entry.filename);
        let report = |status, failed_attempts, error: Option<String>| EntryReport {
            product: entry.product,
            url: entry.url.clone(),
            local_path: dest.to_string(),
            status,
            failed_attempts,
            error,
        };

        if options.dry_run {
            return report(EntryStatus::Planned, 0, None);
        }

        sink.event(ProgressEvent {
            message: format!("phase=Fetch; {}", entry.url),
            elapsed: None,
        });

        let fetcher: &dyn Fetcher = match scheme_of(&entry.url) {
            Some(Scheme::Http) => &self.http,
            Some(Scheme::Ftp) => &self.ftp,
            None => {
                return report(
                    EntryStatus::Failed,
                    0,
                    Some(format!("unsupported scheme in {}", entry.url)),
                );
            }
        };

        let start = Instant::now();
        let mut failed_attempts = 0u32;
        match self.transfer(fetcher, entry, &dest, options, &mut failed_attempts, sink) {
            Ok(()) => {}
            Err(err) => {
                return report(EntryStatus::Failed, failed_attempts, Some(err.to_string()));
            }
        }
        sink.event(ProgressEvent {
            message: format!("transfer.done {}", entry.filename),
            elapsed: Some(start.elapsed()),
        });

        if compressed_suffix(&entry.filename).is_some() {
            match self.decompressor.decompress(dest.as_std_path()) {
                Ok(unpacked) => {
                    sink.event(ProgressEvent {
                        message: format!("phase=Decompress; {}", unpacked.display()),
                        elapsed: None,
                    });
                }
                Err(err) => {
                    return report(
                        EntryStatus::DecompressionFailed,
                        failed_attempts,
                        Some(err.to_string()),
                    );
                }
            }
        }
        report(EntryStatus::Fetched, failed_attempts, None)
    }

    // Downloads into a temp file next to the destination so an interrupted
    // transfer never leaves a truncated file at the product's path.
    fn transfer(
        &self,
        fetcher: &dyn Fetcher,
        entry: &ManifestEntry,
        dest: &Utf8Path,
        options: FetchOptions,
        failed_attempts: &mut u32,
        sink: &dyn ProgressSink,
    ) -> Result<(), PppError> {
        let parent = dest
            .parent()
            .ok_or_else(|| PppError::Filesystem("invalid destination path".to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix("ppp-pm-dl")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| PppError::Filesystem(err.to_string()))?;

        loop {
            match fetcher.fetch(&entry.url, temp.path()) {
                Ok(()) => break,
                Err(failure) => {
                    *failed_attempts += 1;
                    sink.event(ProgressEvent {
                        message: format!(
                            "fetch.retry attempt={} url={}",
                            failed_attempts, entry.url
                        ),
                        elapsed: None,
                    });
                    if !failure.is_transient() || *failed_attempts > options.max_retries {
                        return Err(PppError::TransferFailed {
                            url: entry.url.clone(),
                            attempts: *failed_attempts,
                            message: failure.message().to_string(),
                        });
                    }
                }
            }
        }

        if dest.as_std_path().exists() {
            fs::remove_file(dest.as_std_path())
                .map_err(|err| PppError::Filesystem(err.to_string()))?;
        }
        temp.persist(dest.as_std_path())
            .map_err(|err| PppError::Filesystem(err.to_string()))?;
        Ok(())
    }

    pub fn rename_folder(
        &self,
        folder: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<RenameReport, PppError> {
        let names = list_long_names(folder)?;
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; found {} long-name files", names.len()),
            elapsed: None,
        });

        let target_dir = Store::short_dir(folder);
        fs::create_dir_all(target_dir.as_std_path())
            .map_err(|err| PppError::Filesystem(err.to_string()))?;

        let mut entries = Vec::new();
        for name in &names {
            entries.push(rename_one(folder, &target_dir, name, sink));
        }
        Ok(RenameReport {
            completed_at: iso_timestamp(),
            target_dir: target_dir.to_string(),
            entries,
        })
    }
}

fn rename_one(
    folder: &Utf8Path,
    target_dir: &Utf8Path,
    name: &str,
    sink: &dyn ProgressSink,
) -> RenameEntry {
    let short = match rename::to_short_name(name) {
        Ok(short) => short,
        Err(err) => {
            return RenameEntry {
                long_name: name.to_string(),
                short_name: None,
                status: RenameStatus::Failed,
                error: Some(err.to_string()),
            };
        }
    };
    sink.event(ProgressEvent {
        message: format!("phase=Copy; {name} -> {short}"),
        elapsed: None,
    });
    match Store::copy_file_atomic(&folder.join(name), &target_dir.join(&short)) {
        Ok(()) => RenameEntry {
            long_name: name.to_string(),
            short_name: Some(short),
            status: RenameStatus::Copied,
            error: None,
        },
        Err(err) => RenameEntry {
            long_name: name.to_string(),
            short_name: Some(short),
            status: RenameStatus::Failed,
            error: Some(err.to_string()),
        },
    }
}

fn list_files(folder: &Utf8Path) -> Result<Vec<String>, PppError> {
    let entries = fs::read_dir(folder.as_std_path())
        .map_err(|err| PppError::Filesystem(format!("{folder}: {err}")))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| PppError::Filesystem(err.to_string()))?;
        if !entry.path().is_file() {
            continue;
        }
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

fn list_observation_files(folder: &Utf8Path) -> Result<Vec<String>, PppError> {
    Ok(list_files(folder)?
        .into_iter()
        .filter(|name| is_observation_name(name))
        .collect())
}

fn list_long_names(folder: &Utf8Path) -> Result<Vec<String>, PppError> {
    Ok(list_files(folder)?
        .into_iter()
        .filter(|name| rename::classify(name).is_some())
        .collect())
}

// Observation files carry an 'O' type flag: the last character in the
// legacy dialect, the fifth-from-last in the long dialect (..._MO.rnx).
fn is_observation_name(name: &str) -> bool {
    if !name.is_ascii() {
        return false;
    }
    if name.len() == 12 {
        return name.ends_with('o') || name.ends_with('O');
    }
    if name.ends_with(".rnx") && name.len() >= 5 {
        return name.as_bytes()[name.len() - 5].eq_ignore_ascii_case(&b'O');
    }
    false
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
