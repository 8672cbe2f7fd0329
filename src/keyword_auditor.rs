use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::args::AuditArgs;
use crate::models::{write_table, KeywordRow};
use crate::Result;

/// Settings for one keyword audit.
#[derive(Debug, Clone)]
pub struct AuditorConfig {
    pub directory: String,
    pub keyword: String,
    pub output_path: String,
}

impl From<&AuditArgs> for AuditorConfig {
    fn from(args: &AuditArgs) -> Self {
        AuditorConfig {
            directory: args.dir.clone(),
            keyword: args.keyword.clone(),
            output_path: args.output.clone(),
        }
    }
}

/// Case-sensitive substring test over a file's UTF-8 text.
///
/// Any read or decode failure counts as the keyword being absent.
pub fn file_contains(path: &Path, keyword: &str) -> bool {
    match fs::read_to_string(path) {
        Ok(text) => text.contains(keyword),
        Err(e) => {
            debug!("Treating unreadable {} as keyword-free: {}", path.display(), e);
            false
        }
    }
}

/// One row per file under `directory`, recursively, in file-name order.
///
/// Rows are keyed by file stem, so equal stems in different
/// subdirectories produce repeated names.
pub fn scan_directory(directory: &Path, keyword: &str) -> Vec<KeywordRow> {
    let mut rows = Vec::new();

    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        // Links are not followed; a link to a directory is skipped, any
        // other link (dangling included) is a file.
        if entry.file_type().is_dir() || (entry.path_is_symlink() && entry.path().is_dir()) {
            continue;
        }

        let file_name = entry
            .path()
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let contains = file_contains(entry.path(), keyword);

        rows.push(KeywordRow {
            file_name,
            contains_keyword: u8::from(contains),
        });
    }

    rows
}

/// Scans the download directory and writes the keyword table.
pub struct KeywordAuditor {
    config: AuditorConfig,
}

impl KeywordAuditor {
    pub fn new(config: AuditorConfig) -> Self {
        KeywordAuditor { config }
    }

    pub fn run(&self) -> Result<Vec<KeywordRow>> {
        let rows = scan_directory(Path::new(&self.config.directory), &self.config.keyword);
        let hits = rows.iter().filter(|row| row.contains_keyword == 1).count();

        write_table(&self.config.output_path, &KeywordRow::HEADERS, &rows)?;
        info!(
            "{} of {} files contain '{}'; wrote '{}'",
            hits,
            rows.len(),
            self.config.keyword,
            self.config.output_path
        );
        Ok(rows)
    }
}
