use std::future::Future;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::sync::Mutex;

use logcast_api::{day_key, LogFilter, LogRecord, LogStore, NewLogRecord, QUERY_LIMIT, StoreError};

use super::config::FileStoreConfig;

// ════════════════════════════════════════════════════════════════
//  FileLogStore
// ════════════════════════════════════════════════════════════════

/// Файловый LogStore с append-only семантикой.
///
/// Структура на диске:
/// ```text
/// {data_dir}/{YYYY-MM-DD}.jsonl
/// ```
/// Каждая строка: JSON LogRecord. Один файл на день (UTC, по timestamp
/// записи). Записи только добавляются, не обновляются.
pub struct FileLogStore {
    data_dir: PathBuf,
    sync_writes: bool,
    /// Serializes appends so concurrent inserts never interleave lines.
    write_lock: Mutex<()>,
}

impl FileLogStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            sync_writes: false,
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &FileStoreConfig) -> Self {
        let mut store = Self::new(&config.data_dir);
        store.sync_writes = config.sync_writes;
        store
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // ── Insert ──

    fn append_line(&self, line: &str, day: &str) -> Result<(), StoreError> {
        let path = self.data_dir.join(format!("{day}.jsonl"));
        std::fs::create_dir_all(&self.data_dir)
            .map_err(|e| StoreError::io(format!("mkdir {}: {e}", self.data_dir.display())))?;
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(format!("open {}: {e}", path.display())))?;
        writeln!(f, "{line}").map_err(|e| StoreError::io(format!("write: {e}")))?;
        if self.sync_writes {
            f.sync_data().map_err(|e| StoreError::io(format!("fsync: {e}")))?;
        }
        Ok(())
    }

    // ── Query ──

    fn do_query(&self, filter: &LogFilter) -> Result<Vec<LogRecord>, StoreError> {
        filter.validate()?;

        let mut result = Vec::new();
        for path in self.day_files(filter)? {
            let file = match std::fs::File::open(&path) {
                Ok(f) => f,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::io(format!("open {}: {e}", path.display()))),
            };
            let reader = std::io::BufReader::new(file);

            let mut file_records = Vec::new();
            for (lineno, line) in reader.lines().enumerate() {
                let line = line.map_err(|e| StoreError::io(format!("read {}: {e}", path.display())))?;
                if line.is_empty() {
                    continue;
                }
                let record: LogRecord = match serde_json::from_str(&line) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(
                            file = %path.display(),
                            line = lineno + 1,
                            error = %e,
                            "skipping corrupt log line"
                        );
                        continue;
                    }
                };
                if filter.matches(&record) {
                    file_records.push(record);
                }
            }
            // Later lines were appended later: newest insert first on ties.
            result.extend(file_records.into_iter().rev());

            // Older day files only hold older timestamps.
            if result.len() >= QUERY_LIMIT {
                break;
            }
        }

        result.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        result.truncate(QUERY_LIMIT);
        Ok(result)
    }

    /// Список файлов {date}.jsonl, пересекающихся с диапазоном фильтра,
    /// от новых к старым.
    fn day_files(&self, filter: &LogFilter) -> Result<Vec<PathBuf>, StoreError> {
        let dir = match std::fs::read_dir(&self.data_dir) {
            Ok(d) => d,
            // директории нет: пустой результат
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(format!("read_dir {}: {e}", self.data_dir.display()))),
        };

        let from_day = filter.from.map(day_key);
        let to_day = filter.to.map(day_key);

        let mut files = Vec::new();
        for entry in dir {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Some(day) = name.strip_suffix(".jsonl") else {
                continue;
            };
            if let Some(ref from) = from_day {
                if day < from.as_str() {
                    continue;
                }
            }
            if let Some(ref to) = to_day {
                if day > to.as_str() {
                    continue;
                }
            }
            files.push(entry.path());
        }
        files.sort_by(|a, b| b.cmp(a));
        Ok(files)
    }
}

// ════════════════════════════════════════════════════════════════
//  LogStore impl
// ════════════════════════════════════════════════════════════════

impl LogStore for FileLogStore {
    fn init(&self) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async move {
            std::fs::create_dir_all(&self.data_dir)
                .map_err(|e| StoreError::io(format!("mkdir {}: {e}", self.data_dir.display())))
        })
    }

    fn insert(
        &self,
        record: NewLogRecord,
    ) -> Pin<Box<dyn Future<Output = Result<LogRecord, StoreError>> + Send + '_>> {
        Box::pin(async move {
            let record = record.into_record(uuid::Uuid::new_v4().to_string());
            let line = serde_json::to_string(&record)
                .map_err(|e| StoreError::format_err(format!("json serialize: {e}")))?;
            let day = day_key(record.timestamp);

            let _guard = self.write_lock.lock().await;
            self.append_line(&line, &day)?;
            Ok(record)
        })
    }

    fn query(
        &self,
        filter: &LogFilter,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<LogRecord>, StoreError>> + Send + '_>> {
        let filter = filter.clone();
        Box::pin(async move { self.do_query(&filter) })
    }

    fn flush(&self) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        // Каждый insert открывает и закрывает файл, буферов нет.
        Box::pin(async { Ok(()) })
    }
}
