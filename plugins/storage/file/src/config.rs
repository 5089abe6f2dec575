// ════════════════════════════════════════════════════════════════
//  Configuration
// ════════════════════════════════════════════════════════════════

/// Настройки файлового хранилища.
///
/// ```toml
/// [storage]
/// kind = "file"
/// data_dir = "./data/logs"
/// sync_writes = true
/// ```
#[derive(Debug, Clone, serde::Deserialize)]
pub struct FileStoreConfig {
    pub data_dir: String,
    /// fsync после каждой записи. Медленнее, но запись переживает
    /// падение ОС, а не только процесса.
    #[serde(default)]
    pub sync_writes: bool,
}
