//! A filesystem backed line store.
//!
//! The [`Directory`] stores BOMs, module entities and translations under one
//! root:
//!
//! ```text
//! <root>/.bomview/config.toml
//! <root>/boms/<bom-id>/items.json
//! <root>/boms/<bom-id>/meta.json
//! <root>/modules/<module-id>.json
//! <root>/translations/<module-id>/<language>.json
//! ```
//!
//! It implements both [`BomSource`] and [`RecordSink`].

use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, instrument};
use walkdir::WalkDir;

use crate::{
    domain::{Config, FilterRecord, LineItem, TranslationOverlay},
    storage::source::{BomMeta, BomSource, FetchError, RecordSink, WriteError, is_valid_id},
};

const CONFIG_DIR: &str = ".bomview";
const BOMS_DIR: &str = "boms";
const MODULES_DIR: &str = "modules";
const TRANSLATIONS_DIR: &str = "translations";
const ITEMS_FILE: &str = "items.json";
const META_FILE: &str = "meta.json";

/// A filesystem backed store of BOMs, module entities and translations.
#[derive(Debug, Clone)]
pub struct Directory {
    /// The root of the directory everything is stored in.
    root: PathBuf,
}

impl Directory {
    /// Opens a directory. Nothing is read until data is requested.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The root path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the configuration file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        config_path(&self.root)
    }

    /// Loads the configuration, falling back to defaults.
    #[must_use]
    pub fn config(&self) -> Config {
        load_config(&self.root)
    }

    /// The directories created by [`Directory::init`].
    #[must_use]
    pub fn layout(&self) -> [PathBuf; 4] {
        [
            self.root.join(CONFIG_DIR),
            self.root.join(BOMS_DIR),
            self.root.join(MODULES_DIR),
            self.root.join(TRANSLATIONS_DIR),
        ]
    }

    /// Creates the directory layout and a default configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the directory is already initialized or cannot be written.
    pub fn init(&self) -> Result<(), String> {
        let config_path = self.config_path();
        if config_path.exists() {
            return Err(format!(
                "Directory already initialized (found existing {CONFIG_DIR}/config.toml)"
            ));
        }

        for dir in self.layout() {
            std::fs::create_dir_all(&dir)
                .map_err(|e| format!("Failed to create {}: {e}", dir.display()))?;
        }

        Config::default().save(&config_path)
    }

    /// Lists the BOMs that have an items file, sorted by id.
    #[must_use]
    pub fn bom_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = WalkDir::new(self.root.join(BOMS_DIR))
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file() && entry.file_name() == ITEMS_FILE)
            .filter_map(|entry| {
                entry
                    .path()
                    .parent()
                    .and_then(Path::file_name)
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
            })
            .filter(|id| is_valid_id(id))
            .collect();
        ids.sort_unstable();
        ids
    }

    fn bom_dir(&self, bom_id: &str) -> Result<PathBuf, FetchError> {
        checked(bom_id)?;
        Ok(self.root.join(BOMS_DIR).join(bom_id))
    }

    fn module_path(&self, module_id: &str) -> Option<PathBuf> {
        is_valid_id(module_id).then(|| {
            self.root
                .join(MODULES_DIR)
                .join(format!("{module_id}.json"))
        })
    }

    fn translation_path(&self, module_id: &str, language: &str) -> Result<PathBuf, FetchError> {
        checked(module_id)?;
        checked(language)?;
        Ok(self
            .root
            .join(TRANSLATIONS_DIR)
            .join(module_id)
            .join(format!("{language}.json")))
    }
}

#[async_trait]
impl BomSource for Directory {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_bom_meta(&self, bom_id: &str) -> Result<Option<BomMeta>, FetchError> {
        let dir = self.bom_dir(bom_id)?;
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(FetchError::BomNotFound(bom_id.to_string()));
        }
        read_json(&dir.join(META_FILE)).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn fetch_bom_items(&self, bom_id: &str) -> Result<Vec<LineItem>, FetchError> {
        let path = self.bom_dir(bom_id)?.join(ITEMS_FILE);
        let items: Vec<LineItem> = read_json(&path)
            .await?
            .ok_or_else(|| FetchError::BomNotFound(bom_id.to_string()))?;
        debug!(count = items.len(), "loaded line items");
        Ok(items)
    }

    #[instrument(level = "debug", skip(self))]
    async fn fetch_module_translation(
        &self,
        module_id: &str,
        language: &str,
    ) -> Result<Option<TranslationOverlay>, FetchError> {
        read_json(&self.translation_path(module_id, language)?).await
    }
}

#[async_trait]
impl RecordSink for Directory {
    #[instrument(level = "debug", skip(self, record))]
    async fn write_filter_record(
        &self,
        entity_id: &str,
        record: &FilterRecord,
    ) -> Result<(), WriteError> {
        let path = self
            .module_path(entity_id)
            .ok_or_else(|| WriteError::InvalidId(entity_id.to_string()))?;

        let mut entity = match read_json::<Value>(&path).await? {
            Some(Value::Object(entity)) => entity,
            Some(_) => return Err(WriteError::NotAnObject { path }),
            None => Map::new(),
        };

        let Value::Object(fields) = serde_json::to_value(record).map_err(WriteError::Encode)?
        else {
            return Err(WriteError::NotAnObject { path });
        };
        entity.extend(fields);

        let content =
            serde_json::to_vec_pretty(&Value::Object(entity)).map_err(WriteError::Encode)?;
        write_atomic(&path, &content)
            .await
            .map_err(|source| WriteError::Io { path, source })
    }

    #[instrument(level = "debug", skip(self))]
    async fn read_filter_record(
        &self,
        entity_id: &str,
    ) -> Result<Option<FilterRecord>, FetchError> {
        let path = self
            .module_path(entity_id)
            .ok_or_else(|| FetchError::InvalidId(entity_id.to_string()))?;
        read_json(&path).await
    }
}

fn checked(id: &str) -> Result<(), FetchError> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(FetchError::InvalidId(id.to_string()))
    }
}

/// Reads and decodes a JSON file. `None` if the file does not exist.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, FetchError> {
    let content = match fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(FetchError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_slice(&content)
        .map(Some)
        .map_err(|source| FetchError::Malformed {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes through a sibling temporary file so readers never see a partial
/// entity.
async fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    let result = match fs::write(&tmp, content).await {
        Ok(()) => fs::rename(&tmp, path).await,
        Err(error) => Err(error),
    };
    if result.is_err() {
        if let Err(error) = fs::remove_file(&tmp).await {
            debug!(path = %tmp.display(), %error, "failed to remove temporary file");
        }
    }
    result
}

fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join("config.toml")
}

fn load_config(root: &Path) -> Config {
    let path = config_path(root);
    Config::load(&path).unwrap_or_else(|e| {
        debug!("Failed to load config: {e}");
        Config::default()
    })
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeSet, time::Duration};

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::domain::{Column, FilterSettings, MatchType};

    fn setup_temp_directory() -> (TempDir, Directory) {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let dir = Directory::new(tmp.path().to_path_buf());
        dir.init().unwrap();
        (tmp, dir)
    }

    fn write(dir: &Directory, relative: &str, value: &Value) {
        let path = dir.root().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_vec(value).unwrap()).unwrap();
    }

    #[test]
    fn init_creates_layout_and_default_config() {
        let (_tmp, dir) = setup_temp_directory();

        for path in dir.layout() {
            assert!(path.is_dir(), "{} missing", path.display());
        }
        assert_eq!(dir.config(), Config::default());
        assert!(dir.init().is_err());
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let dir = Directory::new(tmp.path().to_path_buf());

        assert_eq!(dir.config().debounce(), Duration::from_millis(250));
    }

    #[test]
    fn bom_ids_lists_boms_with_items() {
        let (_tmp, dir) = setup_temp_directory();
        write(&dir, "boms/frame/items.json", &json!([]));
        write(&dir, "boms/axle/items.json", &json!([]));
        write(&dir, "boms/draft/meta.json", &json!({}));

        assert_eq!(dir.bom_ids(), vec!["axle", "frame"]);
    }

    #[tokio::test]
    async fn fetches_items_in_document_order() {
        let (_tmp, dir) = setup_temp_directory();
        write(
            &dir,
            "boms/frame/items.json",
            &json!([
                {"id": 1, "level": 0, "quantity": 1.0, "component": {"code": "A", "description": "Frame"}},
                {"id": 2, "level": 1, "quantity": 4.0, "component": {"code": "B", "description": "Bolt"}},
                {"id": 3, "level": 1, "quantity": 1.0}
            ]),
        );

        let items = dir.fetch_bom_items("frame").await.unwrap();

        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(items[2].component.is_none());
    }

    #[tokio::test]
    async fn unknown_bom_is_not_found() {
        let (_tmp, dir) = setup_temp_directory();

        assert!(matches!(
            dir.fetch_bom_items("nope").await,
            Err(FetchError::BomNotFound(id)) if id == "nope"
        ));
        assert!(matches!(
            dir.fetch_bom_meta("nope").await,
            Err(FetchError::BomNotFound(_))
        ));
    }

    #[tokio::test]
    async fn malformed_items_are_reported_with_their_path() {
        let (_tmp, dir) = setup_temp_directory();
        write(&dir, "boms/frame/items.json", &json!({"not": "a list"}));

        let error = dir.fetch_bom_items("frame").await.unwrap_err();

        assert!(error.to_string().contains("items.json"));
    }

    #[tokio::test]
    async fn path_segments_are_rejected() {
        let (_tmp, dir) = setup_temp_directory();

        assert!(matches!(
            dir.fetch_bom_items("../etc").await,
            Err(FetchError::InvalidId(_))
        ));
        assert!(matches!(
            dir.write_filter_record("a/b", &FilterRecord::default()).await,
            Err(WriteError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn meta_is_optional() {
        let (_tmp, dir) = setup_temp_directory();
        write(&dir, "boms/frame/items.json", &json!([]));

        assert_eq!(dir.fetch_bom_meta("frame").await.unwrap(), None);

        write(&dir, "boms/frame/meta.json", &json!({"name": "Frame"}));
        let meta = dir.fetch_bom_meta("frame").await.unwrap().unwrap();
        assert_eq!(meta.name.as_deref(), Some("Frame"));
    }

    #[tokio::test]
    async fn translation_is_loaded_per_language() {
        let (_tmp, dir) = setup_temp_directory();
        write(
            &dir,
            "translations/m1/de.json",
            &json!({"title": "Stückliste", "headers": {"quantity": "Menge"}}),
        );

        let de = dir.fetch_module_translation("m1", "de").await.unwrap();
        let fr = dir.fetch_module_translation("m1", "fr").await.unwrap();

        let expected = TranslationOverlay::default()
            .with_title("Stückliste")
            .with_header(Column::Quantity, "Menge");
        assert_eq!(de, Some(expected));
        assert_eq!(fr, None);
    }

    #[tokio::test]
    async fn writing_a_record_preserves_other_fields() {
        let (_tmp, dir) = setup_temp_directory();
        write(
            &dir,
            "modules/m1.json",
            &json!({"title": "Intro", "body": ["text"], "filteredComponentCodes": ["OLD"]}),
        );

        let codes = BTreeSet::from(["A".to_string(), "B".to_string()]);
        let settings = FilterSettings::enabled().with_code("A", MatchType::Equals);
        dir.write_filter_record("m1", &FilterRecord::new(settings.clone(), &codes))
            .await
            .unwrap();

        let content: Value =
            serde_json::from_slice(&std::fs::read(dir.root().join("modules/m1.json")).unwrap())
                .unwrap();
        assert_eq!(content["title"], "Intro");
        assert_eq!(content["body"], json!(["text"]));
        assert_eq!(content["filteredComponentCodes"], json!(["A", "B"]));

        let record = dir.read_filter_record("m1").await.unwrap().unwrap();
        assert_eq!(record.filter_settings, Some(settings));
        assert!(!dir.root().join("modules/m1.json.tmp").exists());
    }

    #[tokio::test]
    async fn writing_creates_a_missing_entity() {
        let (_tmp, dir) = setup_temp_directory();

        dir.write_filter_record("fresh", &FilterRecord::default())
            .await
            .unwrap();

        assert_eq!(
            dir.read_filter_record("fresh").await.unwrap(),
            Some(FilterRecord::default())
        );
        assert_eq!(dir.read_filter_record("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn non_object_entity_is_not_overwritten() {
        let (_tmp, dir) = setup_temp_directory();
        write(&dir, "modules/m1.json", &json!([1, 2, 3]));

        let result = dir.write_filter_record("m1", &FilterRecord::default()).await;

        assert!(matches!(result, Err(WriteError::NotAnObject { .. })));
        assert_eq!(
            std::fs::read_to_string(dir.root().join("modules/m1.json")).unwrap(),
            "[1,2,3]"
        );
    }

    #[tokio::test]
    async fn failed_write_leaves_no_temporary_file() {
        let (tmp, _dir) = setup_temp_directory();
        let target = tmp.path().join("occupied.json");
        std::fs::create_dir_all(target.join("child")).unwrap();

        assert!(write_atomic(&target, b"{}").await.is_err());
        assert!(!tmp.path().join("occupied.json.tmp").exists());
        assert!(target.is_dir());
    }
}
