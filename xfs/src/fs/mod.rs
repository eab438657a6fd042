//! File access facade.
//!
//! [`XFilesystem`] is the single entry point for reading and dumping
//! structured files:
//!
//! ```text
//! read_file ──▶ charset::decode ──▶ codec::parse_with_mode ──▶ CsvData
//!           └─▶ formats::{json,yaml,native}::decode ──▶ Value / T
//! Value / T ──▶ codec::dump | formats::*::encode ──▶ dump_file (atomic)
//! ```
//!
//! Local paths and, when enabled, `http(s)://` URLs are accepted as
//! sources. Dumps always target local paths.

pub mod remote;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::codec::{self, CsvData, CsvDialect, CsvOptions, CsvTable, DumpMode, ParseMode};
use crate::config::Settings;
use crate::error::{FsError, FsResult, Missing, XfsResult};
use crate::formats::{json, native, yaml, JsonStyle};
use crate::resolver::{GlobFlags, GlobResolver};

pub use remote::{is_remote, RemoteReader};

/// Reads and dumps CSV, JSON, YAML, TOML and plain files.
#[derive(Debug, Clone)]
pub struct XFilesystem {
    remote_allowed: bool,
    remote: RemoteReader,
    resolver: GlobResolver,
}

impl Default for XFilesystem {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl XFilesystem {
    /// Facade with default settings; remote reads are disabled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            remote_allowed: settings.allow_remote,
            remote: RemoteReader::new(settings.user_agent.clone(), settings.http_timeout),
            resolver: GlobResolver::new(),
        }
    }

    /// Enable or disable reads from `http://` and `https://` URLs.
    pub fn set_remote_allowed(&mut self, allowed: bool) {
        self.remote_allowed = allowed;
    }

    pub fn is_remote_allowed(&self) -> bool {
        self.remote_allowed
    }

    // =========================================================================
    // Raw access
    // =========================================================================

    /// Read the raw contents of a local file or, when allowed, a URL.
    ///
    /// With remote reads disabled a URL is treated as a local path and
    /// therefore ends in [`FsError::NotFound`].
    pub fn read_file(&self, location: impl AsRef<Path>) -> FsResult<Vec<u8>> {
        let location = location.as_ref();

        if self.remote_allowed {
            if let Some(url) = location.to_str().filter(|s| is_remote(s)) {
                return self.remote.fetch(url);
            }
        }

        let metadata = std::fs::metadata(location).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FsError::NotFound {
                path: location.to_path_buf(),
                kind: Missing::Absent,
            },
            _ => FsError::NotReadable {
                path: location.to_path_buf(),
                source: e,
            },
        })?;
        if !metadata.is_file() {
            return Err(FsError::NotFound {
                path: location.to_path_buf(),
                kind: Missing::NotAFile,
            });
        }

        let bytes = std::fs::read(location).map_err(|e| FsError::NotReadable {
            path: location.to_path_buf(),
            source: e,
        })?;
        debug!(path = %location.display(), bytes = bytes.len(), "read file");
        Ok(bytes)
    }

    /// Read a file as UTF-8 text.
    pub fn read_to_string(&self, location: impl AsRef<Path>) -> XfsResult<String> {
        let bytes = self.read_file(location)?;
        codec::decode(&bytes, "UTF-8")
    }

    /// Write `contents` to `path`, creating parent directories.
    ///
    /// The bytes go to a temporary file next to the target which is then
    /// renamed over it, so readers never observe a partial file.
    pub fn dump_file(&self, path: impl AsRef<Path>, contents: &[u8]) -> FsResult<()> {
        let path = path.as_ref();
        let write_error = |source| FsError::WriteError {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(write_error)?;

        let mut file = NamedTempFile::new_in(parent).map_err(write_error)?;
        file.write_all(contents).map_err(write_error)?;
        file.flush().map_err(write_error)?;
        file.persist(path).map_err(|e| write_error(e.error))?;

        debug!(path = %path.display(), bytes = contents.len(), "dumped file");
        Ok(())
    }

    // =========================================================================
    // CSV
    // =========================================================================

    /// Read a CSV file and structure it according to `mode`.
    ///
    /// The contents are transcoded from `options.charset` first. Column
    /// count errors name the canonical path of the file.
    pub fn read_csv_file(
        &self,
        location: impl AsRef<Path>,
        mode: ParseMode,
        options: &CsvOptions,
    ) -> XfsResult<CsvData> {
        let location = location.as_ref();
        options.dialect.validate()?;

        let bytes = self.read_file(location)?;
        let text = codec::decode(&bytes, &options.charset)?;
        let source = source_name(location);

        Ok(codec::parse_with_mode(&text, &options.dialect, &source, mode)?)
    }

    /// Dump rows or records to a CSV file.
    pub fn dump_csv_file(
        &self,
        path: impl AsRef<Path>,
        data: &[Value],
        dialect: &CsvDialect,
        mode: DumpMode,
    ) -> XfsResult<()> {
        let path = path.as_ref();
        dialect.validate()?;

        let text = codec::dump(data, dialect, mode, &path.display().to_string())?;
        Ok(self.dump_file(path, text.as_bytes())?)
    }

    /// Dump an already shaped table to a CSV file.
    pub fn dump_csv_table(
        &self,
        path: impl AsRef<Path>,
        table: &CsvTable,
        dialect: &CsvDialect,
    ) -> XfsResult<()> {
        let path = path.as_ref();
        dialect.validate()?;

        let text = codec::encode_table(table, dialect, &path.display().to_string())?;
        Ok(self.dump_file(path, text.as_bytes())?)
    }

    // =========================================================================
    // JSON / YAML / TOML
    // =========================================================================

    pub fn read_json_file(&self, location: impl AsRef<Path>) -> XfsResult<Value> {
        self.read_json_file_as(location)
    }

    pub fn read_json_file_as<T: DeserializeOwned>(&self, location: impl AsRef<Path>) -> XfsResult<T> {
        let text = self.read_to_string(location)?;
        Ok(json::decode(&text)?)
    }

    pub fn dump_json_file<T: Serialize + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        data: &T,
        style: JsonStyle,
    ) -> XfsResult<()> {
        let text = json::encode(data, style)?;
        Ok(self.dump_file(path, text.as_bytes())?)
    }

    pub fn read_yaml_file(&self, location: impl AsRef<Path>) -> XfsResult<Value> {
        self.read_yaml_file_as(location)
    }

    pub fn read_yaml_file_as<T: DeserializeOwned>(&self, location: impl AsRef<Path>) -> XfsResult<T> {
        let text = self.read_to_string(location)?;
        Ok(yaml::decode(&text)?)
    }

    pub fn dump_yaml_file<T: Serialize + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        data: &T,
    ) -> XfsResult<()> {
        let text = yaml::encode(data)?;
        Ok(self.dump_file(path, text.as_bytes())?)
    }

    pub fn read_toml_file(&self, location: impl AsRef<Path>) -> XfsResult<Value> {
        self.read_toml_file_as(location)
    }

    pub fn read_toml_file_as<T: DeserializeOwned>(&self, location: impl AsRef<Path>) -> XfsResult<T> {
        let text = self.read_to_string(location)?;
        Ok(native::decode(&text)?)
    }

    /// Dump `data` as TOML; the top level must serialize to a table.
    pub fn dump_toml_file<T: Serialize + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        data: &T,
    ) -> XfsResult<()> {
        let text = native::encode(data)?;
        Ok(self.dump_file(path, text.as_bytes())?)
    }

    // =========================================================================
    // Glob
    // =========================================================================

    /// Find paths matching `pattern`, which may contain `**` segments.
    pub fn glob(&self, pattern: &str, flags: GlobFlags) -> XfsResult<Vec<PathBuf>> {
        Ok(self.resolver.resolve(pattern, flags)?)
    }
}

/// Canonical path of a local file, or the location as given.
fn source_name(location: &Path) -> String {
    location
        .canonicalize()
        .unwrap_or_else(|_| location.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CsvError, FormatError, XfsError};
    use serde::Deserialize;
    use serde_json::json;
    use std::io::Read;
    use std::net::TcpListener;
    use tempfile::TempDir;

    const FAMILY: &str = "name,birthday,profession\nJohn,1992-02-08,Teacher\nJane,1994-03-22,Developer\nCharly,2016-11-11,\n";

    fn family_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("family.csv");
        std::fs::write(&path, FAMILY).unwrap();
        path
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let xfs = XFilesystem::new();

        let err = xfs.read_file(dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, FsError::NotFound { kind: Missing::Absent, .. }));

        let err = xfs.read_file(dir.path()).unwrap_err();
        assert!(matches!(err, FsError::NotFound { kind: Missing::NotAFile, .. }));
    }

    #[test]
    fn test_url_without_remote_is_local_path() {
        let xfs = XFilesystem::new();
        assert!(!xfs.is_remote_allowed());

        let err = xfs.read_file("http://127.0.0.1:9/family.csv").unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn test_remote_read_sends_user_agent() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                FAMILY.len(),
                FAMILY
            )
            .unwrap();
            String::from_utf8_lossy(&request).to_ascii_lowercase()
        });

        let settings = Settings {
            user_agent: "xfs-test/1.0".to_string(),
            ..Settings::default()
        };
        let mut xfs = XFilesystem::from_settings(&settings);
        xfs.set_remote_allowed(true);

        let body = xfs
            .read_file(format!("http://{}/family.csv", addr))
            .unwrap();
        assert_eq!(body, FAMILY.as_bytes());

        let request = server.join().unwrap();
        assert!(request.starts_with("get /family.csv http/1.1"));
        assert!(request.contains("user-agent: xfs-test/1.0\r\n"));
    }

    #[test]
    fn test_dump_file_creates_parents() {
        let dir = TempDir::new().unwrap();
        let xfs = XFilesystem::new();
        let path = dir.path().join("deep/er/out.txt");

        xfs.dump_file(&path, b"first").unwrap();
        xfs.dump_file(&path, b"second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        // No temporary file left behind
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_dump_file_onto_directory_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("taken")).unwrap();

        let err = XFilesystem::new()
            .dump_file(dir.path().join("taken"), b"x")
            .unwrap_err();
        assert!(matches!(err, FsError::WriteError { .. }));
    }

    #[test]
    fn test_family_round_trip() {
        let dir = TempDir::new().unwrap();
        let xfs = XFilesystem::new();
        let input = family_file(&dir);

        let rows = xfs
            .read_csv_file(&input, ParseMode::Array, &CsvOptions::default())
            .unwrap();
        assert_eq!(rows.len(), 4);

        let records = xfs
            .read_csv_file(&input, ParseMode::Object, &CsvOptions::default())
            .unwrap();
        assert_eq!(records.len(), 3);

        let output = dir.path().join("copy.csv");
        let CsvData::Objects(objects) = records else {
            panic!("expected objects");
        };
        xfs.dump_csv_file(&output, &objects, &CsvDialect::default(), DumpMode::Detect)
            .unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), FAMILY);

        let output = dir.path().join("rows.csv");
        let CsvData::Rows(rows) = rows else {
            panic!("expected rows");
        };
        xfs.dump_csv_table(&output, &CsvTable::Rows(rows), &CsvDialect::default())
            .unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), FAMILY);
    }

    #[test]
    fn test_column_mismatch_names_canonical_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, "a,b\n1,2\n3\n").unwrap();

        let err = XFilesystem::new()
            .read_csv_file(&path, ParseMode::Assoc, &CsvOptions::default())
            .unwrap_err();

        let XfsError::Csv(CsvError::ColumnCountMismatch { file, row, .. }) = err else {
            panic!("expected a column count mismatch, got {:?}", err);
        };
        assert_eq!(row, 3);
        assert_eq!(file, path.canonicalize().unwrap().display().to_string());
    }

    #[test]
    fn test_latin1_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin1.csv");
        // "name\nSociété" in ISO-8859-1
        std::fs::write(&path, b"name\nSoci\xE9t\xE9\n").unwrap();
        let xfs = XFilesystem::new();

        let options = CsvOptions::default().charset("iso-8859-1");
        let data = xfs.read_csv_file(&path, ParseMode::Assoc, &options).unwrap();
        let CsvData::Records(records) = data else {
            panic!("expected records");
        };
        assert_eq!(records[0]["name"], "Société");

        let err = xfs
            .read_csv_file(&path, ParseMode::Assoc, &CsvOptions::default())
            .unwrap_err();
        assert!(matches!(err, XfsError::Encoding(_)));
    }

    #[test]
    fn test_invalid_dialect_is_rejected() {
        let dir = TempDir::new().unwrap();
        let input = family_file(&dir);
        let dialect = CsvDialect::with_delimiter("\"");

        let err = XFilesystem::new()
            .read_csv_file(&input, ParseMode::Array, &CsvOptions::with_dialect(dialect))
            .unwrap_err();
        assert!(matches!(err, XfsError::Csv(CsvError::InvalidDialect(_))));
    }

    #[test]
    fn test_multi_char_delimiter_dump() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipes.csv");
        let xfs = XFilesystem::new();

        xfs.dump_csv_file(
            &path,
            &[json!(["a||b", "c"])],
            &CsvDialect::with_delimiter("||"),
            DumpMode::Plain,
        )
        .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "\"a||b\"||c\n");
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        name: String,
        age: u32,
    }

    #[test]
    fn test_json_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("people.json");
        let xfs = XFilesystem::new();
        let data = json!([{ "name": "Jane", "age": 30 }]);

        xfs.dump_json_file(&path, &data, JsonStyle::Pretty).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n    {\n        \"name\""));
        assert!(!text.ends_with('\n'));

        assert_eq!(xfs.read_json_file(&path).unwrap(), data);
        let people: Vec<Person> = xfs.read_json_file_as(&path).unwrap();
        assert_eq!(people, vec![Person { name: "Jane".into(), age: 30 }]);
    }

    #[test]
    fn test_yaml_and_toml_files() {
        let dir = TempDir::new().unwrap();
        let xfs = XFilesystem::new();
        let data = json!({ "name": "Jane", "age": 30 });

        let yaml_path = dir.path().join("person.yaml");
        xfs.dump_yaml_file(&yaml_path, &data).unwrap();
        assert_eq!(xfs.read_yaml_file(&yaml_path).unwrap(), data);

        let toml_path = dir.path().join("person.toml");
        xfs.dump_toml_file(&toml_path, &data).unwrap();
        let person: Person = xfs.read_toml_file_as(&toml_path).unwrap();
        assert_eq!(person.age, 30);

        let err = xfs.dump_toml_file(&toml_path, &json!([1, 2])).unwrap_err();
        assert!(matches!(err, XfsError::Format(FormatError::TomlEncode(_))));
    }

    #[test]
    fn test_glob_through_facade() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        std::fs::write(dir.path().join("a/x.txt"), "").unwrap();
        std::fs::write(dir.path().join("a/b/c/x.txt"), "").unwrap();

        let pattern = format!("{}/a/**/x.txt", dir.path().display());
        let matches = XFilesystem::new().glob(&pattern, GlobFlags::NONE).unwrap();

        assert_eq!(
            matches,
            vec![dir.path().join("a/b/c/x.txt"), dir.path().join("a/x.txt")]
        );
    }
}
