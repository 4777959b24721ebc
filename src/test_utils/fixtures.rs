//! Fixture builders: jar files with controlled timestamps, local repositories
//! and project descriptors.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use tempfile::TempDir;

use crate::archive::extra::encode;

/// One entry of a [`JarBuilder`] archive.
#[derive(Debug, Clone)]
pub struct JarEntry {
    name: String,
    contents: Vec<u8>,
    local_extra: Vec<u8>,
    central_extra: Vec<u8>,
    /// DOS date and time; zero is no valid stamp at all.
    dos_date: u16,
    dos_time: u16,
}

impl JarEntry {
    #[must_use]
    pub fn file(name: &str) -> Self {
        Self {
            name: name.to_string(),
            contents: Vec::new(),
            local_extra: Vec::new(),
            central_extra: Vec::new(),
            dos_date: 0,
            dos_time: 0,
        }
    }

    #[must_use]
    pub fn directory(name: &str) -> Self {
        let name = if name.ends_with('/') {
            name.to_string()
        } else {
            format!("{name}/")
        };
        Self::file(&name)
    }

    #[must_use]
    pub fn contents(mut self, contents: &str) -> Self {
        self.contents = contents.as_bytes().to_vec();
        self
    }

    /// DOS modification stamp in both headers, as local wall-clock time.
    #[must_use]
    pub fn modified(mut self, modified: DateTime<Utc>) -> Self {
        let wall = modified.with_timezone(&Local);
        let field = |value: u32| u16::try_from(value).expect("DOS field fits in u16");
        let year = u16::try_from(wall.year() - 1980).expect("DOS stamps start in 1980");
        self.dos_date = (year << 9) | (field(wall.month()) << 5) | field(wall.day());
        self.dos_time =
            (field(wall.hour()) << 11) | (field(wall.minute()) << 5) | field(wall.second() / 2);
        self
    }

    /// Extra data appended verbatim to the central directory record.
    #[must_use]
    pub fn raw_central_extra(mut self, extra: &[u8]) -> Self {
        self.central_extra.extend_from_slice(extra);
        self
    }

    /// NTFS creation time in the central directory, as written by Windows
    /// archivers. Visible to both the index and the mounted view.
    #[must_use]
    pub fn central_created(mut self, created: DateTime<Utc>) -> Self {
        self.central_extra
            .extend(encode::ntfs(Some(created), None, Some(created)));
        self
    }

    /// Extended timestamp with a creation time in the local header only; the
    /// central copy keeps just the modification time, as Info-ZIP does.
    #[must_use]
    pub fn local_created(mut self, created: DateTime<Utc>) -> Self {
        let local = encode::extended_timestamp(Some(created), None, Some(created));
        let mut central = local[..9].to_vec();
        central[2] = 5;
        central[3] = 0;
        self.local_extra.extend(local);
        self.central_extra.extend(central);
        self
    }
}

/// Writes stored (uncompressed) zip archives byte by byte so tests can place
/// extra fields in either header.
#[derive(Debug, Clone, Default)]
pub struct JarBuilder {
    entries: Vec<JarEntry>,
}

impl JarBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entry(mut self, entry: JarEntry) -> Self {
        self.entries.push(entry);
        self
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for entry in &self.entries {
            let offset = len32(out.len());
            let crc = crc32(&entry.contents);
            let size = len32(entry.contents.len());
            let name = entry.name.as_bytes();

            put32(&mut out, 0x0403_4b50);
            put16(&mut out, 10);
            put16(&mut out, 0);
            put16(&mut out, 0);
            put16(&mut out, entry.dos_time);
            put16(&mut out, entry.dos_date);
            put32(&mut out, crc);
            put32(&mut out, size);
            put32(&mut out, size);
            put16(&mut out, len16(name.len()));
            put16(&mut out, len16(entry.local_extra.len()));
            out.extend_from_slice(name);
            out.extend_from_slice(&entry.local_extra);
            out.extend_from_slice(&entry.contents);

            put32(&mut central, 0x0201_4b50);
            put16(&mut central, 20);
            put16(&mut central, 10);
            put16(&mut central, 0);
            put16(&mut central, 0);
            put16(&mut central, entry.dos_time);
            put16(&mut central, entry.dos_date);
            put32(&mut central, crc);
            put32(&mut central, size);
            put32(&mut central, size);
            put16(&mut central, len16(name.len()));
            put16(&mut central, len16(entry.central_extra.len()));
            put16(&mut central, 0);
            put16(&mut central, 0);
            put16(&mut central, 0);
            put32(&mut central, if entry.name.ends_with('/') { 0x10 } else { 0 });
            put32(&mut central, offset);
            central.extend_from_slice(name);
            central.extend_from_slice(&entry.central_extra);
        }

        let central_offset = len32(out.len());
        let central_size = len32(central.len());
        let count = len16(self.entries.len());
        out.extend_from_slice(&central);

        put32(&mut out, 0x0605_4b50);
        put16(&mut out, 0);
        put16(&mut out, 0);
        put16(&mut out, count);
        put16(&mut out, count);
        put32(&mut out, central_size);
        put32(&mut out, central_offset);
        put16(&mut out, 0);
        out
    }

    /// Write the archive, creating parent directories.
    #[must_use]
    pub fn write_to(&self, path: &Path) -> PathBuf {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create jar parent dirs");
        }
        std::fs::write(path, self.to_bytes()).expect("write jar");
        path.to_path_buf()
    }
}

/// Isolated project directory plus a local repository next to it.
pub struct ProjectFixture {
    pub temp_dir: TempDir,
    pub project_dir: PathBuf,
    pub repository: PathBuf,
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let project_dir = temp_dir.path().join("project");
        let repository = temp_dir.path().join("repository");
        std::fs::create_dir_all(&project_dir).expect("create project dir");
        std::fs::create_dir_all(&repository).expect("create repository dir");
        Self {
            temp_dir,
            project_dir,
            repository,
        }
    }

    #[must_use]
    pub fn descriptor_path(&self) -> PathBuf {
        self.project_dir.join("depage.toml")
    }

    /// Write `depage.toml` with the given `[[dependencies]]` blocks.
    #[must_use]
    pub fn write_descriptor(&self, dependencies: &str) -> PathBuf {
        let content = format!(
            "[project]\ngroup = \"com.example\"\nname = \"app\"\nversion = \"1.0.0\"\n\n{dependencies}"
        );
        let path = self.descriptor_path();
        std::fs::write(&path, content).expect("write descriptor");
        path
    }

    /// Repository path of an artifact file.
    #[must_use]
    pub fn artifact_path(&self, group: &str, name: &str, version: &str, extension: &str) -> PathBuf {
        self.repository
            .join(group.replace('.', "/"))
            .join(name)
            .join(version)
            .join(format!("{name}-{version}.{extension}"))
    }

    #[must_use]
    pub fn install_jar(&self, group: &str, name: &str, version: &str, jar: &JarBuilder) -> PathBuf {
        jar.write_to(&self.artifact_path(group, name, version, "jar"))
    }

    #[must_use]
    pub fn install_file(
        &self,
        group: &str,
        name: &str,
        version: &str,
        extension: &str,
        contents: &str,
    ) -> PathBuf {
        let path = self.artifact_path(group, name, version, extension);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create artifact dir");
        }
        std::fs::write(&path, contents).expect("write artifact");
        path
    }

    /// Descriptor of an installed artifact, listing its own dependencies.
    #[must_use]
    pub fn install_artifact_descriptor(
        &self,
        group: &str,
        name: &str,
        version: &str,
        dependencies: &str,
    ) -> PathBuf {
        let content = format!(
            "[project]\ngroup = \"{group}\"\nname = \"{name}\"\nversion = \"{version}\"\n\n{dependencies}"
        );
        self.install_file(group, name, version, "depage.toml", &content)
    }
}

fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xffff_ffffu32;
    for &byte in bytes {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xedb8_8320 & mask);
        }
    }
    !crc
}

fn put16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn len16(len: usize) -> u16 {
    u16::try_from(len).expect("fixture field fits in u16")
}

fn len32(len: usize) -> u32 {
    u32::try_from(len).expect("fixture size fits in u32")
}
