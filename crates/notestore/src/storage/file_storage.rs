use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct DataPath {
    base: PathBuf,
}

impl DataPath {
    pub fn new(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref().to_path_buf();
        Self { base }
    }

    pub fn default_base() -> Option<PathBuf> {
        dirs::data_local_dir().map(|pb| pb.join("notestore"))
    }

    pub fn default_base_or_cwd() -> PathBuf {
        Self::default_base().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn rel_path(&self, typ: DataPathType) -> PathBuf {
        match typ {
            DataPathType::Log => PathBuf::from("logs"),
            DataPathType::Setting => PathBuf::from("settings"),
            DataPathType::Notes => PathBuf::from("notes"),
            DataPathType::Backup => PathBuf::from("backup"),
        }
    }

    pub fn path(&self, typ: DataPathType) -> PathBuf {
        self.base.join(self.rel_path(typ))
    }
}

impl Default for DataPath {
    fn default() -> Self {
        Self::new(Self::default_base_or_cwd())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPathType {
    Log,
    Setting,
    Notes,
    /// Local stand-in for the remote backup database
    Backup,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Directory {
    pub file_path: PathBuf,
}

impl Directory {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    /// Names of the regular files in this directory. A missing directory has no files.
    pub fn get_file_names(&self) -> Result<Vec<String>> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }

        let dir = fs::read_dir(&self.file_path)?;
        let mut names: Vec<String> = dir
            .filter_map(|f| f.ok())
            .filter(|f| f.path().is_file())
            .filter_map(|f| f.file_name().into_string().ok())
            .collect();
        names.sort();

        Ok(names)
    }

    pub fn get_file(&self, file_name: &str) -> Result<String> {
        let filepath = self.file_path.join(file_name);

        if filepath.is_file() {
            Ok(fs::read_to_string(filepath)?)
        } else {
            Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Requested file was not found: {file_name}"),
            )))
        }
    }

    pub fn has_file(&self, file_name: &str) -> bool {
        self.file_path.join(file_name).is_file()
    }
}

/// Write the file to the directory, going through a temporary file so a
/// crash never leaves a half written document behind.
pub fn write_file(directory: &Path, file_name: &str, data: &str) -> Result<()> {
    if !directory.exists() {
        fs::create_dir_all(directory)?
    }

    let tmp = directory.join(format!(".{file_name}.tmp"));
    fs::write(&tmp, data)?;
    fs::rename(tmp, directory.join(file_name))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{write_file, DataPath, DataPathType, Directory};

    #[test]
    fn test_write_then_read() {
        let tmp = tempfile::TempDir::new().unwrap();
        let directory = Directory::new(tmp.path().to_path_buf());
        let file_name = "file_test_name.json";

        write_file(&directory.file_path, file_name, "test").unwrap();
        assert_eq!(directory.get_file(file_name).unwrap(), "test");
        assert!(directory.has_file(file_name));
        assert!(directory.get_file("missing.json").is_err());

        write_file(&directory.file_path, file_name, "again").unwrap();
        assert_eq!(directory.get_file(file_name).unwrap(), "again");
        assert_eq!(directory.get_file_names().unwrap(), vec![file_name]);
    }

    #[test]
    fn test_file_names_sorted_and_missing_dir_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let directory = Directory::new(tmp.path().join("nested"));
        assert!(directory.get_file_names().unwrap().is_empty());

        for i in 0..3 {
            write_file(&directory.file_path, &format!("file{i}"), "x").unwrap();
        }

        let names = directory.get_file_names().unwrap();
        assert_eq!(names, vec!["file0", "file1", "file2"]);
    }

    #[test]
    fn test_data_path_layout() {
        let path = DataPath::new("/tmp/base");
        assert_eq!(
            path.path(DataPathType::Notes),
            std::path::PathBuf::from("/tmp/base/notes")
        );
        assert_eq!(path.rel_path(DataPathType::Log).to_str(), Some("logs"));
    }
}
