mod file_storage;

pub use file_storage::{write_file, DataPath, DataPathType, Directory};
