use anyhow::anyhow;
use formatx::formatx;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::PathBuf;
use std::str::from_utf8;
use std::sync::Arc;

pub trait Output: Debug {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write>;
    /// Whether this output can be considered a no-op and therefore that any code that only writes to the output can be skipped.
    fn is_noop(&self) -> bool {
        false
    }
}

/// Writes each location key to its own file in a directory, named from a template with two
/// placeholders: the location key and the file extension.
#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutput {
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }
}

impl Output for FileOutput {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        let file_name = formatx!(&self.file_template, location_key, file_extension)
            .map_err(|err| anyhow!("Could not form output file name: {err:?}"))?;
        Ok(BufWriter::new(File::create(
            self.directory_path.join(file_name),
        )?))
    }
}

impl Output for &FileOutput {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        <FileOutput as Output>::writer_for_location_key(self, location_key, file_extension)
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_location_key(
        &self,
        _location_key: &str,
        _file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

/// An output that keeps every "file" in memory, keyed by `{location_key}.{file_extension}`.
#[derive(Clone, Debug, Default)]
pub struct MemoryOutput(Arc<Mutex<IndexMap<String, String>>>);

impl MemoryOutput {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn file(&self, name: &str) -> Option<String> {
        self.0.lock().get(name).cloned()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.0.lock().keys().cloned().collect()
    }
}

impl Output for MemoryOutput {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        let name = format!("{location_key}.{file_extension}");
        self.0.lock().insert(name.clone(), String::new());

        Ok(MemoryFileWriter {
            files: self.0.clone(),
            name,
        })
    }
}

/// Represents a writer for an individual in-memory "file".
struct MemoryFileWriter {
    files: Arc<Mutex<IndexMap<String, String>>>,
    name: String,
}

impl Write for MemoryFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let utf8 = from_utf8(buf).map_err(|_| {
            io::Error::new(ErrorKind::InvalidData, "Tried to write out invalid UTF-8.")
        })?;
        self.files
            .lock()
            .entry(self.name.clone())
            .or_default()
            .push_str(utf8);
        Ok(utf8.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
