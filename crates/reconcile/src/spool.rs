//! Stdin spooling
//!
//! A force replace reads its inputs twice. Standard input can only be read
//! once, so it is copied to a scoped temporary directory first. The
//! directory lives as long as the [`StdinSpool`] and is removed on drop.

use crate::error::{Error, Result};
use crate::resource::ResourceDescriptor;
use crate::types::InputSource;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// File name of the spooled manifest inside the temporary directory
pub const SPOOL_FILE: &str = "resource.stdin";

/// Re-readable copy of standard input
#[derive(Debug)]
pub struct StdinSpool {
    dir: Option<TempDir>,
    inputs: Vec<InputSource>,
}

impl StdinSpool {
    /// Copy `reader` to a temporary file if any input is stdin, and rewrite
    /// those inputs to point at it. Stdin is read at most once.
    pub fn materialize(inputs: &[InputSource], reader: &mut dyn Read) -> Result<Self> {
        if !inputs.contains(&InputSource::Stdin) {
            return Ok(Self {
                dir: None,
                inputs: inputs.to_vec(),
            });
        }

        let dir = tempfile::Builder::new()
            .prefix("replace-")
            .tempdir()
            .map_err(|e| Error::Io {
                path: std::env::temp_dir(),
                source: e,
            })?;
        let path = dir.path().join(SPOOL_FILE);
        dump_reader_to_file(reader, &path)?;
        log::debug!("spooled stdin to {}", path.display());

        let inputs = inputs
            .iter()
            .map(|input| match input {
                InputSource::Stdin => InputSource::Path(path.clone()),
                other => other.clone(),
            })
            .collect();

        Ok(Self {
            dir: Some(dir),
            inputs,
        })
    }

    /// Inputs with stdin replaced by the spooled file
    pub fn inputs(&self) -> &[InputSource] {
        &self.inputs
    }

    /// The spooled file, if stdin was an input
    pub fn path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.path().join(SPOOL_FILE))
    }

    /// Attribute a resolved item from the spooled file back to stdin
    pub fn relabel(&self, item: Result<ResourceDescriptor>) -> Result<ResourceDescriptor> {
        let Some(spooled) = self.path().map(|p| p.display().to_string()) else {
            return item;
        };
        let stdin = InputSource::Stdin.label();
        match item {
            Ok(mut descriptor) => {
                if descriptor.source == spooled {
                    descriptor.source = stdin;
                }
                Ok(descriptor)
            }
            Err(Error::Decode { origin, message }) if origin == spooled => Err(Error::Decode {
                origin: stdin,
                message,
            }),
            Err(e) => Err(e),
        }
    }
}

fn dump_reader_to_file(reader: &mut dyn Read, path: &Path) -> Result<()> {
    let io_err = |e| Error::Io {
        path: path.to_path_buf(),
        source: e,
    };
    let mut file = File::create(path).map_err(io_err)?;
    io::copy(reader, &mut file).map_err(io_err)?;
    file.sync_all().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCluster, descriptor};
    use std::fs;
    use std::io::Cursor;

    #[test]
    fn test_no_stdin_no_spool() {
        let inputs = vec![InputSource::parse("pod.json")];
        let spool = StdinSpool::materialize(&inputs, &mut io::empty()).unwrap();
        assert!(spool.path().is_none());
        assert_eq!(spool.inputs(), inputs.as_slice());
    }

    #[test]
    fn test_relabel_points_back_at_stdin() {
        let cluster = MockCluster::new();
        let inputs = vec![InputSource::Stdin];
        let spool =
            StdinSpool::materialize(&inputs, &mut Cursor::new("Pod default mypod\n")).unwrap();
        let spooled = spool.path().unwrap().display().to_string();

        let desc = descriptor(&cluster, "Pod", "default", "mypod", &spooled);
        assert_eq!(spool.relabel(Ok(desc)).unwrap().source, "stdin");

        let err = Error::Decode {
            origin: spooled,
            message: "bad manifest".into(),
        };
        match spool.relabel(Err(err)) {
            Err(Error::Decode { origin, .. }) => assert_eq!(origin, "stdin"),
            other => panic!("unexpected {other:?}"),
        }

        let other = descriptor(&cluster, "Pod", "default", "other", "pod.json");
        assert_eq!(spool.relabel(Ok(other)).unwrap().source, "pod.json");
    }

    #[test]
    fn test_stdin_is_spooled_and_removed_on_drop() {
        let inputs = vec![
            InputSource::Stdin,
            InputSource::parse("pod.json"),
            InputSource::Stdin,
        ];
        let mut reader = Cursor::new("Pod default mypod\n");
        let spool = StdinSpool::materialize(&inputs, &mut reader).unwrap();

        let path = spool.path().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Pod default mypod\n");
        assert_eq!(
            spool.inputs(),
            &[
                InputSource::Path(path.clone()),
                InputSource::parse("pod.json"),
                InputSource::Path(path.clone()),
            ]
        );
        assert!(
            path.parent()
                .unwrap()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("replace-")
        );

        drop(spool);
        assert!(!path.exists());
    }
}
