//! Output for replaced and deleted objects

use crate::cli::OutputFormat;
use reconcile::{Error, Printer, ResourceDescriptor, Result};
use std::io::{self, Write};

pub struct ObjectPrinter<W: Write> {
    out: W,
    format: Option<OutputFormat>,
}

impl<W: Write> ObjectPrinter<W> {
    pub fn new(out: W, format: Option<OutputFormat>) -> Self {
        Self { out, format }
    }

    fn write(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{text}").map_err(stdout_error)
    }
}

impl ObjectPrinter<io::Stdout> {
    pub fn stdout(format: Option<OutputFormat>) -> Self {
        Self::new(io::stdout(), format)
    }
}

fn stdout_error(source: io::Error) -> Error {
    Error::Io {
        path: "stdout".into(),
        source,
    }
}

impl<W: Write> Printer for ObjectPrinter<W> {
    fn print_replaced(&mut self, descriptor: &ResourceDescriptor) -> Result<()> {
        let text = match self.format {
            None => format!("{} replaced", descriptor.reference()),
            Some(OutputFormat::Name) => descriptor.reference(),
            Some(OutputFormat::Json) => serde_json::to_string_pretty(&descriptor.object)
                .map_err(|e| Error::Decode {
                    origin: descriptor.source.clone(),
                    message: e.to_string(),
                })?,
            Some(OutputFormat::Yaml) => {
                let yaml =
                    serde_yaml::to_string(&descriptor.object).map_err(|e| Error::Decode {
                        origin: descriptor.source.clone(),
                        message: e.to_string(),
                    })?;
                format!("---\n{}", yaml.trim_end())
            }
        };
        self.write(&text)
    }

    fn print_deleted(&mut self, descriptor: &ResourceDescriptor) -> Result<()> {
        if self.format.is_some() {
            return Ok(());
        }
        self.write(&format!("{} deleted", descriptor.reference()))
    }
}
