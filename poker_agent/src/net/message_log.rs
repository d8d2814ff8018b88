//! Newline-delimited record of every message crossing the wire.

use std::{
    fmt,
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::Path,
};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Inbound => "in",
            Self::Outbound => "out",
        };
        write!(f, "{repr}")
    }
}

/// Destination for message diagnostics. The session reports failures and
/// carries on.
pub trait MessageSink {
    fn record(
        &mut self,
        direction: Direction,
        message_type: &str,
        raw: &[u8],
        payload: Option<&serde_json::Value>,
    ) -> io::Result<()>;
}

#[derive(Serialize)]
struct Record<'a> {
    ts: String,
    direction: Direction,
    #[serde(rename = "type")]
    message_type: &'a str,
    raw_hex: String,
    payload: Option<&'a serde_json::Value>,
}

/// Writes one JSON object per message.
pub struct JsonlMessageLog<W: Write> {
    writer: W,
}

impl JsonlMessageLog<BufWriter<File>> {
    /// Append to the log at `path`, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlMessageLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MessageSink for JsonlMessageLog<W> {
    fn record(
        &mut self,
        direction: Direction,
        message_type: &str,
        raw: &[u8],
        payload: Option<&serde_json::Value>,
    ) -> io::Result<()> {
        let record = Record {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            direction,
            message_type,
            raw_hex: hex::encode(raw),
            payload,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}
