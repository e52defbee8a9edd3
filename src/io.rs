use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use log::warn;
use regex::Regex;
use serde::Serialize;

use crate::cache::{AccessResult, Operation, SimStats, Simulation};
use crate::config::CacheConfig;
use crate::memory::Word;

/// Leading hex digits of a token, optionally `0x`-prefixed.
static HEX_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:0[xX])?([0-9a-fA-F]+)").unwrap());

/// What to do with a token that is not a hex number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenPolicy {
    /// Keep the leading hex digits (zero if there are none) and log a warning.
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub address: u32,
    pub op: Operation,
    pub data: Word,
}

pub fn parse_hex_token(token: &str, policy: TokenPolicy, record: usize) -> Result<u32> {
    let parsed = HEX_PREFIX.captures(token).and_then(|cap| {
        let whole = cap.get(0).is_some_and(|m| m.end() == token.len());
        u32::from_str_radix(&cap[1], 16).ok().map(|value| (value, whole))
    });
    match (parsed, policy) {
        (Some((value, true)), _) => Ok(value),
        (Some((value, false)), TokenPolicy::Lenient) => {
            warn!("record {}: trailing characters in token {:?}, using {:#x}", record, token, value);
            Ok(value)
        }
        (None, TokenPolicy::Lenient) => {
            warn!("record {}: malformed token {:?}, using 0", record, token);
            Ok(0)
        }
        (_, TokenPolicy::Strict) => bail!("record {}: malformed hex token {:?}", record, token),
    }
}

/// Streams (address, op, data) triples out of whitespace-separated hex tokens.
///
/// Input is consumed a line at a time. A trailing partial triple is ignored.
pub struct TraceReader<R> {
    reader: R,
    policy: TokenPolicy,
    line: Vec<u8>,
    pending: VecDeque<String>,
    record: usize,
    done: bool,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R, policy: TokenPolicy) -> Self {
        TraceReader {
            reader,
            policy,
            line: Vec::new(),
            pending: VecDeque::new(),
            record: 0,
            done: false,
        }
    }

    /// Reads until three tokens are queued. `Ok(false)` at end of input.
    fn fill(&mut self) -> Result<bool> {
        while self.pending.len() < 3 {
            self.line.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut self.line)
                .with_context(|| format!("Failed to read trace after record {}", self.record))?;
            if read == 0 {
                if !self.pending.is_empty() {
                    warn!("ignoring {} trailing token(s) after the last full record", self.pending.len());
                }
                return Ok(false);
            }
            // Undecodable bytes survive as replacement characters and fail the hex parse.
            let tokens = self
                .line
                .split(u8::is_ascii_whitespace)
                .filter(|token| !token.is_empty())
                .map(|token| String::from_utf8_lossy(token).into_owned());
            self.pending.extend(tokens);
        }
        Ok(true)
    }

    fn next_record(&mut self) -> Result<Option<TraceRecord>> {
        if !self.fill()? {
            return Ok(None);
        }
        let (Some(address), Some(op), Some(data)) =
            (self.pending.pop_front(), self.pending.pop_front(), self.pending.pop_front())
        else {
            return Ok(None);
        };

        let record = self.record;
        self.record += 1;
        Ok(Some(TraceRecord {
            address: parse_hex_token(&address, self.policy, record)?,
            op: Operation::from_code(parse_hex_token(&op, self.policy, record)?),
            data: parse_hex_token(&data, self.policy, record)?,
        }))
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

pub fn parse_trace(text: &str, policy: TokenPolicy) -> Result<Vec<TraceRecord>> {
    TraceReader::new(text.as_bytes(), policy).collect()
}

/// Opens a trace for streaming, decompressing on the fly if it ends in `.zst`.
pub fn open_trace(path: &Path, policy: TokenPolicy) -> Result<TraceReader<Box<dyn BufRead>>> {
    let file = File::open(path).with_context(|| format!("Failed to read trace {}", path.display()))?;
    let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "zst") {
        let decoder = zstd::stream::Decoder::new(file)
            .with_context(|| format!("Failed to decompress trace {}", path.display()))?;
        Box::new(BufReader::new(decoder))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(TraceReader::new(reader, policy))
}

/// Writes one `DD H E` line per read. Writes are not reported.
pub struct ResultWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(inner: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(inner);
        ResultWriter { writer }
    }

    pub fn record(&mut self, op: Operation, result: &AccessResult) -> Result<()> {
        if op == Operation::Write {
            return Ok(());
        }
        self.writer.write_record([
            format!("{:02X}", result.value),
            (result.outcome as u8).to_string(),
            u8::from(result.dirty).to_string(),
        ])?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|err| anyhow::anyhow!("Failed to flush results: {}", err.error()))
    }
}

impl ResultWriter<File> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("Failed to create output {}", path.display()))?;
        Ok(ResultWriter::new(file))
    }
}

/// Feeds records through the simulation in trace order, stopping at the first error.
/// Returns how many records were replayed.
pub fn replay<I, W>(sim: &mut Simulation, records: I, sink: &mut ResultWriter<W>) -> Result<usize>
where
    I: IntoIterator<Item = Result<TraceRecord>>,
    W: Write,
{
    let mut count = 0;
    for record in records {
        let record = record?;
        let result = sim.access(record.address, record.op, record.data);
        sink.record(record.op, &result)?;
        count += 1;
    }
    Ok(count)
}

#[derive(Debug, Serialize)]
struct StatsRow {
    sets: usize,
    ways: usize,
    words_per_line: usize,
    address_bits: u32,
    reads: u64,
    writes: u64,
    hits: u64,
    misses: u64,
    writebacks: u64,
    miss_rate: f64,
}

pub fn write_stats<W: Write>(inner: W, config: &CacheConfig, stats: &SimStats) -> Result<()> {
    let mut writer = csv::Writer::from_writer(inner);
    writer.serialize(StatsRow {
        sets: config.sets,
        ways: config.ways,
        words_per_line: config.words_per_line,
        address_bits: config.address_bits,
        reads: stats.reads,
        writes: stats.writes,
        hits: stats.hits,
        misses: stats.misses,
        writebacks: stats.writebacks,
        miss_rate: stats.miss_rate(),
    })?;
    writer.flush()?;
    Ok(())
}
