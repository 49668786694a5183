// ============================================================
// Layer 4: Corpus and Query Parsers
// ============================================================
// Turns a tagged, line-oriented collection file into a stream
// of records. Both parsers share the line classifier in
// `tag.rs` and differ only in what they do with each tag.
//
// Document parser state: the current Section (None until the
// first field tag of a record).
//   Record  → emit the record in progress (if any), start a new one
//   Section → switch the current section; the tag line adds no text
//   Text    → append "line " to the current section, or drop it
//             when no section is open yet
//
// Query parser: same record boundaries, but every line except
// the `.W` marker goes into the query text.
//
// At end of input the record in progress is always emitted,
// even when all of its fields are empty. A file with no `.I`
// line yields nothing.
//
// Both parsers are iterators over Result<T>. The first error
// ends the iteration.
//
// Reference: Rust Book §13 (Iterators)
//            Rust Book §12 (Reading a File)

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::data::tag::{Section, Tag};
use crate::domain::document::Document;
use crate::domain::error::{Error, Result};
use crate::domain::query::Query;

// ─── Line Reader ──────────────────────────────────────────────────────────────
/// Numbers lines and maps read failures to `Error::Io` with the source path.
struct LineReader<R> {
    lines:   Lines<R>,
    line_no: usize,
    source:  PathBuf,
}

impl<R: BufRead> LineReader<R> {
    fn new(reader: R, source: PathBuf) -> Self {
        Self { lines: reader.lines(), line_no: 0, source }
    }

    fn next_line(&mut self) -> Result<Option<(usize, String)>> {
        match self.lines.next() {
            None           => Ok(None),
            Some(Err(e))   => Err(Error::io(&self.source, e)),
            Some(Ok(line)) => {
                self.line_no += 1;
                Ok(Some((self.line_no, line)))
            }
        }
    }
}

// ─── Record Buffer ────────────────────────────────────────────────────────────
/// The in-progress record plus the section currently being filled.
/// `begin` and `finish` are the only ways a record leaves the buffer,
/// and both reset the section.
struct RecordBuffer<T> {
    record:  Option<T>,
    section: Option<Section>,
}

impl<T> RecordBuffer<T> {
    fn new() -> Self {
        Self { record: None, section: None }
    }

    /// Start `next`, handing back the previous record if there was one.
    fn begin(&mut self, next: T) -> Option<T> {
        self.section = None;
        self.record.replace(next)
    }

    fn finish(&mut self) -> Option<T> {
        self.section = None;
        self.record.take()
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    Ok(BufReader::new(file))
}

fn push_line(buf: &mut String, line: &str) {
    buf.push_str(line);
    buf.push(' ');
}

// ─── CorpusParser ─────────────────────────────────────────────────────────────
/// Streams `Document`s out of a corpus file.
pub struct CorpusParser<R> {
    reader:   LineReader<R>,
    buffer:   RecordBuffer<Document>,
    finished: bool,
}

impl<R: BufRead> CorpusParser<R> {
    /// `source` is only used to label I/O errors.
    pub fn new(reader: R, source: impl Into<PathBuf>) -> Self {
        Self {
            reader:   LineReader::new(reader, source.into()),
            buffer:   RecordBuffer::new(),
            finished: false,
        }
    }

    /// Parse lines until a record is complete. `Ok(None)` means end of input.
    fn step(&mut self) -> Result<Option<Document>> {
        while let Some((line_no, line)) = self.reader.next_line()? {
            match Tag::classify(&line, line_no)? {
                Tag::Record(id) => {
                    if let Some(done) = self.buffer.begin(Document::new(id)) {
                        return Ok(Some(done));
                    }
                }
                Tag::Section(section) => self.buffer.section = Some(section),
                Tag::Text => {
                    let (Some(doc), Some(section)) = (self.buffer.record.as_mut(), self.buffer.section)
                    else {
                        tracing::trace!("line {line_no}: text outside any field, dropped");
                        continue;
                    };
                    let target = match section {
                        Section::Title        => &mut doc.title,
                        Section::Author       => &mut doc.author,
                        Section::Bibliography => &mut doc.bibliography,
                        Section::Content      => &mut doc.content,
                    };
                    push_line(target, &line);
                }
            }
        }
        Ok(self.buffer.finish())
    }
}

impl CorpusParser<BufReader<File>> {
    /// Open a corpus file for streaming.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(open(path)?, path))
    }
}

impl<R: BufRead> Iterator for CorpusParser<R> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.step() {
            Ok(Some(doc)) => Some(Ok(doc)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

// ─── QueryParser ──────────────────────────────────────────────────────────────
/// Streams `Query`s out of a query file.
pub struct QueryParser<R> {
    reader:   LineReader<R>,
    buffer:   RecordBuffer<Query>,
    finished: bool,
}

impl<R: BufRead> QueryParser<R> {
    pub fn new(reader: R, source: impl Into<PathBuf>) -> Self {
        Self {
            reader:   LineReader::new(reader, source.into()),
            buffer:   RecordBuffer::new(),
            finished: false,
        }
    }

    fn step(&mut self) -> Result<Option<Query>> {
        while let Some((line_no, line)) = self.reader.next_line()? {
            match Tag::classify(&line, line_no)? {
                Tag::Record(rest) => {
                    // ".I 001" → "001"; anything after the first token is ignored
                    let id = rest.split_whitespace().next().unwrap_or(&rest).to_string();
                    if let Some(done) = self.buffer.begin(Query::new(id, String::new())) {
                        return Ok(Some(done));
                    }
                }
                Tag::Section(Section::Content) => self.buffer.section = Some(Section::Content),
                Tag::Section(_) | Tag::Text => match self.buffer.record.as_mut() {
                    Some(query) => push_line(&mut query.text, &line),
                    None => tracing::trace!("line {line_no}: text before first query, dropped"),
                },
            }
        }
        Ok(self.buffer.finish())
    }
}

impl QueryParser<BufReader<File>> {
    /// Open a query file for streaming.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(open(path)?, path))
    }
}

impl<R: BufRead> Iterator for QueryParser<R> {
    type Item = Result<Query>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.step() {
            Ok(Some(query)) => Some(Ok(query)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
