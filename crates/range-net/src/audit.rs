//! Parser for the emitted grammar and the degree cross-check built on it.
//!
//! The generator tracks degrees as edges are created. The audit re-derives
//! them from the text alone, so any divergence between what was written and
//! what was counted surfaces as an [`RangeError::Invariant`].

use range_core::errors::{ErrorInfo, RangeError};
use range_core::{NodeId, Sign};

use crate::bins::BinTracker;
use crate::grammar::{BlockKind, Entry, GeneEntry, MotifEntry};

/// One parsed block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Block keyword.
    pub kind: BlockKind,
    /// Entries in document order.
    pub entries: Vec<Entry>,
}

/// A parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    /// Blocks in document order.
    pub blocks: Vec<Block>,
}

impl Document {
    /// Re-derives every node's degree from the entries.
    ///
    /// List entries add one to each endpoint and two for self-regulation. A
    /// feed-forward loop adds two to each node; a multi-output loop adds its
    /// size to the regulator and the first target and two to every chained
    /// target; co-regulation adds its size to the regulator and one to each
    /// target.
    pub fn degrees(&self, node_count: usize) -> Result<Vec<usize>, RangeError> {
        let mut degrees = vec![0usize; node_count];
        let mut add = |node: NodeId, by: usize| -> Result<(), RangeError> {
            let slot = degrees.get_mut(node.index()).ok_or_else(|| {
                RangeError::Invariant(
                    ErrorInfo::new("dangling-id", "identifier outside the network")
                        .with_context("id", node.as_raw())
                        .with_context("node_count", node_count),
                )
            })?;
            *slot += by;
            Ok(())
        };
        for entry in self.blocks.iter().flat_map(|block| &block.entries) {
            match entry {
                Entry::Gene(gene) => {
                    for input in &gene.inputs {
                        add(input.regulator, 1)?;
                        add(gene.gene, 1)?;
                    }
                }
                Entry::Motif(MotifEntry::FeedForward {
                    regulator,
                    first,
                    second,
                    ..
                }) => {
                    for node in [regulator, first, second] {
                        add(*node, 2)?;
                    }
                }
                Entry::Motif(MotifEntry::MultiFeedForward {
                    regulator,
                    first,
                    chained,
                    ..
                }) => {
                    let size = chained.len() + 1;
                    add(*regulator, size)?;
                    add(*first, size)?;
                    for node in chained {
                        add(*node, 2)?;
                    }
                }
                Entry::Motif(MotifEntry::CoRegulation {
                    regulator, targets, ..
                }) => {
                    add(*regulator, targets.len())?;
                    for node in targets {
                        add(*node, 1)?;
                    }
                }
            }
        }
        Ok(degrees)
    }

    /// Total number of entries.
    pub fn entry_count(&self) -> usize {
        self.blocks.iter().map(|block| block.entries.len()).sum()
    }
}

/// Parses a complete document. Trailing content other than whitespace is an
/// error.
pub fn parse(text: &str) -> Result<Document, RangeError> {
    let mut parser = Parser::new(text);
    let document = parser.document()?;
    parser.skip_whitespace();
    if parser.pos != parser.bytes.len() {
        return Err(parser.error("trailing content after the document"));
    }
    Ok(document)
}

/// Parses `text` and checks every node's degree against `tracker`.
pub fn verify(text: &str, tracker: &BinTracker) -> Result<Document, RangeError> {
    let document = parse(text)?;
    let derived = document.degrees(tracker.degrees().len())?;
    for (id, (found, expected)) in derived.iter().zip(tracker.degrees()).enumerate() {
        if found != expected {
            return Err(RangeError::Invariant(
                ErrorInfo::new("degree-mismatch", "document and bookkeeping disagree")
                    .with_context("node", id)
                    .with_context("document", found)
                    .with_context("tracker", expected),
            ));
        }
    }
    Ok(document)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, message: &str) -> RangeError {
        RangeError::Invariant(
            ErrorInfo::new("grammar-parse", message).with_context("offset", self.pos),
        )
    }

    fn skip_whitespace(&mut self) {
        while self
            .bytes
            .get(self.pos)
            .map_or(false, |b| b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), RangeError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", expected as char)))
        }
    }

    fn document(&mut self) -> Result<Document, RangeError> {
        self.expect(b'[')?;
        let mut document = Document::default();
        if self.eat(b']') {
            return Ok(document);
        }
        loop {
            document.blocks.push(self.block()?);
            if self.eat(b',') {
                continue;
            }
            self.expect(b']')?;
            return Ok(document);
        }
    }

    fn block(&mut self) -> Result<Block, RangeError> {
        self.skip_whitespace();
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .map_or(false, |b| b.is_ascii_uppercase())
        {
            self.pos += 1;
        }
        let keyword = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or_default();
        let kind = BlockKind::from_keyword(keyword).ok_or_else(|| {
            RangeError::Invariant(
                ErrorInfo::new("unknown-block", "unknown block keyword")
                    .with_context("keyword", keyword)
                    .with_context("offset", start),
            )
        })?;
        self.expect(b'(')?;
        let mut entries = Vec::new();
        loop {
            let entry = match kind {
                BlockKind::MotifList => Entry::Motif(self.motif()?),
                BlockKind::Cluster | BlockKind::RegulatorList => Entry::Gene(self.gene_entry()?),
            };
            entries.push(entry);
            if self.eat(b',') {
                continue;
            }
            self.expect(b')')?;
            return Ok(Block { kind, entries });
        }
    }

    fn node(&mut self, prefix: u8) -> Result<NodeId, RangeError> {
        self.expect(prefix)?;
        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(digit) = self.bytes.get(self.pos).filter(|b| b.is_ascii_digit()) {
            value = value * 10 + u64::from(digit - b'0');
            if value > u64::from(u32::MAX) {
                return Err(self.error("identifier too large"));
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected an identifier"));
        }
        Ok(NodeId::from_raw(value as u32))
    }

    fn sign(&mut self) -> Result<Sign, RangeError> {
        let sign = self
            .peek()
            .and_then(|b| Sign::from_char(b as char))
            .ok_or_else(|| self.error("expected a sign"))?;
        self.pos += 1;
        Ok(sign)
    }

    fn gene_entry(&mut self) -> Result<GeneEntry, RangeError> {
        let mut entry = GeneEntry::new(self.node(b'G')?);
        self.expect(b'(')?;
        loop {
            let regulator = self.node(b'P')?;
            let sign = self.sign()?;
            entry.push(regulator, sign);
            if self.eat(b',') {
                continue;
            }
            self.expect(b')')?;
            return Ok(entry);
        }
    }

    fn motif(&mut self) -> Result<MotifEntry, RangeError> {
        let regulator = self.node(b'P')?;
        self.expect(b'(')?;
        let lead = self.sign()?;
        let first = self.node(b'G')?;
        match self.peek() {
            Some(b',') | Some(b')') => {
                let mut targets = vec![first];
                while self.eat(b',') {
                    targets.push(self.node(b'G')?);
                }
                self.expect(b')')?;
                Ok(MotifEntry::CoRegulation {
                    regulator,
                    targets,
                    sign: lead,
                })
            }
            Some(b'+') | Some(b'-') => {
                let middle = self.sign()?;
                if self.eat(b'(') {
                    let mut chained = vec![self.node(b'G')?];
                    while self.eat(b',') {
                        chained.push(self.node(b'G')?);
                    }
                    self.expect(b')')?;
                    let last = self.sign()?;
                    self.expect(b')')?;
                    Ok(MotifEntry::MultiFeedForward {
                        regulator,
                        first,
                        chained,
                        signs: [lead, middle, last],
                    })
                } else {
                    let second = self.node(b'G')?;
                    let last = self.sign()?;
                    self.expect(b')')?;
                    Ok(MotifEntry::FeedForward {
                        regulator,
                        first,
                        second,
                        signs: [lead, middle, last],
                    })
                }
            }
            _ => Err(RangeError::Invariant(
                ErrorInfo::new("unknown-motif", "unrecognised motif span")
                    .with_context("regulator", regulator.as_raw())
                    .with_context("offset", self.pos),
            )),
        }
    }
}
