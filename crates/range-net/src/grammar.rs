//! Append-only writer for the NEMO motif grammar.
//!
//! The document is a bracketed list of `DOR(...)`, `TMLIST(...)` and
//! `GLIST(...)` blocks. Entries are appended one at a time with a trailing
//! separator that is patched away when the block closes, so a block can be
//! grown greedily without knowing in advance which entry is the last.

use std::fmt;

use range_core::errors::{ErrorInfo, RangeError};
use range_core::{NodeId, Sign};

const OPEN_DOCUMENT: &str = "[\n";
const CLOSE_DOCUMENT: &str = "\n]\n";
const ENTRY_SEPARATOR: &str = ",\n";
const BLOCK_SEPARATOR: &str = ",\n";
const GROWTH_INCREMENT: usize = 128;

/// The three block kinds of the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Dense overlapping regulon, `DOR(...)`.
    Cluster,
    /// Transcription motif list, `TMLIST(...)`.
    MotifList,
    /// Plain gene list, `GLIST(...)`.
    RegulatorList,
}

impl BlockKind {
    /// Keyword opening the block.
    pub const fn keyword(&self) -> &'static str {
        match self {
            BlockKind::Cluster => "DOR",
            BlockKind::MotifList => "TMLIST",
            BlockKind::RegulatorList => "GLIST",
        }
    }

    /// Parses a block keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "DOR" => Some(BlockKind::Cluster),
            "TMLIST" => Some(BlockKind::MotifList),
            "GLIST" => Some(BlockKind::RegulatorList),
            _ => None,
        }
    }

    fn accepts(&self, entry: &Entry) -> bool {
        matches!(
            (self, entry),
            (BlockKind::MotifList, Entry::Motif(_))
                | (BlockKind::Cluster | BlockKind::RegulatorList, Entry::Gene(_))
        )
    }
}

/// One signed regulatory input of a gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regulation {
    /// Regulating node, rendered in its protein view.
    pub regulator: NodeId,
    /// Edge sign.
    pub sign: Sign,
}

/// `G<gene>(P<reg><sign>,...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneEntry {
    /// Regulated node.
    pub gene: NodeId,
    /// Inputs in emission order.
    pub inputs: Vec<Regulation>,
}

impl GeneEntry {
    /// Entry with no inputs yet.
    pub fn new(gene: NodeId) -> Self {
        Self {
            gene,
            inputs: Vec::new(),
        }
    }

    /// Appends one input.
    pub fn push(&mut self, regulator: NodeId, sign: Sign) {
        self.inputs.push(Regulation { regulator, sign });
    }
}

/// Motif entries of a `TMLIST` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotifEntry {
    /// `P<g>(<s>G<a><s>G<b><s>)`.
    FeedForward {
        /// Top regulator.
        regulator: NodeId,
        /// Intermediate target.
        first: NodeId,
        /// Final target.
        second: NodeId,
        /// Edge signs in emission order.
        signs: [Sign; 3],
    },
    /// `P<g>(<s>G<a><s>(G<b>,...)<s>)`.
    MultiFeedForward {
        /// Top regulator.
        regulator: NodeId,
        /// Intermediate target regulating the chained targets.
        first: NodeId,
        /// Chained targets.
        chained: Vec<NodeId>,
        /// Edge signs in emission order.
        signs: [Sign; 3],
    },
    /// `P<g>(<s>G<a>,G<b>,...)`.
    CoRegulation {
        /// Shared regulator.
        regulator: NodeId,
        /// Regulated targets.
        targets: Vec<NodeId>,
        /// Sign shared by every edge.
        sign: Sign,
    },
}

/// Any entry the writer accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// Gene list entry for `DOR` and `GLIST` blocks.
    Gene(GeneEntry),
    /// Motif entry for `TMLIST` blocks.
    Motif(MotifEntry),
}

impl fmt::Display for GeneEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.gene.gene())?;
        for (idx, input) in self.inputs.iter().enumerate() {
            if idx > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}{}", input.regulator.protein(), input.sign)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for MotifEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotifEntry::FeedForward {
                regulator,
                first,
                second,
                signs,
            } => write!(
                f,
                "{}({}{}{}{}{})",
                regulator.protein(),
                signs[0],
                first.gene(),
                signs[1],
                second.gene(),
                signs[2]
            ),
            MotifEntry::MultiFeedForward {
                regulator,
                first,
                chained,
                signs,
            } => {
                write!(f, "{}({}{}{}(", regulator.protein(), signs[0], first.gene(), signs[1])?;
                write_gene_list(f, chained)?;
                write!(f, "){})", signs[2])
            }
            MotifEntry::CoRegulation {
                regulator,
                targets,
                sign,
            } => {
                write!(f, "{}({}", regulator.protein(), sign)?;
                write_gene_list(f, targets)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Gene(entry) => fmt::Display::fmt(entry, f),
            Entry::Motif(entry) => fmt::Display::fmt(entry, f),
        }
    }
}

fn write_gene_list(f: &mut fmt::Formatter<'_>, genes: &[NodeId]) -> fmt::Result {
    for (idx, gene) in genes.iter().enumerate() {
        if idx > 0 {
            write!(f, ",")?;
        }
        write!(f, "{}", gene.gene())?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct OpenBlock {
    kind: BlockKind,
    start: usize,
    entries: usize,
}

/// Growable grammar buffer.
///
/// The text is only handed out by [`GrammarWriter::finish`], which closes every
/// block still open, so a caller can never observe an unbalanced document.
#[derive(Debug)]
pub struct GrammarWriter {
    text: String,
    open: Option<OpenBlock>,
    blocks: usize,
}

impl GrammarWriter {
    /// Starts a new document.
    pub fn new() -> Result<Self, RangeError> {
        let mut writer = Self {
            text: String::new(),
            open: None,
            blocks: 0,
        };
        writer.append(OPEN_DOCUMENT)?;
        Ok(writer)
    }

    /// Opens a block. A block still open is closed first.
    pub fn open(&mut self, kind: BlockKind) -> Result<(), RangeError> {
        if self.open.is_some() {
            self.close()?;
        }
        let start = self.text.len();
        if self.blocks > 0 {
            self.append(BLOCK_SEPARATOR)?;
        }
        self.append(kind.keyword())?;
        self.append("(\n")?;
        self.open = Some(OpenBlock {
            kind,
            start,
            entries: 0,
        });
        Ok(())
    }

    /// Appends one entry to the open block.
    pub fn entry(&mut self, entry: &Entry) -> Result<(), RangeError> {
        let Some(block) = self.open.as_mut() else {
            return Err(RangeError::invariant(
                "no-open-block",
                "grammar entry written outside of a block",
            ));
        };
        if !block.kind.accepts(entry) {
            return Err(RangeError::Invariant(
                ErrorInfo::new("entry-kind", "entry does not belong in this block")
                    .with_context("block", block.kind.keyword()),
            ));
        }
        block.entries += 1;
        self.append("  ")?;
        self.append(&entry.to_string())?;
        self.append(ENTRY_SEPARATOR)
    }

    /// Closes the open block, patching the trailing separator. An empty block
    /// is removed from the document.
    pub fn close(&mut self) -> Result<(), RangeError> {
        let Some(block) = self.open.take() else {
            return Ok(());
        };
        if block.entries == 0 {
            self.text.truncate(block.start);
            return Ok(());
        }
        if self.text.ends_with(ENTRY_SEPARATOR) {
            self.text.truncate(self.text.len() - ENTRY_SEPARATOR.len());
        }
        self.append("\n)")?;
        self.blocks += 1;
        Ok(())
    }

    /// Writes a complete block.
    pub fn emit_block(&mut self, kind: BlockKind, entries: &[Entry]) -> Result<(), RangeError> {
        self.open(kind)?;
        for entry in entries {
            self.entry(entry)?;
        }
        self.close()
    }

    /// Number of non-empty blocks written so far.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether nothing but the document opener has been written.
    pub fn is_empty(&self) -> bool {
        self.text.len() <= OPEN_DOCUMENT.len()
    }

    /// Closes the document and hands the text off.
    pub fn finish(mut self) -> Result<String, RangeError> {
        self.close()?;
        if self.blocks == 0 {
            self.text.truncate(self.text.len() - 1);
        }
        self.append(CLOSE_DOCUMENT)?;
        Ok(self.text)
    }

    fn append(&mut self, piece: &str) -> Result<(), RangeError> {
        self.ensure_capacity(piece.len())?;
        self.text.push_str(piece);
        Ok(())
    }

    /// Grows the buffer before a write that would overflow it: at least double,
    /// never less than the write plus a fixed increment.
    fn ensure_capacity(&mut self, additional: usize) -> Result<(), RangeError> {
        let needed = self.text.len() + additional;
        if needed <= self.text.capacity() {
            return Ok(());
        }
        let target = (self.text.capacity() * 2).max(needed + GROWTH_INCREMENT);
        self.text
            .try_reserve(target - self.text.len())
            .map_err(|err| {
                RangeError::Resource(
                    ErrorInfo::new("buffer-growth", err.to_string())
                        .with_context("requested", target),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(raw: u32) -> NodeId {
        NodeId::from_raw(raw)
    }

    fn gene(id: u32, inputs: &[(u32, Sign)]) -> Entry {
        let mut entry = GeneEntry::new(node(id));
        for (regulator, sign) in inputs {
            entry.push(node(*regulator), *sign);
        }
        Entry::Gene(entry)
    }

    #[test]
    fn blocks_are_separated_and_trailing_commas_patched() {
        let mut writer = GrammarWriter::new().unwrap();
        writer
            .emit_block(
                BlockKind::Cluster,
                &[
                    gene(0, &[(9, Sign::Plus)]),
                    gene(1, &[(9, Sign::Minus), (8, Sign::Plus)]),
                ],
            )
            .unwrap();
        writer.open(BlockKind::MotifList).unwrap();
        writer
            .entry(&Entry::Motif(MotifEntry::CoRegulation {
                regulator: node(1),
                targets: vec![node(2), node(3)],
                sign: Sign::Minus,
            }))
            .unwrap();
        let text = writer.finish().unwrap();
        assert_eq!(
            text,
            "[\nDOR(\n  G0(P9+),\n  G1(P9-,P8+)\n),\nTMLIST(\n  P1(-G2,G3)\n)\n]\n"
        );
    }

    #[test]
    fn empty_blocks_leave_no_trace() {
        let mut writer = GrammarWriter::new().unwrap();
        writer.emit_block(BlockKind::RegulatorList, &[]).unwrap();
        writer
            .emit_block(BlockKind::RegulatorList, &[gene(4, &[(4, Sign::Plus)])])
            .unwrap();
        writer.emit_block(BlockKind::MotifList, &[]).unwrap();
        assert_eq!(writer.blocks(), 1);
        assert_eq!(writer.finish().unwrap(), "[\nGLIST(\n  G4(P4+)\n)\n]\n");
    }

    #[test]
    fn empty_document_is_still_balanced() {
        let writer = GrammarWriter::new().unwrap();
        assert!(writer.is_empty());
        assert_eq!(writer.finish().unwrap(), "[\n]\n");
    }

    #[test]
    fn motif_shapes_render() {
        let ffl = MotifEntry::FeedForward {
            regulator: node(5),
            first: node(6),
            second: node(7),
            signs: [Sign::Plus, Sign::Minus, Sign::Plus],
        };
        assert_eq!(ffl.to_string(), "P5(+G6-G7+)");
        let multi = MotifEntry::MultiFeedForward {
            regulator: node(5),
            first: node(6),
            chained: vec![node(7), node(8)],
            signs: [Sign::Minus, Sign::Plus, Sign::Minus],
        };
        assert_eq!(multi.to_string(), "P5(-G6+(G7,G8)-)");
    }

    #[test]
    fn entries_must_match_their_block() {
        let mut writer = GrammarWriter::new().unwrap();
        assert!(writer.entry(&gene(0, &[(1, Sign::Plus)])).is_err());
        writer.open(BlockKind::MotifList).unwrap();
        let err = writer.entry(&gene(0, &[(1, Sign::Plus)])).unwrap_err();
        assert_eq!(err.info().code, "entry-kind");
    }

    #[test]
    fn finish_closes_an_open_block() {
        let mut writer = GrammarWriter::new().unwrap();
        writer.open(BlockKind::Cluster).unwrap();
        writer.entry(&gene(2, &[(3, Sign::Plus)])).unwrap();
        let text = writer.finish().unwrap();
        assert!(text.ends_with("  G2(P3+)\n)\n]\n"));
    }

    #[test]
    fn growth_keeps_earlier_content() {
        let mut writer = GrammarWriter::new().unwrap();
        writer.open(BlockKind::RegulatorList).unwrap();
        for id in 0..2_000 {
            writer.entry(&gene(id, &[(id, Sign::Plus)])).unwrap();
        }
        let text = writer.finish().unwrap();
        assert!(text.starts_with("[\nGLIST(\n  G0(P0+),\n  G1(P1+),"));
        assert!(text.ends_with("  G1999(P1999+)\n)\n]\n"));
    }
}
