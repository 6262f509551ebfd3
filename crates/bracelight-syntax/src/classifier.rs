//! Comment and literal classification backed by tree-sitter.

use std::ops::Range;
use std::sync::Arc;

use bracelight_buffer::{Affinity, Snapshot, Version};
use bracelight_core::ClassificationOracle;
use bracelight_core::classify::affine_offset;
use parking_lot::Mutex;
use tree_sitter::{Node, Parser, Tree};

use crate::{SyntaxError, new_parser};

/// Snapshots kept parsed at once. A background scan on an older
/// snapshot and the foreground pass on the newest one both stay warm.
const CACHED_VERSIONS: usize = 4;

/// Coarse class of a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Comment,
    Literal,
    Other,
}

impl TokenClass {
    /// Maps node kinds to classes based on common tree-sitter node types.
    pub fn from_node_kind(kind: &str) -> Self {
        match kind {
            "line_comment" | "block_comment" | "comment" => TokenClass::Comment,

            "string_literal" | "raw_string_literal" | "char_literal" | "string"
            | "template_string" | "regex" => TokenClass::Literal,

            _ => TokenClass::Other,
        }
    }

    pub fn is_comment_or_literal(self) -> bool {
        matches!(self, TokenClass::Comment | TokenClass::Literal)
    }
}

/// Code embedded in a literal: JS `${...}`, Python f-string `{...}`.
fn is_embedded_code(kind: &str) -> bool {
    matches!(kind, "template_substitution" | "interpolation")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClassRange {
    range: Range<usize>,
    class: TokenClass,
}

/// Comment and literal ranges of one snapshot version, in characters.
#[derive(Debug)]
struct Classification {
    version: Version,
    /// Sorted, non-overlapping
    ranges: Vec<ClassRange>,
}

impl Classification {
    fn class_at(&self, offset: usize) -> TokenClass {
        let idx = self.ranges.partition_point(|r| r.range.end <= offset);
        match self.ranges.get(idx) {
            Some(r) if r.range.start <= offset => r.class,
            _ => TokenClass::Other,
        }
    }
}

/// Classification oracle for one buffer in one language.
///
/// Each snapshot version is parsed once, on first query. Use one
/// classifier per buffer: the cache is keyed by version alone.
///
/// Parsers are pooled, so a scan on the newest snapshot never waits for
/// a background scan that is still parsing an older one.
pub struct SyntaxClassifier {
    language: String,
    parsers: Mutex<Vec<Parser>>,
    cache: Mutex<Vec<Arc<Classification>>>,
}

impl SyntaxClassifier {
    /// Creates a classifier for a language.
    pub fn new(lang: &str) -> Result<Self, SyntaxError> {
        Ok(Self {
            language: lang.to_string(),
            parsers: Mutex::new(vec![new_parser(lang)?]),
            cache: Mutex::new(Vec::with_capacity(CACHED_VERSIONS)),
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Returns the class of the character at `offset`.
    pub fn class_at(&self, snapshot: &Snapshot, offset: usize) -> Result<TokenClass, SyntaxError> {
        Ok(self.classification(snapshot)?.class_at(offset))
    }

    fn cached(&self, version: Version) -> Option<Arc<Classification>> {
        self.cache
            .lock()
            .iter()
            .find(|c| c.version == version)
            .map(Arc::clone)
    }

    fn classification(&self, snapshot: &Snapshot) -> Result<Arc<Classification>, SyntaxError> {
        if let Some(hit) = self.cached(snapshot.version()) {
            return Ok(hit);
        }

        let parsed = Arc::new(self.classify(snapshot)?);
        let mut cache = self.cache.lock();
        // Another thread may have finished the same version meanwhile.
        if let Some(hit) = cache.iter().find(|c| c.version == parsed.version) {
            return Ok(Arc::clone(hit));
        }
        if cache.len() == CACHED_VERSIONS {
            cache.remove(0);
        }
        cache.push(Arc::clone(&parsed));
        Ok(parsed)
    }

    fn parse(&self, source: &str) -> Result<Tree, SyntaxError> {
        let pooled = self.parsers.lock().pop();
        let mut parser = match pooled {
            Some(parser) => parser,
            None => new_parser(&self.language)?,
        };
        let tree = parser.parse(source.as_bytes(), None);
        self.parsers.lock().push(parser);
        tree.ok_or(SyntaxError::ParseError)
    }

    fn classify(&self, snapshot: &Snapshot) -> Result<Classification, SyntaxError> {
        let tree = self.parse(&snapshot.text())?;

        let mut bytes = Vec::new();
        collect_ranges(tree.root_node(), &mut bytes);

        let mut ranges = Vec::with_capacity(bytes.len());
        for ClassRange { range, class } in bytes {
            ranges.push(ClassRange {
                range: snapshot.byte_to_char(range.start)?..snapshot.byte_to_char(range.end)?,
                class,
            });
        }

        tracing::trace!(
            language = %self.language,
            version = %snapshot.version(),
            ranges = ranges.len(),
            "snapshot classified"
        );
        Ok(Classification {
            version: snapshot.version(),
            ranges,
        })
    }
}

impl ClassificationOracle for SyntaxClassifier {
    fn is_comment_or_literal(&self, snapshot: &Snapshot, offset: usize, affinity: Affinity) -> bool {
        let Some(at) = affine_offset(offset, affinity) else {
            return false;
        };
        match self.classification(snapshot) {
            Ok(classification) => classification.class_at(at).is_comment_or_literal(),
            Err(err) => {
                tracing::debug!("classification unavailable: {}", err);
                false
            }
        }
    }
}

/// Recursively collects the byte ranges of comment and literal nodes.
///
/// Ranges never nest. Code embedded in a literal is left out of the
/// literal's range and walked like any other code.
fn collect_ranges(node: Node, ranges: &mut Vec<ClassRange>) {
    let class = TokenClass::from_node_kind(node.kind());
    if class.is_comment_or_literal() {
        collect_literal(node, class, ranges);
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_ranges(child, ranges);
    }
}

fn collect_literal(node: Node, class: TokenClass, ranges: &mut Vec<ClassRange>) {
    let mut start = node.start_byte();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if !is_embedded_code(child.kind()) {
            continue;
        }
        if start < child.start_byte() {
            ranges.push(ClassRange {
                range: start..child.start_byte(),
                class,
            });
        }
        collect_ranges(child, ranges);
        start = child.end_byte();
    }
    if start < node.end_byte() {
        ranges.push(ClassRange {
            range: start..node.end_byte(),
            class,
        });
    }
}
