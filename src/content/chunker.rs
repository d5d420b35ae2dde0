//! Title-based document chunking.
//!
//! Splits a document at its headings first, then applies size constraints
//! within each section: small paragraphs are merged, oversized ones are
//! split with a sliding window and overlap. Every chunk carries the heading
//! hierarchy it appeared under.

use super::config::ChunkingConfig;

/// A chunk of document text ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Byte range in the source text (start, end).
    pub byte_range: (usize, usize),

    /// The chunk text.
    pub text: String,

    /// Heading hierarchy above this chunk (e.g. ["Guide", "Installation"]).
    pub heading_context: Vec<String>,
}

impl Chunk {
    /// Character count of the chunk text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Trait for document chunking strategies.
pub trait Chunker: Send + Sync {
    /// Split document text into chunks.
    fn chunk(&self, text: &str, config: &ChunkingConfig) -> Vec<Chunk>;
}

/// Chunker that sections a document by its titles before sizing.
#[derive(Debug, Default)]
pub struct TitleChunker;

impl TitleChunker {
    pub fn new() -> Self {
        Self
    }
}

impl Chunker for TitleChunker {
    fn chunk(&self, text: &str, config: &ChunkingConfig) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let headings = extract_headings(text);
        let mut chunks = Vec::new();

        for section in split_sections(text, &headings) {
            let pieces = split_paragraphs(section.body, section.body_start);
            let merged = merge_small_pieces(pieces, config.min_chunk_chars);

            for piece in merged {
                for sized in split_oversized(piece, config.max_chunk_chars, config.overlap_chars) {
                    chunks.push(Chunk {
                        byte_range: sized.byte_range,
                        text: sized.text,
                        heading_context: section.context.clone(),
                    });
                }
            }
        }

        chunks
    }
}

/// A markdown heading with its position in the source.
#[derive(Debug, Clone)]
struct Heading {
    level: u8,
    text: String,
    start_byte: usize,
    end_byte: usize,
}

/// A title-delimited section: body text plus the heading stack above it.
struct Section<'a> {
    body: &'a str,
    body_start: usize,
    context: Vec<String>,
}

/// A run of text with its byte range, before heading context is attached.
#[derive(Debug, Clone)]
struct Piece {
    byte_range: (usize, usize),
    text: String,
}

impl Piece {
    fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

fn extract_headings(text: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']).trim_start();
        if let Some(rest) = trimmed.strip_prefix('#') {
            let extra = rest.chars().take_while(|c| *c == '#').count();
            let level = 1 + extra;
            let title = rest[extra..].trim();
            if level <= 6 && !title.is_empty() {
                headings.push(Heading {
                    level: level as u8,
                    text: title.to_string(),
                    start_byte: offset,
                    end_byte: offset + line.len(),
                });
            }
        }
        offset += line.len();
    }

    headings
}

fn split_sections<'a>(text: &'a str, headings: &[Heading]) -> Vec<Section<'a>> {
    let mut sections = Vec::new();

    // Preamble before the first heading has no context.
    let preamble_end = headings.first().map_or(text.len(), |h| h.start_byte);
    if preamble_end > 0 {
        sections.push(Section {
            body: &text[..preamble_end],
            body_start: 0,
            context: Vec::new(),
        });
    }

    // Heading stack: a level-N heading closes everything at level >= N.
    let mut stack: Vec<(u8, String)> = Vec::new();

    for (i, heading) in headings.iter().enumerate() {
        while stack.last().is_some_and(|(level, _)| *level >= heading.level) {
            stack.pop();
        }
        stack.push((heading.level, heading.text.clone()));

        let body_start = heading.end_byte;
        let body_end = headings
            .get(i + 1)
            .map_or(text.len(), |next| next.start_byte);

        sections.push(Section {
            body: &text[body_start..body_end],
            body_start,
            context: stack.iter().map(|(_, title)| title.clone()).collect(),
        });
    }

    sections
}

/// Split a section body into paragraphs delimited by blank lines.
fn split_paragraphs(body: &str, base_offset: usize) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut offset = 0;

    for part in body.split("\n\n") {
        let leading_ws = part.len() - part.trim_start().len();
        let content = part.trim();

        if !content.is_empty() {
            let start = base_offset + offset + leading_ws;
            pieces.push(Piece {
                byte_range: (start, start + content.len()),
                text: content.to_string(),
            });
        }

        offset += part.len() + 2;
    }

    pieces
}

/// Merge consecutive pieces until each reaches the minimum size.
fn merge_small_pieces(pieces: Vec<Piece>, min_chars: usize) -> Vec<Piece> {
    let mut result: Vec<Piece> = Vec::new();

    for piece in pieces {
        match result.last_mut() {
            Some(last) if last.char_count() < min_chars => {
                last.byte_range.1 = piece.byte_range.1;
                last.text.push_str("\n\n");
                last.text.push_str(&piece.text);
            }
            _ => result.push(piece),
        }
    }

    result
}

/// Split an oversized piece with a sliding window and overlap.
fn split_oversized(piece: Piece, max_chars: usize, overlap_chars: usize) -> Vec<Piece> {
    let char_positions: Vec<usize> = piece.text.char_indices().map(|(i, _)| i).collect();
    let total = char_positions.len();

    if total <= max_chars {
        return vec![piece];
    }

    let step = max_chars.saturating_sub(overlap_chars).max(1);
    let mut result = Vec::new();
    let mut start = 0;

    while start < total {
        let end = (start + max_chars).min(total);
        let byte_start = char_positions[start];
        let byte_end = if end < total {
            char_positions[end]
        } else {
            piece.text.len()
        };

        result.push(Piece {
            byte_range: (
                piece.byte_range.0 + byte_start,
                piece.byte_range.0 + byte_end,
            ),
            text: piece.text[byte_start..byte_end].to_string(),
        });

        if end == total {
            break;
        }
        start += step;
    }

    result
}
