use crate::error::{Error, Result};
use crate::types::{hash_content, Chunk, RawPage};

/// Separator candidates from coarsest to finest. When none occurs in an
/// oversized fragment the splitter falls back to a strict character window.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Splits normalized page text into overlapping chunks.
///
/// Fragments are produced by the coarsest separator present in the text and
/// greedily packed up to `chunk_size` characters; each emitted chunk seeds
/// the next with up to `overlap` trailing characters. A fragment that alone
/// exceeds `chunk_size` recurses into the next-finer separator.
pub struct Splitter {
    chunk_size: usize,
    overlap: usize,
}

impl Splitter {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Configuration(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(Error::Configuration(format!(
                "chunk overlap {overlap} must be smaller than chunk size {chunk_size}"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Chunks every page, assigning each chunk a 0-based `sequence` within
    /// its page and the id `{source_id}_p{page}_c{sequence}`.
    pub fn split(&self, pages: &[RawPage]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for page in pages {
            for (sequence, text) in self.split_text(&page.text).into_iter().enumerate() {
                chunks.push(Chunk {
                    chunk_id: Chunk::id_for(&page.source_id, page.page_number, sequence),
                    source_id: page.source_id.clone(),
                    page_number: page.page_number,
                    hash: hash_content(&text),
                    text,
                    sequence,
                });
            }
        }
        chunks
    }

    /// Splits a single page's text into ordered chunk texts.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        self.split_level(text, 0, &mut pieces);
        pieces
    }

    fn split_level(&self, text: &str, start_level: usize, out: &mut Vec<String>) {
        if char_len(text) <= self.chunk_size {
            push_trimmed(out, text);
            return;
        }

        let mut level = start_level;
        while level < SEPARATORS.len() && !text.contains(SEPARATORS[level]) {
            level += 1;
        }
        if level == SEPARATORS.len() {
            self.split_chars(text, out);
            return;
        }

        let mut buf = String::new();
        // Tracks whether buf holds anything beyond the overlap seed, so a
        // bare seed is never emitted as a chunk of its own.
        let mut seed_only = true;
        for fragment in split_keeping_separator(text, SEPARATORS[level]) {
            let fragment_len = char_len(&fragment);

            if fragment_len > self.chunk_size {
                if !seed_only {
                    push_trimmed(out, &buf);
                }
                buf.clear();
                seed_only = true;
                self.split_level(&fragment, level + 1, out);
                continue;
            }

            if !seed_only && char_len(&buf) + fragment_len > self.chunk_size {
                let seed = tail_chars(&buf, self.overlap);
                push_trimmed(out, &buf);
                buf = seed;
                seed_only = true;
            }
            if seed_only && char_len(&buf) + fragment_len > self.chunk_size {
                // Shrink the seed so seed plus fragment still fit chunk_size.
                buf = tail_chars(&buf, self.chunk_size - fragment_len);
            }
            buf.push_str(&fragment);
            seed_only = false;
        }
        if !seed_only {
            push_trimmed(out, &buf);
        }
    }

    /// Finest level: strict windows of `chunk_size` chars advancing by
    /// `chunk_size - overlap`.
    fn split_chars(&self, text: &str, out: &mut Vec<String>) {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.overlap;
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let piece: String = chars[start..end].iter().collect();
            push_trimmed(out, &piece);
            if end == chars.len() {
                break;
            }
            start += step;
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn tail_chars(text: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let chars: Vec<char> = text.chars().collect();
    let start = chars.len().saturating_sub(n);
    chars[start..].iter().collect()
}

/// Splits on `sep`, keeping each separator attached to the fragment before it.
fn split_keeping_separator(text: &str, sep: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find(sep) {
        let end = pos + sep.len();
        fragments.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        fragments.push(rest.to_string());
    }
    fragments
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}
