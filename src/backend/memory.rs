use super::KvBackend;
use crate::error::BackendError;
use async_trait::async_trait;
use dashmap::DashMap;

/// In-process backend using a concurrent hashmap.
///
/// Data is volatile and lost on drop. Keys are matched with the same glob
/// rules Redis uses for `SCAN ... MATCH`.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: DashMap<String, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Store a payload as-is, bypassing JSON encoding.
    /// Useful to seed entries written by other systems.
    pub fn set_raw(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn flush(&self) {
        self.data.clear();
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.data.insert(key.to_owned(), value.as_bytes().to_vec());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<u64, BackendError> {
        Ok(u64::from(self.data.contains_key(key)))
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, BackendError> {
        let keys = self
            .data
            .iter()
            .filter(|entry| glob_match(pattern.as_bytes(), entry.key().as_bytes()))
            .map(|entry| entry.key().clone())
            .collect();
        Ok(keys)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Redis-style glob matching: `*`, `?`, `[...]` classes and `\` escapes.
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    match pattern {
        [] => text.is_empty(),
        [b'*', ..] => {
            let rest = trim_stars(pattern);
            if rest.is_empty() {
                return true;
            }
            (0..=text.len()).any(|i| glob_match(rest, &text[i..]))
        }
        [b'?', rest @ ..] => match text {
            [_, text_rest @ ..] => glob_match(rest, text_rest),
            [] => false,
        },
        [b'[', rest @ ..] => match text {
            [c, text_rest @ ..] => {
                let (matched, after) = match_class(rest, *c);
                matched && glob_match(after, text_rest)
            }
            [] => false,
        },
        [b'\\', escaped, rest @ ..] => match text {
            [c, text_rest @ ..] if c == escaped => glob_match(rest, text_rest),
            _ => false,
        },
        [p, rest @ ..] => match text {
            [c, text_rest @ ..] if c == p => glob_match(rest, text_rest),
            _ => false,
        },
    }
}

fn trim_stars(mut pattern: &[u8]) -> &[u8] {
    while let [b'*', rest @ ..] = pattern {
        pattern = rest;
    }
    pattern
}

/// Match `c` against a character class whose opening `[` is already consumed.
/// Returns whether it matched and the pattern after the closing `]`.
fn match_class(mut class: &[u8], c: u8) -> (bool, &[u8]) {
    let negate = class.first() == Some(&b'^');
    if negate {
        class = &class[1..];
    }

    let mut matched = false;
    loop {
        match class {
            // Unterminated class: Redis treats the end of pattern as the close.
            [] => break,
            [b']', rest @ ..] => {
                class = rest;
                break;
            }
            [b'\\', escaped, rest @ ..] => {
                matched |= *escaped == c;
                class = rest;
            }
            [lo, b'-', hi, rest @ ..] if *hi != b']' => {
                let (lo, hi) = if lo <= hi { (*lo, *hi) } else { (*hi, *lo) };
                matched |= (lo..=hi).contains(&c);
                class = rest;
            }
            [x, rest @ ..] => {
                matched |= *x == c;
                class = rest;
            }
        }
    }

    (matched != negate, class)
}
