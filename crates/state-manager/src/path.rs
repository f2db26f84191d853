//! Parsed addresses into nested state.
//!
//! A path string is parsed once into a list of [`Seg`]s:
//!
//! - `a.b.c` → `Key(a), Key(b), Key(c)`
//! - `list[2]` and `list.2` → `Key(list), Index(2)`
//! - `""` → the root path (no segments)
//!
//! Parsing never fails. Segments that do not look like a plain decimal index
//! are kept as keys verbatim, including empty ones (`a..b`).

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Seg {
    Key(String),
    Index(usize),
}

impl Seg {
    /// Only canonical decimals (`0`, `17`, not `017`) below `u32::MAX` become
    /// indices, so an index segment always round-trips to the same mapping
    /// key. Larger numbers address a plain key.
    fn parse(raw: &str) -> Seg {
        let canonical = raw == "0" || !raw.starts_with('0');
        if canonical
            && !raw.is_empty()
            && raw.bytes().all(|b| b.is_ascii_digit())
            && let Ok(i) = raw.parse::<u32>()
            && i < u32::MAX
        {
            return Seg::Index(i as usize);
        }
        Seg::Key(raw.to_owned())
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Seg::Index(_))
    }

    /// The mapping key this segment writes to.
    pub fn to_key(&self) -> String {
        match self {
            Seg::Key(k) => k.clone(),
            Seg::Index(i) => i.to_string(),
        }
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => f.write_str(k),
            Seg::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Seg {
    fn from(k: &str) -> Self {
        Seg::Key(k.to_owned())
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path(SmallVec<[Seg; 4]>);

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::root();
        }
        let normalized = normalize_brackets(raw);
        let path = Path(normalized.split('.').map(Seg::parse).collect());
        log::trace!("parsed path {raw:?} into {} segment(s)", path.len());
        path
    }

    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Seg::Key(k.into()));
        self
    }

    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    pub fn push(&mut self, seg: Seg) {
        self.0.push(seg);
    }

    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Rewrite every `[word]` group (word = `[A-Za-z0-9_]+`) to `.word`.
/// Brackets around anything else are left in place.
fn normalize_brackets(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut rest = raw;
    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(']') {
            Some(close)
                if close > 0
                    && after[..close]
                        .bytes()
                        .all(|b| b.is_ascii_alphanumeric() || b == b'_') =>
            {
                out.push('.');
                out.push_str(&after[..close]);
                rest = &after[close + 1..];
            }
            _ => {
                out.push('[');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Path::parse(s))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path::parse(s)
    }
}

impl From<String> for Path {
    fn from(s: String) -> Self {
        Path::parse(&s)
    }
}

impl From<&String> for Path {
    fn from(s: &String) -> Self {
        Path::parse(s)
    }
}

impl FromIterator<Seg> for Path {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}
