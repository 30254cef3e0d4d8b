//! Product code and length normalization.
//!
//! Codes arrive as free text: `2x4#2`, `2x6 #3`, `2x4 MSR`. Benchmark
//! lookups key off the canonical form, so normalization lives here in one
//! place rather than at each lookup site.

use serde::{Deserialize, Serialize};

/// Sentinel length for random-length / mixed-tally stock.
pub const RANDOM_LENGTH: &str = "RL";

/// A lumber product code, stored whitespace-stripped.
///
/// Form is `<dimension>#<grade>` (e.g. `2x4#2`) or `<dimension> MSR` for
/// machine-stress-rated stock.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductCode(String);

impl ProductCode {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let stripped: String = raw.as_ref().chars().filter(|c| !c.is_whitespace()).collect();
        ProductCode(stripped)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical lookup key: grade `#2` is appended when the code carries no
    /// grade marker. MSR codes are left alone; they price off the grade
    /// cards via their own lookup path.
    pub fn canonical(&self) -> String {
        if self.0.contains('#') || self.is_msr() {
            self.0.clone()
        } else {
            format!("{}#2", self.0)
        }
    }

    /// Canonical code with any `#<grade>` suffix stripped (`2x4#2` -> `2x4`).
    pub fn base_dimension(&self) -> String {
        let canonical = self.canonical();
        match canonical.find('#') {
            Some(idx) => canonical[..idx].to_string(),
            None => canonical,
        }
    }

    /// First `<digits>x<digits>` run in the code (`2x4MSR` -> `2x4`).
    pub fn dimension(&self) -> Option<String> {
        let bytes = self.0.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i].is_ascii_digit() {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i < bytes.len() && (bytes[i] == b'x' || bytes[i] == b'X') {
                    let mid = i;
                    i += 1;
                    let depth_start = i;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                    if i > depth_start {
                        let mut dim = String::with_capacity(i - start);
                        dim.push_str(&self.0[start..mid]);
                        dim.push('x');
                        dim.push_str(&self.0[depth_start..i]);
                        return Some(dim);
                    }
                }
            } else {
                i += 1;
            }
        }
        None
    }

    /// True for machine-stress-rated stock.
    pub fn is_msr(&self) -> bool {
        self.0.to_ascii_uppercase().contains("MSR")
    }
}

impl std::fmt::Display for ProductCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductCode {
    fn from(raw: &str) -> Self {
        ProductCode::new(raw)
    }
}

/// Reduce a length spec to its digit characters only.
///
/// `"16'"` -> `"16"`; the `RL` sentinel (and anything digit-free) normalizes
/// to the empty string, which the resolver treats as "no specific length".
pub fn normalize_length(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}
