//! Emergency number detection

use std::collections::HashSet;

/// Decides whether a destination address is an emergency number
pub trait EmergencyNumberPolicy: Send + Sync {
    fn is_emergency_number(&self, address: &str) -> bool;
}

/// A fixed set of emergency numbers
///
/// Addresses are normalised before matching: a `tel:` or `sip:` scheme, any
/// `@domain` or `;param` suffix and visual separators are removed, so
/// `tel:9-1-1` and `sip:112@example.com` both match.
#[derive(Debug, Clone, Default)]
pub struct EmergencyNumbers {
    numbers: HashSet<String>,
}

impl EmergencyNumbers {
    pub fn new<I, S>(numbers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            numbers: numbers
                .into_iter()
                .map(|n| normalize_address(n.as_ref()))
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}

impl EmergencyNumberPolicy for EmergencyNumbers {
    fn is_emergency_number(&self, address: &str) -> bool {
        let number = normalize_address(address);
        !number.is_empty() && self.numbers.contains(&number)
    }
}

/// Reduce an address to the dialable number it carries
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let lower = trimmed.to_ascii_lowercase();
    let without_scheme = if lower.starts_with("tel:") || lower.starts_with("sip:") {
        &trimmed[4..]
    } else if lower.starts_with("sips:") {
        &trimmed[5..]
    } else {
        trimmed
    };

    let user_part = without_scheme
        .split(|c| c == '@' || c == ';')
        .next()
        .unwrap_or_default();

    user_part
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect()
}
