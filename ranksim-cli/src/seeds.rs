use anyhow::{Result, bail};

/// Batch seed chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    /// Drawn from entropy rather than given explicitly.
    pub random: bool,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            random: false,
        }
    }

    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            seed: rand::random(),
            random: true,
        }
    }
}

/// Resolve a `--seed` token.
///
/// Accepts decimal integers (negative values use their magnitude), `0x`
/// hexadecimal, and the keyword `random`.
pub fn resolve_seed(token: &str) -> Result<SeedInfo> {
    let token = token.trim();
    if token.is_empty() {
        bail!("seed must not be empty");
    }

    if token.eq_ignore_ascii_case("random") {
        return Ok(SeedInfo::from_entropy());
    }

    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        if let Ok(value) = u64::from_str_radix(hex, 16) {
            return Ok(SeedInfo::from_numeric(value));
        }
        bail!("Unrecognized hex seed: {token}");
    }

    if let Ok(value) = token.parse::<i64>() {
        return Ok(SeedInfo::from_numeric(value.unsigned_abs()));
    }

    if let Ok(value) = token.parse::<u64>() {
        return Ok(SeedInfo::from_numeric(value));
    }

    bail!("Unrecognized seed token: {token}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_numeric_and_hex() {
        assert_eq!(resolve_seed("42").unwrap(), SeedInfo::from_numeric(42));
        assert_eq!(resolve_seed("-7").unwrap().seed, 7);
        assert_eq!(resolve_seed("0xFF").unwrap().seed, 255);
        assert_eq!(resolve_seed(&u64::MAX.to_string()).unwrap().seed, u64::MAX);
    }

    #[test]
    fn random_keyword_marks_seed() {
        let info = resolve_seed("Random").unwrap();
        assert!(info.random);
    }

    #[test]
    fn rejects_garbage() {
        assert!(resolve_seed("").is_err());
        assert!(resolve_seed("0xZZ").is_err());
        assert!(resolve_seed("seedy").is_err());
    }
}
