use anyhow::{Context, Result, bail};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse a comma-separated list of win rates such as `0.45,0.5,0.55`.
pub fn parse_win_rates(s: &str) -> Result<Vec<f64>> {
    let rates = split_csv(s)
        .iter()
        .map(|token| {
            token
                .parse::<f64>()
                .with_context(|| format!("invalid win rate: {token}"))
        })
        .collect::<Result<Vec<_>>>()?;
    if rates.is_empty() {
        bail!("no win rates given");
    }
    Ok(rates)
}

/// Quote a CSV cell when it holds a separator, quote or line break.
pub fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Format an integer with `,` thousands separators.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
