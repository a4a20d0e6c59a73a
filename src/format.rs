//! Text rendering helpers shared by the query tools.

/// Footer appended to every tool answer.
pub const DISCLAIMER: &str = "Note: Monthly premiums in CHF for mandatory basic health insurance, \
based on the official premium data published by the Federal Office of Public Health. \
Figures are indicative; confirm the exact offer with the insurer before switching.";

/// `CHF 312.45`
pub fn chf(amount: f64) -> String {
    format!("CHF {:.2}", amount)
}

/// Relative change from `from` to `to`, in percent. `None` when `from` is zero.
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    (from != 0.0).then(|| (to - from) / from * 100.0)
}

/// `+4.2%` / `-1.0%`
pub fn signed_percent(value: f64) -> String {
    format!("{:+.1}%", value)
}

/// `1'234'567`, the Swiss thousands separator.
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('\'');
        }
        out.push(ch);
    }
    out
}

/// Append the disclaimer footer separated by a blank line.
pub fn with_disclaimer(body: &str) -> String {
    format!("{}\n\n{}", body.trim_end(), DISCLAIMER)
}
