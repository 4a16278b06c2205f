//! Formatting helpers for command summaries.

/// Compact count for log lines: `950`, `1.5K`, `2.3M`.
///
/// # Examples
/// ```
/// use iplists::utils::format_count;
/// assert_eq!(format_count(950), "950");
/// assert_eq!(format_count(1500), "1.5K");
/// ```
pub fn format_count(count: usize) -> String {
    match count {
        0..=999 => count.to_string(),
        1_000..=999_999 => format!("{:.1}K", count as f64 / 1e3),
        _ => format!("{:.1}M", count as f64 / 1e6),
    }
}

/// Count with comma thousands separators, as printed in summaries.
///
/// Takes a `u128` so address totals of IPv6 blocks fit.
///
/// # Examples
/// ```
/// use iplists::utils::format_count_with_separator;
/// assert_eq!(format_count_with_separator(1_234_567), "1,234,567");
/// ```
pub fn format_count_with_separator(n: u128) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;

    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    out.push_str(&digits[..head]);
    for (i, group) in digits.as_bytes()[head..].chunks(3).enumerate() {
        if head > 0 || i > 0 {
            out.push(',');
        }
        // Digits are ASCII
        out.extend(group.iter().map(|&b| b as char));
    }
    out
}
