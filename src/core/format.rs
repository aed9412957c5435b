/// Whole-dollar currency with thousands separators, e.g. `$12,345` or `-$900`.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "$0".to_string();
    }
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(rounded.abs() as u64))
}

/// Monthly amount, e.g. `$1,200/mo`.
pub fn format_monthly(value: f64) -> String {
    format!("{}/mo", format_currency(value))
}

/// Percent with at most one decimal, trailing `.0` dropped.
pub fn format_pct(value: f64) -> String {
    if !value.is_finite() {
        return "0%".to_string();
    }
    let tenths = (value * 10.0).round() / 10.0;
    if (tenths - tenths.round()).abs() < 1e-9 {
        format!("{}%", tenths.round() as i64)
    } else {
        format!("{tenths:.1}%")
    }
}

pub fn format_range(low: f64, high: f64) -> String {
    format!("{} - {}", format_currency(low), format_currency(high))
}

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        let chunk = n % 1000;
        n /= 1000;
        if n == 0 {
            groups.push(chunk.to_string());
            break;
        }
        groups.push(format!("{chunk:03}"));
    }
    groups.reverse();
    groups.join(",")
}
