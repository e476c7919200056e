/// Renders a distance with comma thousands separators and at most three
/// fractional digits, dropping trailing zeros (`1234567.5` => `1,234,567.5`).
pub fn format_kilometers(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rendered = format!("{:.3}", value.abs());
    let (whole, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3 + 1);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let negative = value < 0.0 && (whole != "0" || !fraction.is_empty());
    let mut output = String::new();
    if negative {
        output.push('-');
    }
    output.push_str(&grouped);
    if !fraction.is_empty() {
        output.push('.');
        output.push_str(fraction);
    }
    output
}
