//! Display formatting shared across the vet and admin surfaces: currency,
//! digit normalization and the document/phone masks used throughout the portal.

/// Strips everything but ASCII digits. All document and phone validation
/// operates on the normalized form this returns.
pub fn digits_only(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Renders integer cents as a dollar amount with thousands grouping,
/// e.g. 123450 -> `$1,234.50`. Negative amounts keep the sign ahead of `$`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let dollars = (abs / 100).to_string();
    let remainder = abs % 100;

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    let len = dollars.len();
    for (i, ch) in dollars.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", sign, grouped, remainder)
}

/// Formats an 11-digit government ID as `000.000.000-00`. Inputs that do not
/// normalize to 11 digits are returned trimmed but otherwise untouched.
pub fn format_government_id(input: &str) -> String {
    let digits = digits_only(input);
    if digits.len() != 11 {
        return input.trim().to_string();
    }
    format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11]
    )
}

/// Formats an 11-digit local phone number as `(00) 00000-0000`.
pub fn format_local_phone(input: &str) -> String {
    let digits = digits_only(input);
    if digits.len() != 11 {
        return input.trim().to_string();
    }
    format!("({}) {}-{}", &digits[0..2], &digits[2..7], &digits[7..11])
}

/// Formats a 13-digit international driver phone as `+00 (00) 00000-0000`.
pub fn format_driver_phone(input: &str) -> String {
    let digits = digits_only(input);
    if digits.len() != 13 {
        return input.trim().to_string();
    }
    format!(
        "+{} ({}) {}-{}",
        &digits[0..2],
        &digits[2..4],
        &digits[4..9],
        &digits[9..13]
    )
}

/// Greeting name for a vet: prefixes `Dr. ` unless the name already carries a
/// doctor title. Blank names fall back to a generic `Doctor`.
pub fn format_doctor_name(full_name: Option<&str>) -> String {
    let base = full_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("Doctor");

    let already_titled = base
        .get(..2)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("dr"));

    if already_titled {
        base.to_string()
    } else {
        format!("Dr. {}", base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_only_strips_punctuation() {
        assert_eq!(digits_only("123.456.789-09"), "12345678909");
        assert_eq!(digits_only("+55 (11) 98888-7777"), "5511988887777");
        assert_eq!(digits_only("no digits"), "");
    }

    #[test]
    fn test_format_cents_groups_thousands() {
        assert_eq!(format_cents(0), "$0.00");
        assert_eq!(format_cents(8000), "$80.00");
        assert_eq!(format_cents(123450), "$1,234.50");
        assert_eq!(format_cents(100000000), "$1,000,000.00");
        assert_eq!(format_cents(-500), "-$5.00");
    }

    #[test]
    fn test_format_government_id_mask() {
        assert_eq!(format_government_id("12345678909"), "123.456.789-09");
        assert_eq!(format_government_id(" 123.456.789-0 "), "123.456.789-0");
    }

    #[test]
    fn test_format_phone_masks() {
        assert_eq!(format_local_phone("11988887777"), "(11) 98888-7777");
        assert_eq!(format_driver_phone("5511988887777"), "+55 (11) 98888-7777");
        assert_eq!(format_driver_phone("123"), "123");
    }

    #[test]
    fn test_format_doctor_name_prefix() {
        assert_eq!(format_doctor_name(Some("Alice Souza")), "Dr. Alice Souza");
        assert_eq!(format_doctor_name(Some("Dr. Alice")), "Dr. Alice");
        assert_eq!(format_doctor_name(Some("dra Maria")), "dra Maria");
        assert_eq!(format_doctor_name(Some("   ")), "Dr. Doctor");
        assert_eq!(format_doctor_name(None), "Dr. Doctor");
    }
}
