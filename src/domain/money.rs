use std::fmt;

/// Money is represented as integer paise to avoid floating-point drift in the ledger.
/// 1 rupee = 100 paise, so ₹50.00 = 5000 paise.
pub type Paise = i64;

pub const PAISE_PER_RUPEE: i64 = 100;

/// Format paise as a rupee amount.
/// Example: 5000 -> "₹50.00", -1234 -> "-₹12.34"
pub fn format_rupees(paise: Paise) -> String {
    let sign = if paise < 0 { "-" } else { "" };
    let abs = paise.abs();
    format!(
        "{}₹{}.{:02}",
        sign,
        abs / PAISE_PER_RUPEE,
        abs % PAISE_PER_RUPEE
    )
}

/// Parse a rupee amount into paise. A leading `₹` is accepted.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "₹100" -> 10000
pub fn parse_rupees(input: &str) -> Result<Paise, ParseAmountError> {
    let input = input.trim().trim_start_matches('₹').replace(',', "");
    let negative = input.starts_with('-');
    let input = input.trim_start_matches('-');

    let (whole, fraction) = match input.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (input, ""),
    };
    if fraction.contains('.') || (whole.is_empty() && fraction.is_empty()) {
        return Err(ParseAmountError::InvalidFormat);
    }

    let rupees: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| ParseAmountError::InvalidFormat)?
    };

    // Anything past two decimal places is truncated
    let paise: i64 = match fraction.len() {
        0 => 0,
        1 => {
            fraction
                .parse::<i64>()
                .map_err(|_| ParseAmountError::InvalidFormat)?
                * 10
        }
        _ => fraction[..2]
            .parse()
            .map_err(|_| ParseAmountError::InvalidFormat)?,
    };

    let total = rupees
        .checked_mul(PAISE_PER_RUPEE)
        .and_then(|v| v.checked_add(paise))
        .ok_or(ParseAmountError::Overflow)?;
    Ok(if negative { -total } else { total })
}

/// Convert paise to a floating rupee value for interest math.
pub fn paise_to_rupees(paise: Paise) -> f64 {
    paise as f64 / PAISE_PER_RUPEE as f64
}

/// Round a rupee value to the nearest whole rupee and express it in paise.
/// Returns `None` when the value is not finite or does not fit in `Paise`.
pub fn whole_rupees_to_paise(rupees: f64) -> Option<Paise> {
    let rounded = rupees.round();
    if !rounded.is_finite() || rounded.abs() >= MAX_WHOLE_RUPEES {
        return None;
    }
    (rounded as i64).checked_mul(PAISE_PER_RUPEE)
}

// i64::MAX / 100 as f64 rounds up, so the bound is exclusive
const MAX_WHOLE_RUPEES: f64 = (i64::MAX / PAISE_PER_RUPEE) as f64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    InvalidFormat,
    Overflow,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
            ParseAmountError::Overflow => write!(f, "amount is too large"),
        }
    }
}

impl std::error::Error for ParseAmountError {}
