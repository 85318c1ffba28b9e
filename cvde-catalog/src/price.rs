use crate::exam::CatalogError;

/// Converts an admin-supplied decimal price into integer cents. Returns None
/// for anything that is not a finite number greater than or equal to zero.
pub fn cents_from_input(price: f64) -> Option<i64> {
    if !price.is_finite() || price < 0.0 {
        return None;
    }
    Some((price * 100.0).round() as i64)
}

/// Price-only update validation, with the message that screen shows.
pub fn validate_price_update(price: f64) -> Result<i64, CatalogError> {
    cents_from_input(price).ok_or(CatalogError::InvalidPriceUpdate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cents_from_input_rounds_to_cents() {
        assert_eq!(cents_from_input(50.0), Some(5000));
        assert_eq!(cents_from_input(49.99), Some(4999));
        assert_eq!(cents_from_input(0.0), Some(0));
        assert_eq!(cents_from_input(0.005), Some(1));
    }

    #[test]
    fn test_cents_from_input_rejects_non_finite_and_negative() {
        assert_eq!(cents_from_input(f64::NAN), None);
        assert_eq!(cents_from_input(f64::INFINITY), None);
        assert_eq!(cents_from_input(-0.01), None);
    }

    #[test]
    fn test_validate_price_update_message() {
        let err = validate_price_update(-5.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Price must be a number greater than or equal to zero."
        );
    }
}
