use crate::domain::errors::ValidationError;
use crate::domain::value_objects::quantity::Quantity;
use serde::{Deserialize, Serialize};

/// Market price value object. Always finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(f64);

impl Price {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::MustBeFinite);
        }
        if value < 0.0 {
            return Err(ValidationError::NegativePrice);
        }
        Ok(Price(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Monetary value of `quantity` units at this price.
    pub fn times(&self, quantity: Quantity) -> f64 {
        self.0 * quantity.value()
    }
}

impl TryFrom<f64> for Price {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Price::new(value)
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> f64 {
        price.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_new_valid() {
        let price = Price::new(100.0);
        assert!(price.is_ok());
        assert_eq!(price.unwrap().value(), 100.0);
    }

    #[test]
    fn test_price_new_negative() {
        let price = Price::new(-10.0);
        assert_eq!(price.unwrap_err(), ValidationError::NegativePrice);
    }

    #[test]
    fn test_price_new_zero() {
        let price = Price::new(0.0);
        assert!(price.is_ok());
        assert_eq!(price.unwrap().value(), 0.0);
    }

    #[test]
    fn test_price_new_nan() {
        let price = Price::new(f64::NAN);
        assert_eq!(price.unwrap_err(), ValidationError::MustBeFinite);
    }

    #[test]
    fn test_price_times_quantity() {
        let price = Price::new(5.0).unwrap();
        let quantity = Quantity::new(10.0).unwrap();
        assert_eq!(price.times(quantity), 50.0);
    }

    #[test]
    fn test_price_deserialize_rejects_negative() {
        let result: Result<Price, _> = serde_json::from_str("-3.5");
        assert!(result.is_err());
    }

    #[test]
    fn test_price_serialize_transparent() {
        let price = Price::new(42.5).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "42.5");
    }
}
