//! Domain validation. Failures here surface directly to the caller as
//! [`Error::Validation`](crate::error::Error) for inline display; they are
//! never retried against another endpoint.

use crate::error::{Error, Result};

pub fn validate_email(email: &str) -> Result<()> {
    let mut parts = email.split('@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    let valid = parts.next().is_none()
        && !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace);
    if valid {
        Ok(())
    } else {
        Err(Error::Validation(format!("Invalid email address: {email}")))
    }
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.len() >= 6 {
        Ok(())
    } else {
        Err(Error::Validation("Password must be at least 6 characters".to_string()))
    }
}

pub fn validate_username(username: &str) -> Result<()> {
    if (3..=20).contains(&username.chars().count()) {
        Ok(())
    } else {
        Err(Error::Validation("Username must be 3-20 characters".to_string()))
    }
}

pub fn validate_car_title(title: &str) -> Result<()> {
    if (5..=100).contains(&title.chars().count()) {
        Ok(())
    } else {
        Err(Error::Validation("Title must be 5-100 characters".to_string()))
    }
}

pub fn validate_car_description(description: &str) -> Result<()> {
    if (10..=1000).contains(&description.chars().count()) {
        Ok(())
    } else {
        Err(Error::Validation("Description must be 10-1000 characters".to_string()))
    }
}

pub fn validate_price(price: i64) -> Result<()> {
    if price > 0 && price <= 10_000_000 {
        Ok(())
    } else {
        Err(Error::Validation("Price must be between 1 and 10,000,000".to_string()))
    }
}

pub fn validate_rating(rating: i64) -> Result<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(Error::Validation("Rating must be between 1 and 5".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("user@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a b@example.com").is_err());
        assert!(validate_email("user@@example.com").is_err());
    }

    #[test]
    fn bounds() {
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_car_title("Gol Trend 2018").is_ok());
        assert!(validate_car_title("Gol").is_err());
        assert!(validate_price(500_000).is_ok());
        assert!(validate_price(0).is_err());
        assert!(validate_price(10_000_001).is_err());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(6).is_err());
        assert!(validate_rating(0).is_err());
    }
}
