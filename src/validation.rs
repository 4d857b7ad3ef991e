//! Field rules for user and link input.
//!
//! Every rule is a pure function. The composite checks run their rules in a
//! fixed order and stop at the first failure, so a given input always reports
//! the same single error.

use std::ops::RangeInclusive;

use uuid::Uuid;
use validator::{ValidateEmail, ValidateUrl};

use crate::{
    error::ValidationError,
    types::{NewLink, NewUser},
};

const USERNAME_LENGTH: RangeInclusive<usize> = 4..=250;
const PASSWORD_LENGTH: RangeInclusive<usize> = 8..=500;
const TITLE_LENGTH: RangeInclusive<usize> = 4..=250;

fn required_with_length(value: &str, length: RangeInclusive<usize>) -> bool {
    !value.is_empty() && length.contains(&value.chars().count())
}

fn check(valid: bool, err: ValidationError) -> Result<(), ValidationError> {
    if valid {
        Ok(())
    } else {
        Err(err)
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    check(
        required_with_length(username, USERNAME_LENGTH),
        ValidationError::Username,
    )
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    check(
        !email.is_empty() && email.validate_email(),
        ValidationError::Email,
    )
}

/// Only ever applied to the plaintext at account creation.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    check(
        required_with_length(password, PASSWORD_LENGTH),
        ValidationError::Password,
    )
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    check(
        required_with_length(title, TITLE_LENGTH),
        ValidationError::Title,
    )
}

pub fn validate_href(href: &str) -> Result<(), ValidationError> {
    check(!href.is_empty() && href.validate_url(), ValidationError::Href)
}

pub fn validate_user_reference(id: &str) -> Result<(), ValidationError> {
    check(
        !id.is_empty() && Uuid::parse_str(id).is_ok(),
        ValidationError::User,
    )
}

/// Username, then email, then password.
pub fn validate_new_user(user: &NewUser) -> Result<(), ValidationError> {
    validate_username(&user.username.0)?;
    validate_email(&user.email.0)?;
    validate_password(&user.password.0)
}

/// Title, then href, then owning user.
pub fn validate_new_link(link: &NewLink) -> Result<(), ValidationError> {
    validate_title(&link.title)?;
    validate_href(&link.href)?;
    validate_user_reference(&link.user.0)
}
