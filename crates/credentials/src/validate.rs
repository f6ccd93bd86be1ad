//! Input validation rules shared by registration and CRUD handlers.

/// Minimum length for first and last names.
pub const MIN_NAME_LEN: usize = 2;

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Loose email well-formedness check: one '@', non-empty local part, and a
/// dotted domain. Deliverability is not our problem.
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };

    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && tld.len() >= 2,
        None => false,
    }
}

/// Ticker symbols: 1-5 uppercase ASCII letters.
pub fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty() && symbol.len() <= 5 && symbol.bytes().all(|b| b.is_ascii_uppercase())
}

pub fn is_valid_name(name: &str) -> bool {
    name.trim().len() >= MIN_NAME_LEN
}

pub fn is_valid_password(password: &str) -> bool {
    password.len() >= MIN_PASSWORD_LEN
}
