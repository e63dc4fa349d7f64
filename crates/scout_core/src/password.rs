//! Client-side account checks, evaluated before any auth request is sent.

pub const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordRule {
    MinLength,
    Uppercase,
    Lowercase,
    Digit,
    Symbol,
}

impl PasswordRule {
    pub const ALL: [PasswordRule; 5] = [
        PasswordRule::MinLength,
        PasswordRule::Uppercase,
        PasswordRule::Lowercase,
        PasswordRule::Digit,
        PasswordRule::Symbol,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PasswordRule::MinLength => "Mínimo 8 caracteres",
            PasswordRule::Uppercase => "Letra maiúscula (A-Z)",
            PasswordRule::Lowercase => "Letra minúscula (a-z)",
            PasswordRule::Digit => "Número (0-9)",
            PasswordRule::Symbol => "Símbolo (!@#$%...)",
        }
    }

    pub fn is_satisfied_by(self, password: &str) -> bool {
        match self {
            PasswordRule::MinLength => password.chars().count() >= MIN_PASSWORD_CHARS,
            PasswordRule::Uppercase => password.chars().any(|c| c.is_ascii_uppercase()),
            PasswordRule::Lowercase => password.chars().any(|c| c.is_ascii_lowercase()),
            PasswordRule::Digit => password.chars().any(|c| c.is_ascii_digit()),
            // Anything outside [A-Za-z0-9] counts, including spaces and accents.
            PasswordRule::Symbol => password.chars().any(|c| !c.is_ascii_alphanumeric()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleCheck {
    pub rule: PasswordRule,
    pub passed: bool,
}

/// Evaluates every rule, in display order.
pub fn check_password(password: &str) -> Vec<RuleCheck> {
    PasswordRule::ALL
        .iter()
        .map(|&rule| RuleCheck {
            rule,
            passed: rule.is_satisfied_by(password),
        })
        .collect()
}

pub fn failed_rules(password: &str) -> Vec<PasswordRule> {
    check_password(password)
        .into_iter()
        .filter(|check| !check.passed)
        .map(|check| check.rule)
        .collect()
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("campo obrigatório: {0}")]
    MissingField(&'static str),
    #[error("A senha não atende aos requisitos de segurança.")]
    WeakPassword { failed: Vec<PasswordRule> },
    #[error("As senhas não coincidem.")]
    PasswordMismatch,
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::MissingField("email"));
    }
    if password.is_empty() {
        return Err(ValidationError::MissingField("password"));
    }
    Ok(())
}

/// Registration needs all fields, a policy-compliant password and a matching
/// confirmation. Policy is checked before the confirmation.
pub fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
    confirmation: &str,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::MissingField("name"));
    }
    validate_login(email, password)?;
    if confirmation.is_empty() {
        return Err(ValidationError::MissingField("confirmation"));
    }
    let failed = failed_rules(password);
    if !failed.is_empty() {
        return Err(ValidationError::WeakPassword { failed });
    }
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
