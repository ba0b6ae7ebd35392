//! Account verification and password reset flow
//!
//! The flow is driven one step at a time by whatever front end hosts it:
//! enter the emailed code, then either finish (account verification) or
//! choose a new password (reset). Every failure ends up as a single
//! message in [`VerificationFlow::last_error`].

use std::time::Duration;

use crate::auth::{Auth, User};
use crate::config::DEFAULT_RESEND_COOLDOWN;
use crate::error::Error;

/// Digits in a verification code
pub const CODE_LENGTH: usize = 6;

/// Shortest accepted password
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Keep digits only, at most [`CODE_LENGTH`] of them
pub fn sanitize_code(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(CODE_LENGTH)
        .collect()
}

/// Reject anything that is not exactly six ASCII digits
pub fn validate_code(code: &str) -> Result<(), Error> {
    if code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(Error::validation("El código debe tener 6 dígitos"))
    }
}

/// Check a new password and its confirmation
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), Error> {
    if password.is_empty() {
        return Err(Error::validation("La contraseña es obligatoria"));
    }
    if password != confirmation {
        return Err(Error::validation("Las contraseñas no coinciden"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::validation(
            "La contraseña debe tener al menos 6 caracteres",
        ));
    }
    Ok(())
}

/// Throttle on the resend control; a UX affordance, the backend enforces nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendCountdown {
    total: u64,
    remaining: u64,
}

impl Default for ResendCountdown {
    fn default() -> Self {
        Self::new(DEFAULT_RESEND_COOLDOWN)
    }
}

impl ResendCountdown {
    /// Start a countdown; the control is locked until it reaches zero
    pub fn new(cooldown: Duration) -> Self {
        let total = cooldown.as_secs();
        Self {
            total,
            remaining: total,
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn can_resend(&self) -> bool {
        self.remaining == 0
    }

    /// One second elapsed
    pub fn tick(&mut self) -> u64 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining
    }

    /// Back to the full cooldown
    pub fn restart(&mut self) {
        self.remaining = self.total;
    }

    /// Text of the resend control
    pub fn label(&self) -> String {
        if self.can_resend() {
            "Reenviar código".to_string()
        } else {
            format!("Reenviar código en {}s", self.remaining)
        }
    }

    /// Tick once per second until the control unlocks
    pub async fn run(&mut self) {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        // the first tick completes immediately
        interval.tick().await;
        while !self.can_resend() {
            interval.tick().await;
            self.tick();
        }
    }
}

/// What the flow ends in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPurpose {
    /// Flip the account to verified
    VerifyAccount,
    /// Unlock a new password
    ResetPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    EnterCode,
    /// Account verified; the caller goes to sign in
    Verified,
    /// Code accepted; waiting for the new password
    SetPassword,
    /// Password replaced
    Done,
}

/// State of one verification or reset attempt
#[derive(Debug, Clone)]
pub struct VerificationFlow {
    email: String,
    purpose: FlowPurpose,
    step: FlowStep,
    code: String,
    countdown: ResendCountdown,
    last_error: Option<String>,
}

impl VerificationFlow {
    pub fn new(email: &str, purpose: FlowPurpose, cooldown: Duration) -> Self {
        Self {
            email: email.trim().to_string(),
            purpose,
            step: FlowStep::EnterCode,
            code: String::new(),
            countdown: ResendCountdown::new(cooldown),
            last_error: None,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn step(&self) -> FlowStep {
        self.step
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn countdown(&self) -> &ResendCountdown {
        &self.countdown
    }

    pub fn countdown_mut(&mut self) -> &mut ResendCountdown {
        &mut self.countdown
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the submit control is enabled
    pub fn can_submit(&self) -> bool {
        self.step == FlowStep::EnterCode && self.code.len() == CODE_LENGTH
    }

    /// Replace the typed code; non-digits are dropped
    pub fn enter_code(&mut self, input: &str) {
        self.code = sanitize_code(input);
    }

    fn record<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(err) = &result {
            self.last_error = Some(err.to_string());
        }
        result
    }

    fn ensure_step(&self, expected: FlowStep) -> Result<(), Error> {
        if self.step == expected {
            Ok(())
        } else {
            Err(Error::general(format!(
                "paso inválido: se esperaba {:?}, actual {:?}",
                expected, self.step
            )))
        }
    }

    /// Send the code; invalid codes never reach the network
    pub async fn submit_code(&mut self, auth: &Auth) -> Result<Option<User>, Error> {
        self.last_error = None;
        let result = self.submit_code_inner(auth).await;
        self.record(result)
    }

    async fn submit_code_inner(&mut self, auth: &Auth) -> Result<Option<User>, Error> {
        self.ensure_step(FlowStep::EnterCode)?;
        validate_code(&self.code)?;

        match self.purpose {
            FlowPurpose::VerifyAccount => {
                let user = auth.verify_code(&self.email, &self.code).await?;
                self.step = FlowStep::Verified;
                Ok(Some(user))
            }
            FlowPurpose::ResetPassword => {
                auth.check_code(&self.email, &self.code).await?;
                self.step = FlowStep::SetPassword;
                Ok(None)
            }
        }
    }

    /// Ask for a fresh code; refused while the countdown runs
    pub async fn resend(&mut self, auth: &Auth) -> Result<(), Error> {
        self.last_error = None;
        let result = self.resend_inner(auth).await;
        self.record(result)
    }

    async fn resend_inner(&mut self, auth: &Auth) -> Result<(), Error> {
        if !self.countdown.can_resend() {
            return Err(Error::validation(format!(
                "Espera {}s para reenviar el código",
                self.countdown.remaining()
            )));
        }

        auth.resend_code(&self.email).await?;
        self.countdown.restart();
        self.code.clear();
        Ok(())
    }

    /// Set the new password once the code was accepted
    pub async fn set_password(
        &mut self,
        auth: &Auth,
        new_password: &str,
        confirmation: &str,
    ) -> Result<(), Error> {
        self.last_error = None;
        let result = self
            .set_password_inner(auth, new_password, confirmation)
            .await;
        self.record(result)
    }

    async fn set_password_inner(
        &mut self,
        auth: &Auth,
        new_password: &str,
        confirmation: &str,
    ) -> Result<(), Error> {
        self.ensure_step(FlowStep::SetPassword)?;
        auth.reset_password(&self.email, &self.code, new_password, confirmation)
            .await?;
        self.step = FlowStep::Done;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_code() {
        assert_eq!(sanitize_code("12a3-45 678"), "123456");
        assert_eq!(sanitize_code("abc"), "");
    }

    #[test]
    fn test_validate_code() {
        assert!(validate_code("012345").is_ok());
        assert!(validate_code("12345").is_err());
        assert!(validate_code("1234567").is_err());
        assert!(validate_code("12345a").is_err());
        assert!(validate_code("１２３４５６").is_err());
    }

    #[test]
    fn test_validate_new_password() {
        assert_eq!(
            validate_new_password("", "").unwrap_err().to_string(),
            "La contraseña es obligatoria"
        );
        assert_eq!(
            validate_new_password("secret1", "secret2").unwrap_err().to_string(),
            "Las contraseñas no coinciden"
        );
        assert_eq!(
            validate_new_password("abc", "abc").unwrap_err().to_string(),
            "La contraseña debe tener al menos 6 caracteres"
        );
        assert!(validate_new_password("secret1", "secret1").is_ok());
    }

    #[test]
    fn test_countdown_gates_resend() {
        let mut countdown = ResendCountdown::default();
        assert_eq!(countdown.remaining(), 30);
        assert!(!countdown.can_resend());
        assert_eq!(countdown.label(), "Reenviar código en 30s");

        for _ in 0..30 {
            countdown.tick();
        }
        assert!(countdown.can_resend());
        assert_eq!(countdown.tick(), 0);
        assert_eq!(countdown.label(), "Reenviar código");

        countdown.restart();
        assert_eq!(countdown.remaining(), 30);
        assert!(!countdown.can_resend());
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_runs_to_zero() {
        let mut countdown = ResendCountdown::new(Duration::from_secs(3));
        let started = tokio::time::Instant::now();
        countdown.run().await;
        assert!(countdown.can_resend());
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[test]
    fn test_flow_submit_enabled_only_with_six_digits() {
        let mut flow = VerificationFlow::new(
            "ana@example.com",
            FlowPurpose::VerifyAccount,
            DEFAULT_RESEND_COOLDOWN,
        );
        flow.enter_code("12 34");
        assert!(!flow.can_submit());
        flow.enter_code("123456789");
        assert_eq!(flow.code(), "123456");
        assert!(flow.can_submit());
    }
}
