use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};
use scout_core::password::{self, ValidationError};
use scout_engine::{ApiError, AuthSession, Credentials, EngineEvent, EngineHandle, Registration};
use scout_logging::{scout_debug, scout_info};

use super::cli::Args;
use super::ui::render::password_checklist;

const AUTH_FAILED_MESSAGE: &str = "Erro ao autenticar.";
const CONNECTION_FAILED_MESSAGE: &str = "Erro de conexão com o servidor.";

/// Logs in or registers when credentials were given; anonymous otherwise.
///
/// Inputs are checked locally first so an invalid form never reaches the server.
pub fn authenticate(engine: &EngineHandle, args: &Args) -> anyhow::Result<Option<AuthSession>> {
    let Some(email) = args.email.as_deref() else {
        return Ok(None);
    };
    let password = args.password.as_deref().unwrap_or_default();

    if args.register {
        let name = args.name.as_deref().unwrap_or_default();
        let confirmation = args.confirm_password.as_deref().unwrap_or_default();
        password::validate_registration(name, email, password, confirmation)
            .map_err(|err| explain(err, password))?;
        scout_info!("Registering account {}", email);
        engine.register(Registration {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        });
    } else {
        password::validate_login(email, password).map_err(|err| explain(err, password))?;
        scout_info!("Logging in as {}", email);
        engine.login(Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        });
    }

    let timeout = Duration::from_secs(args.request_timeout.max(1)) + Duration::from_secs(5);
    let session = wait_for_answer(engine, timeout)?;
    scout_info!("Authenticated as {}", session.username);
    Ok(Some(session))
}

fn wait_for_answer(engine: &EngineHandle, timeout: Duration) -> anyhow::Result<AuthSession> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let event = engine
            .recv_timeout(remaining)?
            .context("no answer from the authentication endpoint")?;
        match event {
            EngineEvent::Authenticated { result: Ok(session) } => return Ok(session),
            EngineEvent::Authenticated { result: Err(err) } => {
                bail!("{} ({err})", failure_message(&err));
            }
            other => scout_debug!("Ignoring engine event during authentication: {:?}", other),
        }
    }
}

/// The server's own text for a refused request; a generic line otherwise.
fn failure_message(err: &ApiError) -> &str {
    match err {
        ApiError::Rejected { message, .. } => message.as_deref().unwrap_or(AUTH_FAILED_MESSAGE),
        _ => CONNECTION_FAILED_MESSAGE,
    }
}

fn explain(err: ValidationError, password: &str) -> anyhow::Error {
    if let ValidationError::WeakPassword { .. } = err {
        eprintln!("Requisitos de senha:");
        for line in password_checklist(&password::check_password(password)) {
            eprintln!("{line}");
        }
    }
    anyhow!(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_login_shows_server_text() {
        let err = ApiError::Rejected {
            status: 401,
            message: Some("E-mail ou senha incorretos.".to_string()),
        };
        assert_eq!(failure_message(&err), "E-mail ou senha incorretos.");
    }

    #[test]
    fn refused_login_without_text_is_generic() {
        let err = ApiError::Rejected {
            status: 500,
            message: None,
        };
        assert_eq!(failure_message(&err), AUTH_FAILED_MESSAGE);
    }

    #[test]
    fn transport_failures_report_a_connection_error() {
        for err in [
            ApiError::Network("refused".into()),
            ApiError::Timeout("slow".into()),
            ApiError::InvalidBody("html".into()),
        ] {
            assert_eq!(failure_message(&err), CONNECTION_FAILED_MESSAGE);
        }
    }
}
