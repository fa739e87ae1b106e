//! Startup authentication handshake

use anyhow::{bail, Context, Result};
use log::{error, info};

use crate::remote::{Authenticator, Credentials, LoginOutcome};

/// Authenticates once before any filesystem call is served.
///
/// When the service asks for a second factor, `prompt_for_code` is called
/// with the service's instructions and must return the code the user
/// entered. A rejected code is an error; the caller must not mount.
pub fn establish_session<A, P>(
    authenticator: &A,
    credentials: &Credentials,
    mut prompt_for_code: P,
) -> Result<()>
where
    A: Authenticator + ?Sized,
    P: FnMut(&str) -> Result<String>,
{
    let outcome = authenticator
        .authenticate(credentials)
        .context("Failed to authenticate")?;

    match outcome {
        LoginOutcome::Authenticated => {
            info!("Authentication completed without a second factor");
            Ok(())
        }
        LoginOutcome::ChallengeRequired { prompt } => {
            info!("Two-factor authentication required");
            let code = prompt_for_code(&prompt).context("Failed to read verification code")?;
            let accepted = authenticator
                .validate_challenge(code.trim())
                .context("Failed to validate verification code")?;
            info!("Code validation result: {}", accepted);
            if !accepted {
                error!("Failed to verify security code");
                bail!("Verification code was rejected");
            }
            Ok(())
        }
    }
}
