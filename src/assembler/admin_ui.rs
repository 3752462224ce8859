//! Rule table for the phpMyAdmin config (`config.inc.php`).

use serde::Serialize;

use crate::error::ProvisionResult;
use crate::patch::{DesiredState, PatchOutcome, RewriteRule};

pub const ALLOW_NO_PASSWORD: &str = "allow-no-password";
pub const LOOPBACK_HOST: &str = "loopback-host";

pub const PASSWORDLESS_MESSAGE: &str = "Passwordless login enabled";
pub const HOST_MESSAGE: &str = "Server settings have been changed.";

pub fn desired_state() -> ProvisionResult<DesiredState> {
    Ok(DesiredState::new()
        .rule(
            RewriteRule::literal(
                ALLOW_NO_PASSWORD,
                r"\$cfg\['Servers'\]\[\$i\]\['AllowNoPassword'\]\s*=\s*false;",
                "$cfg['Servers'][$i]['AllowNoPassword'] = true;",
            )?
            .satisfied_when(r"\$cfg\['Servers'\]\[\$i\]\['AllowNoPassword'\]\s*=\s*true;")?,
        )
        .rule(
            RewriteRule::with_captures(
                LOOPBACK_HOST,
                r"(\$cfg\['Servers'\]\[\$i\]\['host'\]\s*=\s*)'localhost';",
                "${1}'127.0.0.1';",
            )?
            .satisfied_when(r"\$cfg\['Servers'\]\[\$i\]\['host'\]\s*=\s*'127\.0\.0\.1';")?,
        ))
}

/// Which of the two admin settings a patch actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AdminUiChanges {
    pub passwordless_enabled: bool,
    pub host_changed: bool,
}

impl AdminUiChanges {
    pub fn from_outcome(outcome: &PatchOutcome) -> Self {
        Self {
            passwordless_enabled: outcome.applied(ALLOW_NO_PASSWORD),
            host_changed: outcome.applied(LOOPBACK_HOST),
        }
    }

    /// One message per changed setting, in rule order.
    pub fn messages(&self) -> Vec<&'static str> {
        let mut messages = Vec::new();
        if self.passwordless_enabled {
            messages.push(PASSWORDLESS_MESSAGE);
        }
        if self.host_changed {
            messages.push(HOST_MESSAGE);
        }
        messages
    }
}
