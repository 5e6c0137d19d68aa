//! Who this client is, as relayed by the host page.
//!
//! The host hands over an [`IdentityEnvelope`]; [`ClientContext`] is the
//! resolved form the sync layer works with. Presence is keyed by
//! `identity`; echo detection on the shared document is keyed by `session`,
//! so two tabs of one user do not swallow each other's writes.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Single-sign-on profile forwarded by the host.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsoIdentity {
    pub subject_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl fmt::Debug for SsoIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsoIdentity")
            .field("subject_id", &self.subject_id)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("avatar_url", &self.avatar_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityEnvelope {
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub legacy_key: Option<String>,
    #[serde(default)]
    pub sso: Option<SsoIdentity>,
}

/// Bearer token presented to the remote store. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// One running client instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientContext {
    pub identity: String,
    pub session: SessionId,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub credential: Option<Credential>,
}

impl ClientContext {
    /// Resolves the client identity: SSO subject first, then the legacy key,
    /// then an anonymous `user@host` name with a random suffix.
    pub fn from_envelope(envelope: &IdentityEnvelope) -> Self {
        let sso = envelope
            .sso
            .as_ref()
            .filter(|sso| !sso.subject_id.trim().is_empty());
        let legacy = envelope
            .legacy_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty());

        let identity = match (sso, legacy) {
            (Some(sso), _) => sso.subject_id.trim().to_string(),
            (None, Some(key)) => key.to_string(),
            (None, None) => anonymous_identity(),
        };

        ClientContext {
            identity,
            session: SessionId::new(),
            display_name: sso
                .and_then(|sso| sso.display_name.clone().or_else(|| sso.email.clone())),
            avatar_url: sso.and_then(|sso| sso.avatar_url.clone()),
            is_admin: envelope.is_admin,
            credential: sso
                .and_then(|sso| sso.bearer_token.as_deref())
                .filter(|token| !token.is_empty())
                .map(Credential::bearer),
        }
    }

    /// A context with a fixed identity and no credential.
    pub fn named(identity: impl Into<String>) -> Self {
        ClientContext {
            identity: identity.into(),
            session: SessionId::new(),
            display_name: None,
            avatar_url: None,
            is_admin: false,
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Name shown to other clients.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.identity)
    }
}

fn anonymous_identity() -> String {
    let user = whoami::username();
    let host = whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string());
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{user}@{host}-{}", &suffix[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sso(subject: &str) -> SsoIdentity {
        SsoIdentity {
            subject_id: subject.to_string(),
            email: Some("dev@example.com".into()),
            display_name: None,
            avatar_url: Some("https://example.com/a.png".into()),
            bearer_token: Some("tok".into()),
        }
    }

    #[test]
    fn sso_subject_wins() {
        let envelope = IdentityEnvelope {
            is_admin: true,
            legacy_key: Some("legacy".into()),
            sso: Some(sso("sub-1")),
        };
        let ctx = ClientContext::from_envelope(&envelope);
        assert_eq!(ctx.identity, "sub-1");
        assert_eq!(ctx.label(), "dev@example.com");
        assert!(ctx.is_admin);
        assert_eq!(ctx.credential, Some(Credential::bearer("tok")));
    }

    #[test]
    fn legacy_key_is_second_choice() {
        let envelope = IdentityEnvelope {
            legacy_key: Some("  team-key ".into()),
            sso: Some(sso("   ")),
            ..IdentityEnvelope::default()
        };
        let ctx = ClientContext::from_envelope(&envelope);
        assert_eq!(ctx.identity, "team-key");
        assert_eq!(ctx.credential, None);
    }

    #[test]
    fn anonymous_identities_differ() {
        let a = ClientContext::from_envelope(&IdentityEnvelope::default());
        let b = ClientContext::from_envelope(&IdentityEnvelope::default());
        assert!(a.identity.contains('@'));
        assert_ne!(a.identity, b.identity);
        assert_ne!(a.session, b.session);
    }

    #[test]
    fn credentials_are_redacted() {
        let rendered = format!("{:?}", sso("x"));
        assert!(!rendered.contains("tok\""));
        assert_eq!(format!("{:?}", Credential::bearer("secret")), "Credential(<redacted>)");
    }
}
