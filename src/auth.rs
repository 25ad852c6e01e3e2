use crate::proto::socks5::AuthMethod;
use std::collections::HashSet;

/// Negotiates the authentication method for a single handshake. The only
/// method this proxy ever offers is [`AuthMethod::None`] (no authentication,
/// per `spec.md` §1's explicit non-goal on other SOCKS auth methods); the
/// negotiation shape is kept general so a future method only needs to widen
/// `SUPPORTED_AUTH_METHODS`, not restructure the handshake.
pub struct ProxyAuthenticator {
    available_methods: HashSet<AuthMethod>,
    selected_method: Option<AuthMethod>,
}

impl ProxyAuthenticator {
    const SUPPORTED_AUTH_METHODS: [AuthMethod; 1] = [AuthMethod::None];

    pub fn new() -> ProxyAuthenticator {
        ProxyAuthenticator {
            available_methods: HashSet::from(ProxyAuthenticator::SUPPORTED_AUTH_METHODS),
            selected_method: None,
        }
    }

    /// Finds any common method between what the server offers and what the
    /// client proposed in its greeting. Ties are broken arbitrarily since
    /// there is, today, exactly one method to ever agree on.
    pub fn select_auth_method(&mut self, peer_methods: &HashSet<AuthMethod>) -> Option<AuthMethod> {
        self.selected_method = self.available_methods.intersection(peer_methods).next().copied();
        self.selected_method
    }

    pub fn current_method(&self) -> Option<AuthMethod> {
        self.selected_method
    }
}

impl Default for ProxyAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}
