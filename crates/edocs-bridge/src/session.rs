/// Identifier of a user as assigned by the document server.
pub type UserId = i64;

/// Identity of the authenticated user a session is opened for.
///
/// Obtaining these (login, OTP) is handled elsewhere; the client only
/// consumes them.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    /// Id of the current user, compared against ids in push events.
    pub user_id: UserId,
    /// Bearer token sent with every REST request.
    pub token: String,
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .finish()
    }
}
