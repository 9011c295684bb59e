//! Request client credential port.

/// Credential slot of the shared request client.
///
/// There is one slot per process. Flows write it without coordination,
/// so the last writer wins: a logout clearing the slot may race a refresh
/// that has just set it.
pub trait ApiCredentials: Send + Sync {
    /// Registers the id token sent with every subsequent request.
    fn set_access_token(&self, token: &str);

    /// Removes the registered credential.
    fn remove_access_token(&self);

    /// Returns the registered credential, if any.
    fn access_token(&self) -> Option<String>;
}
