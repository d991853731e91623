//! Provides the LOGIN authentication mechanism

use std::fmt::{self, Debug, Display, Formatter};

/// Contains user credentials
#[derive(PartialEq, Eq, Clone, Hash, Default)]
pub struct Credentials {
    authentication_identity: String,
    secret: String,
}

impl Credentials {
    /// Create a `Credentials` struct from username and password
    pub fn new(username: String, password: String) -> Credentials {
        Credentials {
            authentication_identity: username,
            secret: password,
        }
    }

    pub(crate) fn username(&self) -> &str {
        &self.authentication_identity
    }

    pub(crate) fn password(&self) -> &str {
        &self.secret
    }
}

impl<S, T> From<(S, T)> for Credentials
where
    S: Into<String>,
    T: Into<String>,
{
    fn from((username, password): (S, T)) -> Self {
        Credentials::new(username.into(), password.into())
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").finish()
    }
}

/// Represents authentication mechanisms
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub enum Mechanism {
    /// LOGIN authentication mechanism
    ///
    /// The username and the password are each sent base64 encoded, in answer
    /// to a `334` challenge.
    ///
    /// Defined in [draft-murchison-sasl-login-00](https://www.ietf.org/archive/id/draft-murchison-sasl-login-00.txt).
    Login,
}

impl Display for Mechanism {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Mechanism::Login => "LOGIN",
        })
    }
}

#[cfg(test)]
mod test {
    use super::{Credentials, Mechanism};

    #[test]
    fn test_login_display() {
        assert_eq!(Mechanism::Login.to_string(), "LOGIN");
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let credentials = Credentials::new("alice".to_owned(), "wonderland".to_owned());
        assert_eq!(format!("{credentials:?}"), "Credentials");
    }

    #[test]
    fn test_from_user_pass_for_credentials() {
        assert_eq!(
            Credentials::new("alice".to_owned(), "wonderland".to_owned()),
            Credentials::from(("alice", "wonderland"))
        );
    }
}
