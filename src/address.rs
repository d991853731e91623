//! Email addresses and the shapes in which they can be supplied
//!
//! Recipients can be handed to a [`Session`](crate::Session) as a single
//! address or as a list, and each entry may be a bare email or an
//! `(email, name)` pair. Every accepted shape converts into [`Addresses`]
//! once, at the call boundary.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// An email address with an optional display name
///
/// Renders as `Name <email>` when a name is present, `<email>` otherwise.
///
/// ```
/// use postie::Address;
///
/// assert_eq!(Address::from("a@x.com").to_string(), "<a@x.com>");
/// assert_eq!(
///     Address::from(("a@x.com", "Alice")).to_string(),
///     "Alice <a@x.com>"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    email: String,
    name: Option<String>,
}

impl Address {
    /// Creates a new address
    ///
    /// An empty name is treated the same as no name.
    pub fn new<E: Into<String>>(email: E, name: Option<String>) -> Self {
        Address {
            email: email.into(),
            name: name.filter(|name| !name.is_empty()),
        }
    }

    /// The email part, as used in `MAIL FROM` and `RCPT TO`
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The display name, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the email part is empty
    ///
    /// An empty address is never used as a protocol target.
    pub fn is_empty(&self) -> bool {
        self.email.is_empty()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.name {
            Some(ref name) => write!(f, "{} <{}>", name, self.email),
            None => write!(f, "<{}>", self.email),
        }
    }
}

impl From<&str> for Address {
    fn from(email: &str) -> Self {
        Address::new(email, None)
    }
}

impl From<String> for Address {
    fn from(email: String) -> Self {
        Address::new(email, None)
    }
}

impl<E, N> From<(E, N)> for Address
where
    E: Into<String>,
    N: Into<String>,
{
    fn from((email, name): (E, N)) -> Self {
        Address::new(email, Some(name.into()))
    }
}

/// One or more addresses, as accepted by `to`, `cc` and `bcc`
///
/// ```
/// use postie::{Address, Addresses};
///
/// let single = Addresses::from(("a@x.com", "Alice"));
/// let list = Addresses::from(vec!["b@x.com", "c@x.com"]);
///
/// assert_eq!(single.into_vec(), vec![Address::from(("a@x.com", "Alice"))]);
/// assert_eq!(list.into_vec().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addresses {
    /// A single address
    Single(Address),
    /// An ordered list of addresses
    List(Vec<Address>),
}

impl Addresses {
    /// Flattens into an ordered list
    pub fn into_vec(self) -> Vec<Address> {
        match self {
            Addresses::Single(address) => vec![address],
            Addresses::List(addresses) => addresses,
        }
    }
}

impl From<Address> for Addresses {
    fn from(address: Address) -> Self {
        Addresses::Single(address)
    }
}

impl From<&str> for Addresses {
    fn from(email: &str) -> Self {
        Addresses::Single(email.into())
    }
}

impl From<String> for Addresses {
    fn from(email: String) -> Self {
        Addresses::Single(email.into())
    }
}

impl<E, N> From<(E, N)> for Addresses
where
    E: Into<String>,
    N: Into<String>,
{
    fn from(pair: (E, N)) -> Self {
        Addresses::Single(pair.into())
    }
}

impl<T: Into<Address>> From<Vec<T>> for Addresses {
    fn from(addresses: Vec<T>) -> Self {
        Addresses::List(addresses.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Address>, const N: usize> From<[T; N]> for Addresses {
    fn from(addresses: [T; N]) -> Self {
        Addresses::List(addresses.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod test {
    use super::{Address, Addresses};

    #[test]
    fn format_with_and_without_name() {
        assert_eq!(Address::from("a@x.com").to_string(), "<a@x.com>");
        assert_eq!(
            Address::from(("a@x.com", "Name")).to_string(),
            "Name <a@x.com>"
        );
    }

    #[test]
    fn empty_name_is_no_name() {
        assert_eq!(Address::from(("a@x.com", "")), Address::from("a@x.com"));
        assert_eq!(Address::new("a@x.com", Some(String::new())).name(), None);
    }

    #[test]
    fn single_and_pair_shapes() {
        assert_eq!(
            Addresses::from("a@x.com"),
            Addresses::Single(Address::new("a@x.com", None))
        );
        assert_eq!(
            Addresses::from(("a@x.com", "Al".to_owned())),
            Addresses::Single(Address::new("a@x.com", Some("Al".into())))
        );
    }

    #[test]
    fn lists_keep_order() {
        let list = Addresses::from([("b@x.com", "B"), ("a@x.com", "A")]).into_vec();
        assert_eq!(list[0].email(), "b@x.com");
        assert_eq!(list[0].name(), Some("B"));
        assert_eq!(list[1].email(), "a@x.com");

        let mixed = Addresses::from(vec![
            Address::from("c@x.com"),
            Address::from(("d@x.com", "D")),
        ])
        .into_vec();
        assert_eq!(mixed[0].name(), None);
        assert_eq!(mixed[1].name(), Some("D"));
    }
}
