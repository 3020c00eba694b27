#[derive(Debug, Clone)]
pub struct SubscriberEmail(String);

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl SubscriberEmail {
    /// Minimal syntactic check: non-empty and containing an `@`.
    /// Anything stricter is left to a future confirmation flow.
    pub fn parse(s: String) -> Result<SubscriberEmail, String> {
        if s.is_empty() || !s.contains('@') {
            Err(String::from("Invalid email"))
        } else {
            Ok(Self(s))
        }
    }
}
