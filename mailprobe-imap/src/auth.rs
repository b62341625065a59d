/// SASL PLAIN (RFC 4616). `async-imap` base64-encodes the response.
pub(crate) struct PlainAuthenticator {
    username: String,
    password: String,
}

impl PlainAuthenticator {
    pub(crate) fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl async_imap::Authenticator for PlainAuthenticator {
    type Response = Vec<u8>;

    fn process(&mut self, _challenge: &[u8]) -> Self::Response {
        format!("\0{}\0{}", self.username, self.password).into_bytes()
    }
}
