/// Pull the credential out of an `Authorization` header value.
///
/// Accepts exactly `Bearer <credential>`: scheme and credential separated by a
/// single space. The scheme is case-sensitive. Anything else yields `None`.
pub fn extract(authorization: Option<&str>) -> Option<&str> {
    let (scheme, credential) = authorization?.split_once(' ')?;

    if scheme != "Bearer" || credential.is_empty() || credential.contains(' ') {
        return None;
    }

    Some(credential)
}
