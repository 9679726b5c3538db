use safrasphere::identifiers::{self, SESSION_TOKEN_PREFIX, TRANSACTION_ID_PREFIX};

#[test]
fn session_token_shape() {
    let token = identifiers::session_token();
    let (prefix, millis, suffix) = identifiers::parse(&token).unwrap();
    assert_eq!(prefix, SESSION_TOKEN_PREFIX);
    assert!(millis > 0);
    assert_eq!(suffix.len(), 9);
}

#[test]
fn transaction_id_shape() {
    let id = identifiers::transaction_id();
    let (prefix, _, suffix) = identifiers::parse(&id).unwrap();
    assert_eq!(prefix, TRANSACTION_ID_PREFIX);
    assert_eq!(suffix.len(), 6);
}

#[test]
fn tokens_are_distinct() {
    let a = identifiers::session_token();
    let b = identifiers::session_token();
    assert_ne!(a, b);
}

#[test]
fn parse_rejects_malformed() {
    assert!(identifiers::parse("CST").is_none());
    assert!(identifiers::parse("CST_notanumber_abc").is_none());
    assert!(identifiers::parse("CST_123_").is_none());
    assert!(identifiers::parse("CST_123_ABC").is_none());
}
