use safrasphere::logging::{
    LogContext, get_logger, get_logger_with_context, level_rank, min_level, parse_log_level,
};
use tracing::Level;

#[test]
fn parse_levels_case_insensitively() {
    assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
    assert_eq!(parse_log_level("Info").unwrap(), Level::INFO);
    assert_eq!(parse_log_level("WARNING").unwrap(), Level::WARN);
    assert!(parse_log_level("verbose").is_err());
}

#[test]
fn min_level_picks_more_verbose() {
    assert_eq!(min_level(Level::INFO, Level::DEBUG), Level::DEBUG);
    assert_eq!(min_level(Level::ERROR, Level::WARN), Level::WARN);
    assert!(level_rank(Level::TRACE) < level_rank(Level::ERROR));
}

#[test]
fn logger_context_carries_session_and_screen() {
    let ctx = LogContext::new("kiosk")
        .with_session_token("CST_1_abc")
        .with_screen("Charging");
    let logger = get_logger_with_context(ctx);
    assert_eq!(logger.context().component, "kiosk");
    assert_eq!(logger.context().session_token.as_deref(), Some("CST_1_abc"));

    let derived = get_logger("kiosk").with_context(|c| c.with_screen("Payment"));
    assert_eq!(derived.context().screen.as_deref(), Some("Payment"));
    // Emitting without a subscriber must not panic
    derived.info("payment screen shown");
}
