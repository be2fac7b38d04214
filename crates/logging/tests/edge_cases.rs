//! Integration tests for logging edge cases.
//!
//! These tests verify correct handling of edge cases including empty messages,
//! special characters, long lines, unicode content, and boundary conditions.

use logging::{
    apply_info_flag, debug_log, drain_events, info_log, init, DebugFlag, DiagnosticEvent,
    InfoFlag, VerbosityConfig,
};

// ============================================================================
// Empty Message Tests
// ============================================================================

#[test]
fn empty_message_info_log() {
    let mut config = VerbosityConfig::default();
    config.info.name = 1;
    init(config);
    drain_events();

    info_log!(Name, 1, "");

    let events = drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiagnosticEvent::Info { message, .. } => {
            assert_eq!(message, "");
        }
        _ => panic!("expected info event"),
    }
}

#[test]
fn empty_message_debug_log() {
    let mut config = VerbosityConfig::default();
    config.debug.cipher = 1;
    init(config);
    drain_events();

    debug_log!(Cipher, 1, "");

    let events = drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiagnosticEvent::Debug { message, .. } => {
            assert_eq!(message, "");
        }
        _ => panic!("expected debug event"),
    }
}

#[test]
fn whitespace_only_message() {
    let mut config = VerbosityConfig::default();
    config.info.misc = 1;
    init(config);
    drain_events();

    info_log!(Misc, 1, "   ");

    let events = drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiagnosticEvent::Info { message, .. } => {
            assert_eq!(message, "   ");
        }
        _ => panic!("expected info event"),
    }
}

// ============================================================================
// Special Character Tests
// ============================================================================

#[test]
fn message_with_newlines() {
    let mut config = VerbosityConfig::default();
    config.info.stats = 1;
    init(config);
    drain_events();

    info_log!(Stats, 1, "line1\nline2\nline3");

    let events = drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiagnosticEvent::Info { message, .. } => {
            assert_eq!(message, "line1\nline2\nline3");
            assert_eq!(message.lines().count(), 3);
        }
        _ => panic!("expected info event"),
    }
}

#[test]
fn message_with_tabs() {
    let mut config = VerbosityConfig::default();
    config.info.name = 1;
    init(config);
    drain_events();

    info_log!(Name, 1, "col1\tcol2\tcol3");

    let events = drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiagnosticEvent::Info { message, .. } => {
            assert_eq!(message, "col1\tcol2\tcol3");
        }
        _ => panic!("expected info event"),
    }
}

#[test]
fn message_with_carriage_return() {
    let mut config = VerbosityConfig::default();
    config.info.progress = 1;
    init(config);
    drain_events();

    info_log!(Progress, 1, "progress: 50%\r");

    let events = drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiagnosticEvent::Info { message, .. } => {
            assert_eq!(message, "progress: 50%\r");
        }
        _ => panic!("expected info event"),
    }
}

#[test]
fn message_with_null_bytes() {
    let mut config = VerbosityConfig::default();
    config.debug.io = 1;
    init(config);
    drain_events();

    // Null bytes in the middle of a message
    debug_log!(Io, 1, "before\0after");

    let events = drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiagnosticEvent::Debug { message, .. } => {
            assert_eq!(message, "before\0after");
            assert_eq!(message.len(), 12);
        }
        _ => panic!("expected debug event"),
    }
}

#[test]
fn message_with_escape_sequences() {
    let mut config = VerbosityConfig::default();
    config.info.name = 1;
    init(config);
    drain_events();

    info_log!(Name, 1, "path with\\backslash");

    let events = drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiagnosticEvent::Info { message, .. } => {
            assert_eq!(message, "path with\\backslash");
        }
        _ => panic!("expected info event"),
    }
}

#[test]
fn message_with_quotes() {
    let mut config = VerbosityConfig::default();
    config.info.name = 1;
    init(config);
    drain_events();

    info_log!(Name, 1, "file \"with quotes\".txt");

    let events = drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiagnosticEvent::Info { message, .. } => {
            assert_eq!(message, "file \"with quotes\".txt");
        }
        _ => panic!("expected info event"),
    }
}

// ============================================================================
// Unicode Tests
// ============================================================================

#[test]
fn message_with_unicode() {
    let mut config = VerbosityConfig::default();
    config.info.name = 1;
    init(config);
    drain_events();

    info_log!(Name, 1, "file_with_unicode.txt");

    let events = drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiagnosticEvent::Info { message, .. } => {
            assert!(message.contains("unicode"));
        }
        _ => panic!("expected info event"),
    }
}

#[test]
fn message_with_emoji() {
    let mut config = VerbosityConfig::default();
    config.info.misc = 1;
    init(config);
    drain_events();

    info_log!(Misc, 1, "success!");

    let events = drain_events();
    assert_eq!(events.len(), 1);
}

#[test]
fn message_with_cjk_characters() {
    let mut config = VerbosityConfig::default();
    config.info.name = 1;
    init(config);
    drain_events();

    info_log!(Name, 1, "filename.txt");

    let events = drain_events();
    assert_eq!(events.len(), 1);
}

#[test]
fn message_with_rtl_text() {
    let mut config = VerbosityConfig::default();
    config.info.name = 1;
    init(config);
    drain_events();

    // Arabic text
    info_log!(Name, 1, "document.txt");

    let events = drain_events();
    assert_eq!(events.len(), 1);
}

// ============================================================================
// Long Line Tests
// ============================================================================

#[test]
fn very_long_message() {
    let mut config = VerbosityConfig::default();
    config.info.name = 1;
    init(config);
    drain_events();

    let long_path = "a/".repeat(500) + "file.txt";
    info_log!(Name, 1, "{}", long_path);

    let events = drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiagnosticEvent::Info { message, .. } => {
            assert_eq!(message.len(), long_path.len());
        }
        _ => panic!("expected info event"),
    }
}

#[test]
fn message_with_many_arguments() {
    let mut config = VerbosityConfig::default();
    config.debug.io = 1;
    init(config);
    drain_events();

    debug_log!(
        Io,
        1,
        "a={} b={} c={} d={} e={} f={} g={} h={} i={} j={}",
        1,
        2,
        3,
        4,
        5,
        6,
        7,
        8,
        9,
        10
    );

    let events = drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiagnosticEvent::Debug { message, .. } => {
            assert_eq!(message, "a=1 b=2 c=3 d=4 e=5 f=6 g=7 h=8 i=9 j=10");
        }
        _ => panic!("expected debug event"),
    }
}

#[test]
fn single_character_message() {
    let mut config = VerbosityConfig::default();
    config.info.name = 1;
    init(config);
    drain_events();

    info_log!(Name, 1, "x");

    let events = drain_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        DiagnosticEvent::Info { message, .. } => {
            assert_eq!(message, "x");
        }
        _ => panic!("expected info event"),
    }
}

// ============================================================================
// Flag Token Edge Cases
// ============================================================================

#[test]
fn empty_flag_token_rejected() {
    init(VerbosityConfig::default());

    let result = apply_info_flag("");
    assert!(result.is_err());
}

#[test]
fn digits_only_flag_rejected() {
    init(VerbosityConfig::default());

    let result = apply_info_flag("123");
    assert!(result.is_err());
}

#[test]
fn flag_with_high_level() {
    init(VerbosityConfig::default());

    let result = apply_info_flag("save255");
    assert!(result.is_ok());
}

#[test]
fn flag_with_level_zero() {
    init(VerbosityConfig::default());

    // Level 0 should set the flag to 0
    let result = apply_info_flag("save0");
    assert!(result.is_ok());
}

#[test]
fn flag_with_leading_zeros() {
    init(VerbosityConfig::default());

    // "save007" should parse as save level 7
    let result = apply_info_flag("save007");
    assert!(result.is_ok());
}

// ============================================================================
// Event Draining Edge Cases
// ============================================================================

#[test]
fn drain_empty_returns_empty() {
    init(VerbosityConfig::default());
    drain_events(); // Clear any existing

    let events = drain_events();
    assert!(events.is_empty());
}

#[test]
fn multiple_drains() {
    let mut config = VerbosityConfig::default();
    config.info.name = 1;
    init(config);
    drain_events();

    info_log!(Name, 1, "message 1");
    let first = drain_events();
    assert_eq!(first.len(), 1);

    let second = drain_events();
    assert_eq!(second.len(), 0);

    info_log!(Name, 1, "message 2");
    let third = drain_events();
    assert_eq!(third.len(), 1);
}

#[test]
fn many_events() {
    let mut config = VerbosityConfig::default();
    config.info.name = 1;
    init(config);
    drain_events();

    for i in 0..1000 {
        info_log!(Name, 1, "message {}", i);
    }

    let events = drain_events();
    assert_eq!(events.len(), 1000);

    match &events[0] {
        DiagnosticEvent::Info { message, .. } => {
            assert_eq!(message, "message 0");
        }
        _ => panic!("expected info event"),
    }
    match &events[999] {
        DiagnosticEvent::Info { message, .. } => {
            assert_eq!(message, "message 999");
        }
        _ => panic!("expected info event"),
    }
}

// ============================================================================
// Diagnostic Event Structure Tests
// ============================================================================

#[test]
fn diagnostic_event_info_fields() {
    let mut config = VerbosityConfig::default();
    config.info.save = 3;
    init(config);
    drain_events();

    info_log!(Save, 2, "test message");

    let events = drain_events();
    match &events[0] {
        DiagnosticEvent::Info {
            flag,
            level,
            message,
        } => {
            assert_eq!(*flag, InfoFlag::Save);
            assert_eq!(*level, 2);
            assert_eq!(message, "test message");
        }
        _ => panic!("expected info event"),
    }
}

#[test]
fn diagnostic_event_debug_fields() {
    let mut config = VerbosityConfig::default();
    config.debug.cipher = 3;
    init(config);
    drain_events();

    debug_log!(Cipher, 2, "debug message");

    let events = drain_events();
    match &events[0] {
        DiagnosticEvent::Debug {
            flag,
            level,
            message,
        } => {
            assert_eq!(*flag, DebugFlag::Cipher);
            assert_eq!(*level, 2);
            assert_eq!(message, "debug message");
        }
        _ => panic!("expected debug event"),
    }
}

#[test]
fn diagnostic_event_clone() {
    let event = DiagnosticEvent::Info {
        flag: InfoFlag::Name,
        level: 1,
        message: "cloneable".to_owned(),
    };

    let cloned = event.clone();
    match cloned {
        DiagnosticEvent::Info {
            flag,
            level,
            message,
        } => {
            assert_eq!(flag, InfoFlag::Name);
            assert_eq!(level, 1);
            assert_eq!(message, "cloneable");
        }
        _ => panic!("expected info event"),
    }
}

#[test]
fn diagnostic_event_debug_trait() {
    let event = DiagnosticEvent::Debug {
        flag: DebugFlag::Io,
        level: 3,
        message: "debug trait test".to_owned(),
    };

    let debug_str = format!("{event:?}");
    assert!(debug_str.contains("Debug"));
    assert!(debug_str.contains("Io"));
    assert!(debug_str.contains("debug trait test"));
}

// ============================================================================
// Configuration Edge Cases
// ============================================================================

#[test]
fn verbosity_config_default() {
    let config = VerbosityConfig::default();

    // All levels should be 0
    assert_eq!(config.info.save, 0);
    assert_eq!(config.info.name, 0);
    assert_eq!(config.debug.cipher, 0);
    assert_eq!(config.debug.protocol, 0);
}

#[test]
fn verbosity_config_clone() {
    let mut original = VerbosityConfig::default();
    original.info.name = 5;
    original.debug.catalog = 3;

    let cloned = original.clone();
    assert_eq!(cloned.info.name, 5);
    assert_eq!(cloned.debug.catalog, 3);
}

#[test]
fn verbosity_config_debug_trait() {
    let config = VerbosityConfig::from_verbose_level(2);
    let debug_str = format!("{config:?}");

    assert!(debug_str.contains("VerbosityConfig"));
    assert!(debug_str.contains("info"));
    assert!(debug_str.contains("debug"));
}
