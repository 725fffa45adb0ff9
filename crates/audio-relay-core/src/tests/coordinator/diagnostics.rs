use crate::{DIAGNOSTIC_CAPACITY, DiagnosticLevel, DiagnosticLog};

/// WHAT: The diagnostic trail is bounded
/// WHY: A long session must not grow memory through status messages
#[test]
#[allow(clippy::unwrap_used)]
fn given_full_log_when_pushed_then_oldest_discarded() {
    // Given: A log filled to capacity
    let mut log = DiagnosticLog::default();
    for i in 0..DIAGNOSTIC_CAPACITY {
        log.push(DiagnosticLevel::Info, format!("entry {}", i));
    }

    // When: Pushing one more
    log.push(DiagnosticLevel::Error, "newest");

    // Then: Capacity kept, oldest gone, newest last
    assert_eq!(log.len(), DIAGNOSTIC_CAPACITY);
    assert_eq!(log.entries().next().unwrap().message, "entry 1");
    let last = log.last().unwrap();
    assert_eq!(last.message, "newest");
    assert_eq!(last.level, DiagnosticLevel::Error);
}
