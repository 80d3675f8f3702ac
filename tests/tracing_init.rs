use hostloop::{Logger, init_tracing, logf};

#[test]
fn init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();

    let log = Logger::new(true, true);
    logf!(log, "tracing installed once");
    hostloop::debugf!(log, "debug output goes through the same subscriber");
}
