//! MDC init callbacks
//!
//! Registered callbacks are process-wide, so they live in their own test
//! binary and run as a single test.

use hierarchical_logger::config;
use hierarchical_logger::prelude::*;
use hierarchical_logger::{debug, info};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_mdc_init_runs_once_per_thread() {
    let installed = config::configure_prop(
        "log4j.rootLogger=INFO, MEM\n\
         log4j.appender.MEM=MemoryAppender\n\
         log4j.appender.MEM.layout=PatternLayout\n\
         log4j.appender.MEM.layout.ConversionPattern=%-5p - %m %X%n\n",
    )
    .expect("Failed to configure");
    let memory = installed.memory_appender("MEM").expect("MEM appender missing");

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let registered = mdc::register_init(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        mdc::put("MDC_INIT", "OK");
    });
    assert_eq!(registered, 1);

    // Runs immediately on the registering thread
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(mdc::get("MDC_INIT").as_deref(), Some("OK"));

    info!("main thread");

    // First touch through logging seeds the new thread
    std::thread::spawn(|| info!("thread 1"))
        .join()
        .expect("Thread panicked");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Repeated MDC use on one thread does not re-run the callback
    let counter = Arc::clone(&calls);
    std::thread::spawn(move || {
        info!("thread 2");
        mdc::put("extra", 1);
        mdc::remove("extra");
        info!("thread 2 again");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    })
    .join()
    .expect("Thread panicked");

    // A disabled call never touches the MDC, so the callback does not run
    let counter = Arc::clone(&calls);
    std::thread::spawn(move || {
        debug!("disabled %d", 1);
        Logger::get("quiet").trace("disabled too");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    })
    .join()
    .expect("Thread panicked");
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    assert_eq!(
        memory.contents(),
        "INFO  - main thread {{MDC_INIT,OK}}\n\
         INFO  - thread 1 {{MDC_INIT,OK}}\n\
         INFO  - thread 2 {{MDC_INIT,OK}}\n\
         INFO  - thread 2 again {{MDC_INIT,OK}}\n"
    );

    // Clearing this thread's MDC leaves other threads' seeding intact
    mdc::remove("MDC_INIT");
    std::thread::spawn(|| assert_eq!(mdc::get("MDC_INIT").as_deref(), Some("OK")))
        .join()
        .expect("Thread panicked");
}
