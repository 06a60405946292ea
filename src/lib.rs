pub mod events;
pub mod policy;
pub mod pool;
pub mod sim;
pub mod traffic;

/// dimensional analysis types
pub type Millis = f64;
pub type Seconds = f64;
pub type Rate = f64;
pub type Load = f64;

/// identities are monotonic and never reused
pub type SessionId = usize;
pub type UpfId = usize;

/// initialize terminal logging
pub fn init(level: log::LevelFilter) {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    simplelog::TermLogger::init(
        level,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
    .expect("initialize logger");
}
