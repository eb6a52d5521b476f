pub const FULL: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "+git.",
    env!("TASKLINE_GIT_COUNT"),
    ".",
    env!("TASKLINE_GIT_SHA"),
    env!("TASKLINE_GIT_DIRTY")
);
