mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Returns the main version identifier as used for releases, e.g. `v0.4`.
pub(crate) fn identifier() -> String {
    let digits = build_info::PKG_VERSION.strip_suffix(".0")
        .unwrap_or(build_info::PKG_VERSION);

    format!("v{digits}")
}

/// Returns a string containing all version-related information.
pub(crate) fn full() -> String {
    format!("{} (built {})", identifier(), build_info::BUILT_TIME_UTC)
}
