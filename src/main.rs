/// Prints the resource limits of the current process as JSON.
///
/// Set `ROOTFS_MOUNT_PATH` to read `/proc` and `/sys` from another root and
/// `RUST_LOG=debug` to see how the limits were discovered.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug cargo run
/// ```
fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let context = creo_limits::ResourceContext::initialize(creo_limits::Config::from_env());
    let limits = context.snapshot();
    context.cleanup();

    println!("{}", serde_json::to_string_pretty(&limits)?);
    Ok(())
}
