//! Retrieves information about the version of the synthesizer from Git and
//! the build environment. It is exposed through the `build` module generated
//! by shadow-rs and reported on startup.

fn main() -> shadow_rs::SdResult<()> {
    shadow_rs::new()
}
