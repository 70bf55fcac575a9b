//! Engine switches.
//!
//! The process default comes from the `DEEPCOPY_FLAGS` environment variable,
//! read once: a comma-separated list of flag names, or `all`, or `none`.
//! Unset means every flag on.
//!
//! - `track_containers` - record slice and map storage in the visitation
//!   table, so container-only cycles terminate and shared backing storage
//!   stays shared in the copy
//! - `grow_stack` - grow the stack on demand during deep walks
//!
//! Example: `DEEPCOPY_FLAGS=grow_stack cargo test`

use std::sync::OnceLock;

use bitflags::bitflags;

/// Environment variable holding the process-wide flags.
pub const CONFIG_ENV: &str = "DEEPCOPY_FLAGS";

bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
    pub struct CopyFlags: u8 {
        /// Track slice and map storage in the visitation table.
        const TRACK_CONTAINERS = 1 << 0;
        /// Run every recursive step under the stack-growth guard.
        const GROW_STACK = 1 << 1;
    }
}

impl Default for CopyFlags {
    fn default() -> Self {
        Self::all()
    }
}

impl CopyFlags {
    /// Parse a comma-separated flag list. Unknown names are ignored.
    pub fn parse(s: &str) -> Self {
        let mut flags = Self::empty();
        for part in s.split(',') {
            match part.trim().to_ascii_lowercase().as_str() {
                "track_containers" => flags |= Self::TRACK_CONTAINERS,
                "grow_stack" => flags |= Self::GROW_STACK,
                "all" => flags |= Self::all(),
                "none" | "" => {}
                unknown => tracing::warn!(flag = unknown, "ignoring unknown flag in {}", CONFIG_ENV),
            }
        }
        flags
    }
}

static GLOBAL_FLAGS: OnceLock<CopyFlags> = OnceLock::new();

/// Process-wide flags.
///
/// Reads `DEEPCOPY_FLAGS` on first call, then returns the cached value.
pub fn global_flags() -> CopyFlags {
    *GLOBAL_FLAGS.get_or_init(|| {
        std::env::var(CONFIG_ENV)
            .ok()
            .map(|s| CopyFlags::parse(&s))
            .unwrap_or_default()
    })
}
