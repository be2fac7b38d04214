#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` is the verbosity flag system for the version store agent
//! (§4.K): a per-category, per-level gate on info and debug output,
//! modeled after `-v`/`--info=FLAG[LEVEL]`/`--debug=FLAG[LEVEL]`. Each
//! category (saving a version, running GC, decrypting a blob, ...) has
//! its own independent verbosity level, so `--debug=cipher2` can turn up
//! cipher tracing without drowning the log in catalog chatter.
//!
//! State lives in a thread-local so that concurrent test runs (and, in
//! the agent, independent connection threads) never see each other's
//! configuration.
//!
//! # See also
//!
//! - [`info_log!`] and [`debug_log!`], the macros most callers use.
//! - [`VerbosityConfig::from_verbose_level`] for the `-v`/`-vv`/`-vvv`
//!   mapping.
//! - The `tracing` feature bridges emitted events into the `tracing`
//!   crate's dispatcher for production use; without it, events only
//!   accumulate in the in-memory buffer [`drain_events`] reads.

use std::cell::RefCell;

/// One category of informational output (§4.K).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InfoFlag {
    /// A new version was saved.
    Save,
    /// A version's shadow copy was deleted.
    Delete,
    /// A version was restored to the filesystem.
    Restore,
    /// A blob was deduplicated against an existing object.
    Dedup,
    /// Garbage collection activity.
    Gc,
    /// Retention pruning activity.
    Retention,
    /// Whole-catalog statistics.
    Stats,
    /// The path a command is currently operating on.
    Name,
    /// Anything not covered by a more specific flag.
    Misc,
    /// Progress of a long-running transfer.
    Progress,
}

/// One category of debug output (§4.K), for tracing the internals of a
/// single crate's operation rather than user-facing activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DebugFlag {
    /// Pipeline orchestration (encode/decode, compression, dedup
    /// decisions).
    Pipeline,
    /// Catalog reads, writes, and lock acquisition.
    Catalog,
    /// Encryption and key derivation.
    Cipher,
    /// Delta signature and script computation.
    Delta,
    /// Blob store layout and I/O.
    Store,
    /// Wire protocol framing and dispatch.
    Protocol,
    /// Content hashing.
    Hash,
    /// Raw file I/O below the crates above.
    Io,
    /// Advisory lock acquisition and contention.
    Lock,
    /// Dedup reference counting.
    Dedup,
}

/// One event recorded by [`info_log!`] or [`debug_log!`] once it passes
/// its flag's configured threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// An info-level event.
    Info {
        /// The category it was logged under.
        flag: InfoFlag,
        /// The level it was logged at.
        level: u8,
        /// The formatted message.
        message: String,
    },
    /// A debug-level event.
    Debug {
        /// The category it was logged under.
        flag: DebugFlag,
        /// The level it was logged at.
        level: u8,
        /// The formatted message.
        message: String,
    },
}

macro_rules! flag_struct {
    ($name:ident { $($field:ident),+ $(,)? }) => {
        /// Per-category verbosity levels; `0` means silent.
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct $name {
            $(
                #[allow(missing_docs)]
                pub $field: u8,
            )+
        }

        impl $name {
            /// Sets every field to `level`.
            pub fn set_all(&mut self, level: u8) {
                $(self.$field = level;)+
            }

            fn level(&self, flag_variant: &str) -> Option<u8> {
                match flag_variant {
                    $(stringify!($field) => Some(self.$field),)+
                    _ => None,
                }
            }

            fn level_mut(&mut self, flag_variant: &str) -> Option<&mut u8> {
                match flag_variant {
                    $(stringify!($field) => Some(&mut self.$field),)+
                    _ => None,
                }
            }
        }
    };
}

flag_struct!(InfoFlags {
    save,
    delete,
    restore,
    dedup,
    gc,
    retention,
    stats,
    name,
    misc,
    progress,
});

flag_struct!(DebugFlags {
    pipeline,
    catalog,
    cipher,
    delta,
    store,
    protocol,
    hash,
    io,
    lock,
    dedup,
});

impl InfoFlag {
    fn field_name(self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Delete => "delete",
            Self::Restore => "restore",
            Self::Dedup => "dedup",
            Self::Gc => "gc",
            Self::Retention => "retention",
            Self::Stats => "stats",
            Self::Name => "name",
            Self::Misc => "misc",
            Self::Progress => "progress",
        }
    }
}

impl DebugFlag {
    fn field_name(self) -> &'static str {
        match self {
            Self::Pipeline => "pipeline",
            Self::Catalog => "catalog",
            Self::Cipher => "cipher",
            Self::Delta => "delta",
            Self::Store => "store",
            Self::Protocol => "protocol",
            Self::Hash => "hash",
            Self::Io => "io",
            Self::Lock => "lock",
            Self::Dedup => "dedup",
        }
    }
}

/// The full verbosity configuration: independent levels for every info
/// and debug category (§4.K).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VerbosityConfig {
    /// Info-category levels.
    pub info: InfoFlags,
    /// Debug-category levels.
    pub debug: DebugFlags,
}

impl VerbosityConfig {
    /// Builds the configuration a `-v` repeat count of `level` implies.
    ///
    /// `0` (quiet) enables nothing. `1` enables the basic user-facing
    /// categories at level 1. `2` and above raise `name`/`misc` to level
    /// 2, turn on the remaining info categories, and set every debug
    /// category to `level - 1`.
    #[must_use]
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();
        if level == 0 {
            return config;
        }

        config.info.save = 1;
        config.info.delete = 1;
        config.info.restore = 1;
        config.info.stats = 1;
        config.info.name = 1;
        config.info.misc = 1;

        if level >= 2 {
            config.info.name = 2;
            config.info.misc = 2;
            config.info.dedup = 1;
            config.info.gc = 1;
            config.info.retention = 1;
            config.info.progress = 1;

            let debug_level = level - 1;
            config.debug.pipeline = debug_level;
            config.debug.catalog = debug_level;
            config.debug.cipher = debug_level;
            config.debug.delta = debug_level;
            config.debug.store = debug_level;
            config.debug.protocol = debug_level;
            config.debug.hash = debug_level;
            config.debug.io = debug_level;
            config.debug.lock = debug_level;
            config.debug.dedup = debug_level;
        }

        config
    }

    /// Parses one `--info=FLAG[LEVEL]` token (e.g. `"save"`, `"save2"`,
    /// `"save0"`) and applies it, or the special keywords `"ALL"` /
    /// `"NONE"` (case-insensitive), which set every info category to
    /// level 1 or 0.
    ///
    /// # Errors
    ///
    /// Returns an error string if the flag name is unknown or the level
    /// suffix is not a valid `u8`.
    pub fn apply_info_flag(&mut self, token: &str) -> Result<(), String> {
        if token.eq_ignore_ascii_case("ALL") {
            self.info.set_all(1);
            return Ok(());
        }
        if token.eq_ignore_ascii_case("NONE") {
            self.info.set_all(0);
            return Ok(());
        }

        let (name, level) = split_flag_token(token);
        let level: u8 = level
            .map(str::parse)
            .transpose()
            .map_err(|_| format!("invalid level in info flag: {token}"))?
            .unwrap_or(1);
        match self.info.level_mut(name) {
            Some(slot) => {
                *slot = level;
                Ok(())
            }
            None => Err(format!("unknown info flag: {name}")),
        }
    }

    /// Parses one `--debug=FLAG[LEVEL]` token, the debug counterpart of
    /// [`Self::apply_info_flag`]. Does not recognize `ALL`/`NONE`.
    ///
    /// # Errors
    ///
    /// Returns an error string if the flag name is unknown or the level
    /// suffix is not a valid `u8`.
    pub fn apply_debug_flag(&mut self, token: &str) -> Result<(), String> {
        let (name, level) = split_flag_token(token);
        let level: u8 = level
            .map(str::parse)
            .transpose()
            .map_err(|_| format!("invalid level in debug flag: {token}"))?
            .unwrap_or(1);
        match self.debug.level_mut(name) {
            Some(slot) => {
                *slot = level;
                Ok(())
            }
            None => Err(format!("unknown debug flag: {name}")),
        }
    }
}

/// Splits `"name23"` into `("name", Some("23"))`, or `"name"` into
/// `("name", None)`.
fn split_flag_token(token: &str) -> (&str, Option<&str>) {
    let split_at = token
        .bytes()
        .position(|b| b.is_ascii_digit())
        .unwrap_or(token.len());
    let (name, level) = token.split_at(split_at);
    (name, if level.is_empty() { None } else { Some(level) })
}

thread_local! {
    static CONFIG: RefCell<VerbosityConfig> = RefCell::new(VerbosityConfig::default());
    static EVENTS: RefCell<Vec<DiagnosticEvent>> = RefCell::new(Vec::new());
}

/// Installs `config` as the active verbosity configuration for the
/// current thread, replacing whatever was there before.
pub fn init(config: VerbosityConfig) {
    CONFIG.with(|cell| *cell.borrow_mut() = config);
}

/// Applies one `--info=FLAG[LEVEL]` token to the active configuration.
///
/// # Errors
///
/// See [`VerbosityConfig::apply_info_flag`].
pub fn apply_info_flag(token: &str) -> Result<(), String> {
    CONFIG.with(|cell| cell.borrow_mut().apply_info_flag(token))
}

/// Applies one `--debug=FLAG[LEVEL]` token to the active configuration.
///
/// # Errors
///
/// See [`VerbosityConfig::apply_debug_flag`].
pub fn apply_debug_flag(token: &str) -> Result<(), String> {
    CONFIG.with(|cell| cell.borrow_mut().apply_debug_flag(token))
}

/// Returns whether `flag` is configured at or above `level`.
#[must_use]
pub fn info_gte(flag: InfoFlag, level: u8) -> bool {
    CONFIG.with(|cell| {
        cell.borrow()
            .info
            .level(flag.field_name())
            .is_some_and(|configured| configured >= level)
    })
}

/// Returns whether `flag` is configured at or above `level`.
#[must_use]
pub fn debug_gte(flag: DebugFlag, level: u8) -> bool {
    CONFIG.with(|cell| {
        cell.borrow()
            .debug
            .level(flag.field_name())
            .is_some_and(|configured| configured >= level)
    })
}

/// Records an info event if `flag` is configured at or above `level`.
/// Callers normally go through [`info_log!`] rather than calling this
/// directly.
pub fn record_info(flag: InfoFlag, level: u8, message: String) {
    if !info_gte(flag, level) {
        return;
    }
    #[cfg(feature = "tracing")]
    tracing::info!(category = flag.field_name(), level, "{message}");
    EVENTS.with(|cell| {
        cell.borrow_mut().push(DiagnosticEvent::Info {
            flag,
            level,
            message,
        });
    });
}

/// Records a debug event if `flag` is configured at or above `level`.
/// Callers normally go through [`debug_log!`] rather than calling this
/// directly.
pub fn record_debug(flag: DebugFlag, level: u8, message: String) {
    if !debug_gte(flag, level) {
        return;
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(category = flag.field_name(), level, "{message}");
    EVENTS.with(|cell| {
        cell.borrow_mut().push(DiagnosticEvent::Debug {
            flag,
            level,
            message,
        });
    });
}

/// Removes and returns every event recorded on the current thread since
/// the last call to `drain_events` (or since `init`).
pub fn drain_events() -> Vec<DiagnosticEvent> {
    EVENTS.with(|cell| std::mem::take(&mut *cell.borrow_mut()))
}

/// Logs an info-level event, gated by `flag` and `level` (§4.K).
///
/// ```ignore
/// info_log!(Save, 1, "saved {} ({} bytes)", path, size);
/// ```
#[macro_export]
macro_rules! info_log {
    ($flag:ident, $level:expr, $($arg:tt)*) => {
        $crate::record_info($crate::InfoFlag::$flag, $level, format!($($arg)*))
    };
}

/// Logs a debug-level event, gated by `flag` and `level` (§4.K). The
/// debug counterpart of [`info_log!`].
#[macro_export]
macro_rules! debug_log {
    ($flag:ident, $level:expr, $($arg:tt)*) => {
        $crate::record_debug($crate::DebugFlag::$flag, $level, format!($($arg)*))
    };
}
