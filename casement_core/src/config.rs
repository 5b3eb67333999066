// Copyright 2026 the Casement Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host configuration.
//!
//! [`HostConfig`] carries the numeric delays and boolean policies a host
//! consults. All delays are milliseconds. Values can be built in code, or
//! loaded from TOML:
//!
//! ```toml
//! state_stability_delay_ms = 120
//! anti_flicker_delay_ms = 250
//! paint_during_resize = false
//! ```
//!
//! Missing keys fall back to [`HostConfig::default`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostResult};
use crate::time::Duration;

/// Upper bound accepted for stability-related delays.
const MAX_STABILITY_DELAY_MS: u64 = 60_000;

/// Delays and policies consumed by a [`Host`](crate::host::Host).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Minimum dwell time before a detected backend state is trusted.
    pub state_stability_delay_ms: u64,
    /// Minimum time since the opposite state was last seen before a new state
    /// is accepted.
    pub anti_flicker_delay_ms: u64,
    /// Stability delay used for the Hidden transition.
    pub hidden_stability_delay_ms: u64,
    /// How long after a bounds-setting call a move is not taken as the start
    /// of a drag.
    pub drag_move_blocking_delay_ms: u64,
    /// Minimum interval between two paints.
    pub paint_coalescing_delay_ms: u64,
    /// Quiet period that ends a move or resize burst.
    pub burst_quiet_delay_ms: u64,
    /// Period of the reconciliation poll.
    pub poll_period_ms: u64,
    /// Poll lateness beyond which the scheduler is considered to have
    /// stalled.
    pub stall_margin_ms: u64,

    /// `show()` also deiconifies an iconified host.
    pub deiconify_on_show: bool,
    /// Request focus after Shown.
    pub request_focus_on_show: bool,
    /// Request focus after Deiconified.
    pub request_focus_on_deiconify: bool,
    /// Request focus after Maximized.
    pub request_focus_on_maximize: bool,
    /// Request focus after Demaximized.
    pub request_focus_on_demaximize: bool,
    /// Re-maximize after Deiconified if the host was maximized when it was
    /// iconified.
    pub restore_maximized_across_iconify: bool,
    /// Freeze reported bounds during a drag and defer bounds writes to its
    /// end.
    pub fix_bounds_during_drag: bool,
    /// Restore the last demaximized bounds after Demaximized.
    pub restore_bounds_on_demaximize: bool,
    /// Force the work area as window bounds after Maximized.
    pub enforce_bounds_on_maximize: bool,
    /// Paint on the first move of a burst instead of only after it settles.
    pub paint_during_move: bool,
    /// Paint on the first resize of a burst instead of only after it
    /// settles.
    pub paint_during_resize: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            state_stability_delay_ms: 100,
            anti_flicker_delay_ms: 200,
            hidden_stability_delay_ms: 250,
            drag_move_blocking_delay_ms: 200,
            paint_coalescing_delay_ms: 16,
            burst_quiet_delay_ms: 100,
            poll_period_ms: 50,
            stall_margin_ms: 100,

            deiconify_on_show: true,
            request_focus_on_show: true,
            request_focus_on_deiconify: true,
            request_focus_on_maximize: false,
            request_focus_on_demaximize: false,
            restore_maximized_across_iconify: true,
            fix_bounds_during_drag: true,
            restore_bounds_on_demaximize: false,
            enforce_bounds_on_maximize: false,
            paint_during_move: false,
            paint_during_resize: true,
        }
    }
}

impl HostConfig {
    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> HostResult<Self> {
        let cfg: Self = toml::from_str(s).map_err(|e| HostError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> HostResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(s) => Self::from_toml_str(&s)
                .map_err(|e| HostError::Config(format!("{}: {e}", path.display()))),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Rejects values a host cannot run with.
    pub fn validate(&self) -> HostResult<()> {
        if self.poll_period_ms == 0 {
            return Err(HostError::InvalidConfig(
                "poll_period_ms must be positive".into(),
            ));
        }
        for (name, value) in [
            ("state_stability_delay_ms", self.state_stability_delay_ms),
            ("anti_flicker_delay_ms", self.anti_flicker_delay_ms),
            ("hidden_stability_delay_ms", self.hidden_stability_delay_ms),
        ] {
            if value > MAX_STABILITY_DELAY_MS {
                return Err(HostError::InvalidConfig(format!(
                    "{name} = {value} exceeds {MAX_STABILITY_DELAY_MS}"
                )));
            }
        }
        Ok(())
    }

    /// A configuration with every stability delay set to zero.
    ///
    /// Backend states are trusted on first sight. Useful for backends known
    /// to report state synchronously, and in tests.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            state_stability_delay_ms: 0,
            anti_flicker_delay_ms: 0,
            hidden_stability_delay_ms: 0,
            ..Self::default()
        }
    }

    /// [`state_stability_delay_ms`](Self::state_stability_delay_ms) as a
    /// [`Duration`].
    #[must_use]
    pub fn state_stability_delay(&self) -> Duration {
        Duration(self.state_stability_delay_ms)
    }

    /// [`anti_flicker_delay_ms`](Self::anti_flicker_delay_ms) as a
    /// [`Duration`].
    #[must_use]
    pub fn anti_flicker_delay(&self) -> Duration {
        Duration(self.anti_flicker_delay_ms)
    }

    /// [`hidden_stability_delay_ms`](Self::hidden_stability_delay_ms) as a
    /// [`Duration`].
    #[must_use]
    pub fn hidden_stability_delay(&self) -> Duration {
        Duration(self.hidden_stability_delay_ms)
    }

    /// [`drag_move_blocking_delay_ms`](Self::drag_move_blocking_delay_ms) as
    /// a [`Duration`].
    #[must_use]
    pub fn drag_move_blocking_delay(&self) -> Duration {
        Duration(self.drag_move_blocking_delay_ms)
    }

    /// [`paint_coalescing_delay_ms`](Self::paint_coalescing_delay_ms) as a
    /// [`Duration`].
    #[must_use]
    pub fn paint_coalescing_delay(&self) -> Duration {
        Duration(self.paint_coalescing_delay_ms)
    }

    /// [`burst_quiet_delay_ms`](Self::burst_quiet_delay_ms) as a
    /// [`Duration`].
    #[must_use]
    pub fn burst_quiet_delay(&self) -> Duration {
        Duration(self.burst_quiet_delay_ms)
    }

    /// [`poll_period_ms`](Self::poll_period_ms) as a [`Duration`].
    #[must_use]
    pub fn poll_period(&self) -> Duration {
        Duration(self.poll_period_ms)
    }

    /// [`stall_margin_ms`](Self::stall_margin_ms) as a [`Duration`].
    #[must_use]
    pub fn stall_margin(&self) -> Duration {
        Duration(self.stall_margin_ms)
    }
}
