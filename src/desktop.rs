// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Desktop environment toggles.
//!
//! Flip GNOME between dark and light appearance, and route microphone input
//! straight to the speakers through the PulseAudio loopback module. Both
//! toggles announce their new state through a desktop notification.

use crate::{config::DesktopSettings, syscall::Syscall};

use tracing::{info, instrument};

const INTERFACE_SCHEMA: &str = "org.gnome.desktop.interface";
const LOOPBACK_MODULE: &str = "module-loopback";

/// Requested state of a toggle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    On,
    Off,
    #[default]
    Toggle,
}

impl Mode {
    /// Resolve state to switch to, given the current state.
    pub fn resolve(self, current: bool) -> bool {
        match self {
            Self::On => true,
            Self::Off => false,
            Self::Toggle => !current,
        }
    }
}

/// Desktop environment controls.
#[derive(Debug)]
pub struct Desktop<S: Syscall> {
    syscall: S,
    settings: DesktopSettings,
}

impl<S: Syscall> Desktop<S> {
    /// Construct new desktop controls.
    pub fn new(syscall: S, settings: DesktopSettings) -> Self {
        Self { syscall, settings }
    }

    /// Switch dark mode, returning whether it is now on.
    ///
    /// Both the color scheme preference and the GTK theme are set, since
    /// legacy applications only look at the latter.
    ///
    /// # Errors
    ///
    /// - Return [`DesktopError::Syscall`] if gsettings or notify-send fail.
    #[instrument(skip(self), level = "debug")]
    pub fn dark_mode(&self, mode: Mode) -> Result<bool> {
        let scheme = self
            .syscall
            .non_interactive("gsettings", ["get", INTERFACE_SCHEMA, "color-scheme"])?;
        let dark = mode.resolve(scheme.contains("prefer-dark"));

        let (scheme, theme) = if dark {
            ("prefer-dark", self.settings.dark_theme.as_str())
        } else {
            ("default", self.settings.light_theme.as_str())
        };
        self.syscall
            .non_interactive("gsettings", ["set", INTERFACE_SCHEMA, "color-scheme", scheme])?;
        self.syscall
            .non_interactive("gsettings", ["set", INTERFACE_SCHEMA, "gtk-theme", theme])?;

        let state = if dark { "on" } else { "off" };
        info!("dark mode {state}");
        self.notify("Dark mode", &format!("Dark mode switched {state}"))?;

        Ok(dark)
    }

    /// Switch audio loopback, returning whether it is now on.
    ///
    /// Does nothing if loopback is already in the requested state.
    ///
    /// # Errors
    ///
    /// - Return [`DesktopError::Syscall`] if pactl or notify-send fail.
    #[instrument(skip(self), level = "debug")]
    pub fn loopback(&self, mode: Mode) -> Result<bool> {
        let modules = self
            .syscall
            .non_interactive("pactl", ["list", "short", "modules"])?;
        let loaded = modules.contains(LOOPBACK_MODULE);
        let wanted = mode.resolve(loaded);

        if wanted == loaded {
            info!("loopback is already {}", if loaded { "on" } else { "off" });
            return Ok(loaded);
        }

        if wanted {
            let latency = format!("latency_msec={}", self.settings.loopback_latency_msec);
            self.syscall
                .non_interactive("pactl", ["load-module", LOOPBACK_MODULE, latency.as_str()])?;
        } else {
            self.syscall
                .non_interactive("pactl", ["unload-module", LOOPBACK_MODULE])?;
        }

        let state = if wanted { "on" } else { "off" };
        info!("loopback {state}");
        self.notify("Loopback", &format!("Audio loopback switched {state}"))?;

        Ok(wanted)
    }

    fn notify(&self, summary: &str, body: &str) -> Result<()> {
        self.syscall.non_interactive("notify-send", [summary, body])?;
        Ok(())
    }
}

/// Desktop toggle error types.
#[derive(Debug, thiserror::Error)]
pub enum DesktopError {
    #[error(transparent)]
    Syscall(#[from] crate::syscall::SyscallError),
}

/// Friendly result alias :3
type Result<T, E = DesktopError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscall::fake::{Recorder, Reply};
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    fn desktop(replies: impl IntoIterator<Item = Reply>) -> Desktop<Recorder> {
        Desktop::new(Recorder::with_replies(replies), DesktopSettings::default())
    }

    #[test_case(Mode::On, false, true; "on")]
    #[test_case(Mode::Off, true, false; "off")]
    #[test_case(Mode::Toggle, true, false; "toggle")]
    #[test]
    fn mode_resolves(mode: Mode, current: bool, expect: bool) {
        pretty_assertions::assert_eq!(mode.resolve(current), expect);
    }

    #[test]
    fn dark_mode_toggle_from_light() -> anyhow::Result<()> {
        let desktop = desktop([Reply::Ok("'default'".into())]);
        assert!(desktop.dark_mode(Mode::Toggle)?);
        assert_eq!(
            desktop.syscall.calls(),
            vec![
                vec!["gsettings", "get", INTERFACE_SCHEMA, "color-scheme"],
                vec!["gsettings", "set", INTERFACE_SCHEMA, "color-scheme", "prefer-dark"],
                vec!["gsettings", "set", INTERFACE_SCHEMA, "gtk-theme", "Adwaita-dark"],
                vec!["notify-send", "Dark mode", "Dark mode switched on"],
            ]
        );
        Ok(())
    }

    #[test]
    fn dark_mode_off() -> anyhow::Result<()> {
        let desktop = desktop([Reply::Ok("'prefer-dark'".into())]);
        assert!(!desktop.dark_mode(Mode::Off)?);
        assert_eq!(
            desktop.syscall.calls()[2],
            vec!["gsettings", "set", INTERFACE_SCHEMA, "gtk-theme", "Adwaita"]
        );
        Ok(())
    }

    #[test]
    fn loopback_load() -> anyhow::Result<()> {
        let desktop = desktop([Reply::Ok("12\tmodule-null-sink\t\t".into())]);
        assert!(desktop.loopback(Mode::Toggle)?);
        assert_eq!(
            desktop.syscall.calls(),
            vec![
                vec!["pactl", "list", "short", "modules"],
                vec!["pactl", "load-module", "module-loopback", "latency_msec=1"],
                vec!["notify-send", "Loopback", "Audio loopback switched on"],
            ]
        );
        Ok(())
    }

    #[test]
    fn loopback_unload() -> anyhow::Result<()> {
        let desktop = desktop([Reply::Ok("27\tmodule-loopback\tlatency_msec=1\t".into())]);
        assert!(!desktop.loopback(Mode::Off)?);
        assert_eq!(
            desktop.syscall.calls()[1],
            vec!["pactl", "unload-module", "module-loopback"]
        );
        Ok(())
    }

    #[test]
    fn loopback_already_on_is_noop() -> anyhow::Result<()> {
        let desktop = desktop([Reply::Ok("27\tmodule-loopback\t\t".into())]);
        assert!(desktop.loopback(Mode::On)?);
        assert_eq!(desktop.syscall.calls().len(), 1);
        Ok(())
    }

    #[test]
    fn notify_failure_propagates() {
        let desktop = desktop([
            Reply::Ok("'default'".into()),
            Reply::Ok(String::new()),
            Reply::Ok(String::new()),
            Reply::Fail("no notification daemon".into()),
        ]);
        assert!(matches!(desktop.dark_mode(Mode::On), Err(DesktopError::Syscall(_))));
    }
}
