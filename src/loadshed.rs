// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Load-shedding shutdown scheduler.
//!
//! During load-shedding the power in a zone of the City of Cape Town is cut on
//! a published schedule. Rather than losing work to a hard power loss, a
//! clean shutdown is scheduled with `at` a few minutes before every cut in
//! the next 24 hours that applies to the configured zone and current stage.
//! If a cut is so close that its shutdown time already passed, the machine
//! shuts down right away.

use crate::{config::LoadshedSettings, syscall::Syscall};

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt, sync::LazyLock};
use tracing::{debug, info, instrument, warn};

static YEAR_FIRST: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})"));
static DAY_FIRST: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})[-/.](\d{1,2})[-/.](\d{4})"));
static CLOCK: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2})(?::(\d{2}))?"));

/// Value the API sends either as a number or as a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(i64),
    Text(String),
}

impl Scalar {
    fn matches(&self, expect: &str) -> bool {
        self.to_string().trim() == expect.trim()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(fmt, "{number}"),
            Self::Text(text) => fmt.write_str(text),
        }
    }
}

/// Published power cut schedule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Schedule {
    pub last_modified: String,
    pub schedules: Vec<Cut>,
}

/// Single power cut.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Cut {
    pub stage: Scalar,
    pub zones: Vec<Scalar>,
    pub date_short: String,
    pub start_time: String,
}

/// Planned shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// Power cut is too close, shut down immediately.
    Now,

    /// Shut down at given local time.
    At(NaiveDateTime),
}

/// Schedule shutdowns ahead of power cuts.
#[derive(Debug)]
pub struct Scheduler<S: Syscall> {
    syscall: S,
    client: Client,
    settings: LoadshedSettings,
}

impl<S: Syscall> Scheduler<S> {
    /// Construct new scheduler.
    pub fn new(syscall: S, settings: LoadshedSettings) -> Self {
        Self {
            syscall,
            client: Client::new(),
            settings,
        }
    }

    /// Schedule shutdowns for all power cuts in the next 24 hours.
    ///
    /// Current stage is looked up unless given.
    ///
    /// # Errors
    ///
    /// - Return [`LoadshedError::Lookup`] if stage or schedule cannot be
    ///   fetched.
    /// - Return [`LoadshedError::Syscall`] if emergency shutdown fails.
    #[instrument(skip(self), level = "debug")]
    pub async fn run(&self, stage: Option<String>) -> Result<()> {
        let stage = match stage {
            Some(stage) => stage,
            None => {
                info!("fetching city of cape town loadshedding stage");
                self.fetch("status", "stage").await?.text().await.map_err(|source| {
                    LoadshedError::Lookup {
                        resource: "stage",
                        source,
                    }
                })?
            }
        };

        if is_not_loadshedding(&stage) {
            info!("there is currently no loadshedding");
            return Ok(());
        }
        info!("using schedule for stage {} loadshedding", stage.trim());

        info!("fetching city of cape town loadshedding schedule");
        let schedule = self
            .fetch("schedulesctfeb2015", "schedule")
            .await?
            .json::<Schedule>()
            .await
            .map_err(|source| LoadshedError::Lookup {
                resource: "schedule",
                source,
            })?;

        let now = Local::now().naive_local();
        match parse_date(&schedule.last_modified)? {
            Some(updated) if updated != now.date() => {
                warn!("schedule was last updated on {updated}")
            }
            None => warn!("cannot tell when schedule was last updated"),
            _ => {}
        }

        let lead = Duration::minutes(self.settings.lead_minutes);
        let plans = plan_shutdowns(&schedule, &stage, self.settings.zone, now, lead)?;
        self.execute(&plans)
    }

    async fn fetch(&self, function: &str, resource: &'static str) -> Result<reqwest::Response> {
        let url = format!("{}/{function}", self.settings.api_url.trim_end_matches('/'));
        debug!("query {url:?}");
        self.client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| LoadshedError::Lookup { resource, source })
    }

    /// Carry out planned shutdowns.
    ///
    /// Stops at the first immediate shutdown. Failure to schedule a shutdown
    /// is reported, and the remaining shutdowns are still scheduled.
    ///
    /// # Errors
    ///
    /// - Return [`LoadshedError::Syscall`] if immediate shutdown fails.
    pub fn execute(&self, plans: &[Shutdown]) -> Result<()> {
        let command = shutdown_command(&self.settings.notice, self.settings.grace_minutes);
        for plan in plans {
            match plan {
                Shutdown::Now => {
                    warn!("power cut is imminent, shutting down now");
                    self.syscall.interactive("shutdown", ["now"])?;
                    return Ok(());
                }
                Shutdown::At(time) => {
                    info!("scheduling shutdown for {time}");
                    let clock = time.format("%H:%M").to_string();
                    let date = time.format("%Y-%m-%d").to_string();
                    let args = ["-M", clock.as_str(), date.as_str()];
                    if let Err(err) = self.syscall.piped("at", args, &command) {
                        warn!("failed to schedule shutdown for {time}: {err}");
                    }
                }
            }
        }

        Ok(())
    }
}

/// Check if stage means there is no load-shedding.
pub fn is_not_loadshedding(stage: &str) -> bool {
    matches!(stage.trim(), "Not Load Shedding" | "0")
}

/// Shell command run by `at` ahead of a power cut.
pub fn shutdown_command(notice: &str, grace_minutes: i64) -> String {
    format!(
        "XDG_RUNTIME_DIR=/run/user/$(id -u) notify-send Loadshedding '{notice}'; shutdown +{grace_minutes}"
    )
}

/// Plan shutdowns for cuts of a zone and stage starting within 24 hours.
///
/// Cuts with dates or times that cannot be read are skipped.
///
/// # Errors
///
/// - Return [`LoadshedError::Pattern`] if a date pattern fails to compile.
pub fn plan_shutdowns(
    schedule: &Schedule,
    stage: &str,
    zone: u32,
    now: NaiveDateTime,
    lead: Duration,
) -> Result<Vec<Shutdown>> {
    let zone = zone.to_string();
    let mut plans = Vec::new();

    for cut in &schedule.schedules {
        if !cut.stage.matches(stage) || !cut.zones.iter().any(|found| found.matches(&zone)) {
            continue;
        }

        let (Some(date), Some(time)) = (parse_date(&cut.date_short)?, parse_time(&cut.start_time)?)
        else {
            debug!("skip unreadable cut {cut:?}");
            continue;
        };

        let start = date.and_time(time);
        if !(now < start && start < now + Duration::days(1)) {
            continue;
        }

        let shutdown = start - lead;
        plans.push(if shutdown < now {
            Shutdown::Now
        } else {
            Shutdown::At(shutdown)
        });
    }

    Ok(plans)
}

/// Read first date out of free-form text.
///
/// Understands RFC 2822 and RFC 3339 timestamps, year-first dates, and
/// day-first dates with a four digit year.
///
/// # Errors
///
/// - Return [`LoadshedError::Pattern`] if a date pattern fails to compile.
pub fn parse_date(text: &str) -> Result<Option<NaiveDate>> {
    let text = text.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc2822(text) {
        return Ok(Some(stamp.date_naive()));
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Ok(Some(stamp.date_naive()));
    }

    if let Some(caps) = compiled(&YEAR_FIRST)?.captures(text) {
        return Ok(ymd(&caps[1], &caps[2], &caps[3]));
    }

    if let Some(caps) = compiled(&DAY_FIRST)?.captures(text) {
        return Ok(ymd(&caps[3], &caps[2], &caps[1]));
    }

    Ok(None)
}

fn compiled(pattern: &'static LazyLock<Result<Regex, regex::Error>>) -> Result<&'static Regex> {
    pattern.as_ref().map_err(|err| LoadshedError::Pattern(err.clone()))
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Read first time of day out of free-form text.
///
/// # Errors
///
/// - Return [`LoadshedError::Pattern`] if the time pattern fails to compile.
pub fn parse_time(text: &str) -> Result<Option<NaiveTime>> {
    Ok(compiled(&CLOCK)?.captures(text).and_then(|caps| {
        let second = caps.get(3).map_or(Some(0), |second| second.as_str().parse().ok());
        NaiveTime::from_hms_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, second?)
    }))
}

/// Load-shedding scheduler error types.
#[derive(Debug, thiserror::Error)]
pub enum LoadshedError {
    #[error("lookup of loadshedding {resource} failed")]
    Lookup {
        resource: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Syscall(#[from] crate::syscall::SyscallError),
}

/// Friendly result alias :3
type Result<T, E = LoadshedError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscall::fake::{Recorder, Reply};
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    fn at(date: &str, time: &str) -> anyhow::Result<NaiveDateTime> {
        Ok(NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M")?)
    }

    fn schedule() -> anyhow::Result<Schedule> {
        Ok(serde_json::from_str(indoc! {r#"
            {
                "LastModified": "2024-03-07T06:00:00+02:00",
                "Schedules": [
                    { "Stage": 2, "Zones": [3, 11], "DateShort": "2024-03-07", "StartTime": "08:05" },
                    { "Stage": "2", "Zones": ["3"], "DateShort": "2024-03-07", "StartTime": "12:00" },
                    { "Stage": 2, "Zones": [4], "DateShort": "2024-03-07", "StartTime": "14:00" },
                    { "Stage": 3, "Zones": [3], "DateShort": "2024-03-07", "StartTime": "16:00" },
                    { "Stage": 2, "Zones": [3], "DateShort": "2024-03-07", "StartTime": "06:00" },
                    { "Stage": 2, "Zones": [3], "DateShort": "2024-03-08", "StartTime": "10:00" },
                    { "Stage": 2, "Zones": [3], "DateShort": "garbage", "StartTime": "10:00" }
                ]
            }
        "#})?)
    }

    #[test]
    fn plan_shutdowns_within_a_day() -> anyhow::Result<()> {
        let now = at("2024-03-07", "08:00")?;
        let plans = plan_shutdowns(&schedule()?, "2", 3, now, Duration::minutes(10))?;

        assert_eq!(
            plans,
            vec![Shutdown::Now, Shutdown::At(at("2024-03-07", "11:50")?)]
        );

        Ok(())
    }

    #[test_case("Not Load Shedding", true; "words")]
    #[test_case("0\n", true; "zero")]
    #[test_case("2", false; "stage two")]
    #[test]
    fn detect_no_loadshedding(stage: &str, expect: bool) {
        pretty_assertions::assert_eq!(is_not_loadshedding(stage), expect);
    }

    #[test_case("2024-03-07", Some((2024, 3, 7)); "iso")]
    #[test_case("Thu, 07 Mar 2024 06:00:00 +0200", Some((2024, 3, 7)); "rfc2822")]
    #[test_case("updated 7/3/2024 at noon", Some((2024, 3, 7)); "day first")]
    #[test_case("whenever", None; "unreadable")]
    #[test]
    fn parse_free_form_dates(text: &str, expect: Option<(i32, u32, u32)>) -> anyhow::Result<()> {
        let expect = expect.and_then(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day));
        pretty_assertions::assert_eq!(parse_date(text)?, expect);
        Ok(())
    }

    #[test_case("08:05", Some((8, 5, 0)); "clock")]
    #[test_case("2024-03-07T16:30:15", Some((16, 30, 15)); "timestamp")]
    #[test_case("noon", None; "unreadable")]
    #[test]
    fn parse_free_form_times(text: &str, expect: Option<(u32, u32, u32)>) -> anyhow::Result<()> {
        let expect = expect.and_then(|(hour, min, sec)| NaiveTime::from_hms_opt(hour, min, sec));
        pretty_assertions::assert_eq!(parse_time(text)?, expect);
        Ok(())
    }

    #[test]
    fn date_patterns_compile_once() -> anyhow::Result<()> {
        assert!(std::ptr::eq(compiled(&CLOCK)?, compiled(&CLOCK)?));
        assert!(std::ptr::eq(compiled(&YEAR_FIRST)?, compiled(&YEAR_FIRST)?));
        Ok(())
    }

    #[test]
    fn execute_schedules_with_at() -> anyhow::Result<()> {
        let syscall = Recorder::with_replies([Reply::Fail("garbled time".into())]);
        let scheduler = Scheduler::new(syscall, LoadshedSettings::default());
        let plans = [
            Shutdown::At(at("2024-03-07", "11:50")?),
            Shutdown::At(at("2024-03-08", "09:50")?),
        ];
        scheduler.execute(&plans)?;

        assert_eq!(
            scheduler.syscall.calls(),
            vec![
                vec!["at", "-M", "11:50", "2024-03-07"],
                vec!["at", "-M", "09:50", "2024-03-08"],
            ]
        );
        let command = "XDG_RUNTIME_DIR=/run/user/$(id -u) notify-send Loadshedding 'Shutting down in 5min'; shutdown +5";
        assert_eq!(*scheduler.syscall.inputs.borrow(), vec![command, command]);

        Ok(())
    }

    #[test]
    fn execute_stops_at_emergency_shutdown() -> anyhow::Result<()> {
        let scheduler = Scheduler::new(Recorder::new(), LoadshedSettings::default());
        let plans = [Shutdown::Now, Shutdown::At(at("2024-03-07", "11:50")?)];
        scheduler.execute(&plans)?;

        assert_eq!(scheduler.syscall.calls(), vec![vec!["shutdown", "now"]]);

        Ok(())
    }
}
