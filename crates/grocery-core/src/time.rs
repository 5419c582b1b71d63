use chrono::{DateTime, Local, NaiveDate, Utc};

/// Clock abstracts access to the current date so the updater stays deterministic in tests.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the calendar date used for budget bucketing.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock. Budget days follow the machine's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a single date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    date: NaiveDate,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.date
            .and_hms_opt(12, 0, 0)
            .unwrap_or_default()
            .and_utc()
    }

    fn today(&self) -> NaiveDate {
        self.date
    }
}
