use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};

use crate::criterion::literal::{DATE_FORMAT, Literal, date_generate};

/// Relative date windows offered by the platform's `ON` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeOn {
    Today,
    Yesterday,
    Tomorrow,
    ThisWeek,
    LastWeek,
    NextWeek,
    ThisMonth,
    LastMonth,
    NextMonth,
    Last3Months,
    Last6Months,
    Last9Months,
    Last12Months,
    ThisQuarter,
    LastQuarter,
    Last2Quarters,
    NextQuarter,
    Next2Quarters,
    ThisYear,
    NextYear,
    LastYear,
    Last2Years,
    Last7Days,
    Last30Days,
    Last60Days,
    Last90Days,
    Last120Days,
    CurrentHour,
    LastHour,
    Last2Hours,
    CurrentMinute,
    LastMinute,
    Last15Minutes,
    Last30Minutes,
    Last45Minutes,
    OneYearAgo,
}

impl DateTimeOn {
    /// The label and generator suffix, e.g. `Today` and `Today`.
    fn parts(self) -> (&'static str, &'static str) {
        use DateTimeOn::*;
        match self {
            Today => ("Today", "Today"),
            Yesterday => ("Yesterday", "Yesterday"),
            Tomorrow => ("Tomorrow", "Tomorrow"),
            ThisWeek => ("This week", "ThisWeek"),
            LastWeek => ("Last week", "LastWeek"),
            NextWeek => ("Next week", "NextWeek"),
            ThisMonth => ("This month", "ThisMonth"),
            LastMonth => ("Last month", "LastMonth"),
            NextMonth => ("Next month", "NextMonth"),
            Last3Months => ("Last 3 months", "Last3Months"),
            Last6Months => ("Last 6 months", "Last6Months"),
            Last9Months => ("Last 9 months", "Last9Months"),
            Last12Months => ("Last 12 months", "Last12Months"),
            ThisQuarter => ("This quarter", "ThisQuarter"),
            LastQuarter => ("Last quarter", "LastQuarter"),
            Last2Quarters => ("Last 2 quarters", "Last2Quarters"),
            NextQuarter => ("Next quarter", "NextQuarter"),
            Next2Quarters => ("Next 2 quarters", "Next2Quarters"),
            ThisYear => ("This year", "ThisYear"),
            NextYear => ("Next year", "NextYear"),
            LastYear => ("Last year", "LastYear"),
            Last2Years => ("Last 2 years", "Last2Years"),
            Last7Days => ("Last 7 days", "Last7Days"),
            Last30Days => ("Last 30 days", "Last30Days"),
            Last60Days => ("Last 60 days", "Last60Days"),
            Last90Days => ("Last 90 days", "Last90Days"),
            Last120Days => ("Last 120 days", "Last120Days"),
            CurrentHour => ("Current hour", "CurrentHour"),
            LastHour => ("Last hour", "LastHour"),
            Last2Hours => ("Last 2 hours", "Last2Hours"),
            CurrentMinute => ("Current minute", "CurrentMinute"),
            LastMinute => ("Last minute", "LastMinute"),
            Last15Minutes => ("Last 15 minutes", "Last15Minutes"),
            Last30Minutes => ("Last 30 minutes", "Last30Minutes"),
            Last45Minutes => ("Last 45 minutes", "Last45Minutes"),
            OneYearAgo => ("One year ago", "OneYearAgo"),
        }
    }

    /// The encoded window, e.g.
    /// `Today@javascript:gs.beginningOfToday()@javascript:gs.endOfToday()`.
    pub fn encoded(self) -> String {
        let (label, suffix) = self.parts();
        format!("{label}@javascript:gs.beginningOf{suffix}()@javascript:gs.endOf{suffix}()")
    }
}

/// Right-hand side of an `ON` / `NOTON` condition before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum OnOperand {
    Window(DateTimeOn),
    Literal(Literal),
}

/// A validated `ON` / `NOTON` operand.
#[derive(Debug, Clone, PartialEq)]
pub enum OnValue {
    Window(DateTimeOn),
    /// A single UTC day.
    Day(NaiveDate),
}

impl OnValue {
    /// Renders the part following `ON` / `NOTON`.
    pub fn render(&self) -> String {
        match self {
            OnValue::Window(window) => window.encoded(),
            OnValue::Day(day) => {
                let day = day.format(DATE_FORMAT).to_string();
                format!(
                    "custom@{}@{}",
                    date_generate(&format!("{day}\", \"start")),
                    date_generate(&format!("{day}\", \"end")),
                )
            }
        }
    }
}

impl From<DateTimeOn> for OnOperand {
    fn from(value: DateTimeOn) -> Self {
        OnOperand::Window(value)
    }
}

impl From<Literal> for OnOperand {
    fn from(value: Literal) -> Self {
        OnOperand::Literal(value)
    }
}

impl From<NaiveDateTime> for OnOperand {
    fn from(value: NaiveDateTime) -> Self {
        OnOperand::Literal(value.into())
    }
}

impl From<NaiveDate> for OnOperand {
    fn from(value: NaiveDate) -> Self {
        OnOperand::Literal(value.into())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for OnOperand {
    fn from(value: DateTime<Tz>) -> Self {
        OnOperand::Literal(value.into())
    }
}

impl From<&str> for OnOperand {
    fn from(value: &str) -> Self {
        OnOperand::Literal(value.into())
    }
}

impl From<i64> for OnOperand {
    fn from(value: i64) -> Self {
        OnOperand::Literal(value.into())
    }
}

impl From<i32> for OnOperand {
    fn from(value: i32) -> Self {
        OnOperand::Literal(value.into())
    }
}
