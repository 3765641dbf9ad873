/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::{BufRead, Write};

use ews_xml::{FromXmlText, XmlReader, XmlWriter};
use time::{macros::format_description, Date};

use crate::{
    types::complex::skip_unknown_element, ChangeTracking, ComplexProperty, DayOfWeek, Error,
    ServiceContext, XmlNamespace,
};

/// The days on which a weekly recurrence occurs, written as a
/// space-separated list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DaysOfWeek {
    days: Vec<DayOfWeek>,
    tracking: ChangeTracking,
}

impl DaysOfWeek {
    pub fn new(days: impl IntoIterator<Item = DayOfWeek>) -> Self {
        let mut value = Self::default();
        for day in days {
            if !value.days.contains(&day) {
                value.days.push(day);
            }
        }

        value
    }

    pub fn days(&self) -> &[DayOfWeek] {
        &self.days
    }

    pub fn contains(&self, day: DayOfWeek) -> bool {
        self.days.contains(&day)
    }

    /// Adds a day. Returns `false` if it was already present.
    pub fn add(&mut self, day: DayOfWeek) -> bool {
        if self.days.contains(&day) {
            return false;
        }

        self.days.push(day);
        self.changed();

        true
    }

    /// Removes a day. Returns `false` if it was not present.
    pub fn remove(&mut self, day: DayOfWeek) -> bool {
        let Some(position) = self.days.iter().position(|present| *present == day) else {
            return false;
        };

        self.days.remove(position);
        self.changed();

        true
    }
}

impl ComplexProperty for DaysOfWeek {
    fn tracking(&self) -> &ChangeTracking {
        &self.tracking
    }

    fn try_read_element_from_xml<R: BufRead>(
        &mut self,
        _reader: &mut XmlReader<R>,
        _context: &ServiceContext,
    ) -> Result<bool, Error> {
        Ok(false)
    }

    fn write_elements_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        _context: &ServiceContext,
    ) -> Result<(), Error> {
        let days = self
            .days
            .iter()
            .map(|day| day.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        writer.write_value(days.as_str())?;

        Ok(())
    }

    fn load_from_xml<R: BufRead>(
        &mut self,
        reader: &mut XmlReader<R>,
        _context: &ServiceContext,
    ) -> Result<(), Error> {
        let text = reader.read_element_text()?;

        let mut days = Vec::new();
        for day in text.split_whitespace() {
            let day = DayOfWeek::from_xml_text(day).map_err(|err| Error::Parse {
                element: "DaysOfWeek".to_string(),
                value: text.clone(),
                expected: err.expected,
            })?;
            if !days.contains(&day) {
                days.push(day);
            }
        }
        self.days = days;

        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// How often a recurring item occurs.
#[derive(Clone, Debug, PartialEq)]
pub enum RecurrencePattern {
    /// Every `interval` days.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/dailyrecurrence>
    Daily { interval: u32 },

    /// Every `interval` weeks, on the given days.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/weeklyrecurrence>
    Weekly {
        interval: u32,
        days_of_week: DaysOfWeek,
    },
}

impl RecurrencePattern {
    fn element_name(&self) -> &'static str {
        match self {
            RecurrencePattern::Daily { .. } => "DailyRecurrence",
            RecurrencePattern::Weekly { .. } => "WeeklyRecurrence",
        }
    }

    fn read_from_xml<R: BufRead>(
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
        weekly: bool,
    ) -> Result<Self, Error> {
        let mut interval = 1;
        let mut days_of_week = DaysOfWeek::default();

        let depth = reader.depth();
        while reader.read_child_start(depth)? {
            match reader.local_name() {
                "Interval" => interval = reader.read_element_value()?,
                "DaysOfWeek" if weekly => days_of_week.load_from_xml(reader, context)?,
                _ => skip_unknown_element(reader, context)?,
            }
        }

        Ok(if weekly {
            RecurrencePattern::Weekly {
                interval,
                days_of_week,
            }
        } else {
            RecurrencePattern::Daily { interval }
        })
    }

    fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        let types = context.namespaces.get(XmlNamespace::Types);

        writer.write_start_element(types, self.element_name())?;
        match self {
            RecurrencePattern::Daily { interval } => {
                writer.write_element_value(types, "Interval", interval)?;
            }
            RecurrencePattern::Weekly {
                interval,
                days_of_week,
            } => {
                writer.write_element_value(types, "Interval", interval)?;
                days_of_week.write_to_xml(writer, XmlNamespace::Types, "DaysOfWeek", context)?;
            }
        }
        writer.write_end_element()?;

        Ok(())
    }
}

/// When a recurrence starts and ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecurrenceRange {
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/noendrecurrence>
    NoEnd { start_date: Date },

    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/numberedrecurrence>
    Numbered {
        start_date: Date,
        number_of_occurrences: u32,
    },
}

impl RecurrenceRange {
    pub fn start_date(&self) -> Date {
        match self {
            RecurrenceRange::NoEnd { start_date }
            | RecurrenceRange::Numbered { start_date, .. } => *start_date,
        }
    }

    fn read_from_xml<R: BufRead>(
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
        numbered: bool,
    ) -> Result<Self, Error> {
        let mut start_date = None;
        let mut number_of_occurrences = None;

        let depth = reader.depth();
        while reader.read_child_start(depth)? {
            match reader.local_name() {
                "StartDate" => start_date = Some(read_date(reader)?),
                "NumberOfOccurrences" if numbered => {
                    number_of_occurrences = Some(reader.read_element_value()?)
                }
                _ => skip_unknown_element(reader, context)?,
            }
        }

        let start_date = start_date.ok_or_else(|| Error::Parse {
            element: "StartDate".to_string(),
            value: String::new(),
            expected: "date",
        })?;

        Ok(match number_of_occurrences {
            Some(number_of_occurrences) => RecurrenceRange::Numbered {
                start_date,
                number_of_occurrences,
            },
            None => RecurrenceRange::NoEnd { start_date },
        })
    }

    fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        let types = context.namespaces.get(XmlNamespace::Types);

        match self {
            RecurrenceRange::NoEnd { start_date } => {
                writer.write_start_element(types, "NoEndRecurrence")?;
                writer.write_element_value(types, "StartDate", format_date(*start_date).as_str())?;
            }
            RecurrenceRange::Numbered {
                start_date,
                number_of_occurrences,
            } => {
                writer.write_start_element(types, "NumberedRecurrence")?;
                writer.write_element_value(types, "StartDate", format_date(*start_date).as_str())?;
                writer.write_element_value(types, "NumberOfOccurrences", number_of_occurrences)?;
            }
        }
        writer.write_end_element()?;

        Ok(())
    }
}

/// Reads a date, ignoring any time zone suffix following it.
fn read_date<R: BufRead>(reader: &mut XmlReader<R>) -> Result<Date, Error> {
    let text = reader.read_element_text()?;
    let date = text
        .trim()
        .get(..10)
        .and_then(|date| Date::parse(date, format_description!("[year]-[month]-[day]")).ok());

    date.ok_or(Error::Parse {
        element: "StartDate".to_string(),
        value: text,
        expected: "date",
    })
}

fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// The recurrence of a calendar item.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/recurrence-recurrencetype>
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Recurrence {
    pattern: Option<RecurrencePattern>,
    range: Option<RecurrenceRange>,
    tracking: ChangeTracking,
}

impl Recurrence {
    pub fn new(pattern: RecurrencePattern, range: RecurrenceRange) -> Self {
        Self {
            pattern: Some(pattern),
            range: Some(range),
            ..Default::default()
        }
    }

    pub fn daily(interval: u32, range: RecurrenceRange) -> Self {
        Self::new(RecurrencePattern::Daily { interval }, range)
    }

    pub fn weekly(
        interval: u32,
        days: impl IntoIterator<Item = DayOfWeek>,
        range: RecurrenceRange,
    ) -> Self {
        Self::new(
            RecurrencePattern::Weekly {
                interval,
                days_of_week: DaysOfWeek::new(days),
            },
            range,
        )
    }

    pub fn pattern(&self) -> Option<&RecurrencePattern> {
        self.pattern.as_ref()
    }

    pub fn range(&self) -> Option<&RecurrenceRange> {
        self.range.as_ref()
    }

    pub fn set_pattern(&mut self, pattern: RecurrencePattern) {
        self.pattern = Some(pattern);
        self.changed();
    }

    pub fn set_range(&mut self, range: RecurrenceRange) {
        self.range = Some(range);
        self.changed();
    }

    /// The days of a weekly pattern, for editing in place.
    ///
    /// Changes made through the returned value are reported to this
    /// recurrence and, through it, to the item holding it.
    pub fn days_of_week_mut(&mut self) -> Option<&mut DaysOfWeek> {
        match &mut self.pattern {
            Some(RecurrencePattern::Weekly { days_of_week, .. }) => {
                days_of_week.tracking().attach_to_parent(&self.tracking);
                Some(days_of_week)
            }
            _ => None,
        }
    }
}

impl ComplexProperty for Recurrence {
    fn tracking(&self) -> &ChangeTracking {
        &self.tracking
    }

    fn try_read_element_from_xml<R: BufRead>(
        &mut self,
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<bool, Error> {
        match reader.local_name() {
            "DailyRecurrence" => {
                self.pattern = Some(RecurrencePattern::read_from_xml(reader, context, false)?);
            }
            "WeeklyRecurrence" => {
                self.pattern = Some(RecurrencePattern::read_from_xml(reader, context, true)?);
            }
            "NoEndRecurrence" => {
                self.range = Some(RecurrenceRange::read_from_xml(reader, context, false)?);
            }
            "NumberedRecurrence" => {
                self.range = Some(RecurrenceRange::read_from_xml(reader, context, true)?);
            }
            _ => return Ok(false),
        }

        Ok(true)
    }

    fn write_elements_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        if let Some(pattern) = &self.pattern {
            pattern.write_to_xml(writer, context)?;
        }
        if let Some(range) = &self.range {
            range.write_to_xml(writer, context)?;
        }

        Ok(())
    }

    fn clear_change_log(&mut self) {
        if let Some(RecurrencePattern::Weekly { days_of_week, .. }) = &mut self.pattern {
            days_of_week.clear_change_log();
        }
        self.tracking.clear();
    }

    fn is_empty(&self) -> bool {
        self.pattern.is_none() && self.range.is_none()
    }
}
