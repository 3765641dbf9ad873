/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Properties of appointments and meetings.
//!
//! See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/calendaritem>

use std::sync::LazyLock;

use crate::{
    EntitySchema, ExchangeServerVersion, LegacyFreeBusyStatus, PropertyDefinition, PropertyFlags,
    PropertyKind,
};

use super::{item::ITEM_SCHEMA, new_recipient, new_recurrence};

pub static START: PropertyDefinition =
    PropertyDefinition::new("Start", "calendar:Start", PropertyKind::DateTime);

pub static END: PropertyDefinition =
    PropertyDefinition::new("End", "calendar:End", PropertyKind::DateTime);

pub static IS_ALL_DAY_EVENT: PropertyDefinition = PropertyDefinition::new(
    "IsAllDayEvent",
    "calendar:IsAllDayEvent",
    PropertyKind::Boolean,
);

pub static LEGACY_FREE_BUSY_STATUS: PropertyDefinition = PropertyDefinition::new(
    "LegacyFreeBusyStatus",
    "calendar:LegacyFreeBusyStatus",
    LegacyFreeBusyStatus::KIND,
);

pub static LOCATION: PropertyDefinition =
    PropertyDefinition::new("Location", "calendar:Location", PropertyKind::String);

pub static ORGANIZER: PropertyDefinition = PropertyDefinition::new(
    "Organizer",
    "calendar:Organizer",
    PropertyKind::Complex(new_recipient),
)
.with_flags(PropertyFlags::READ_ONLY);

pub static RECURRENCE: PropertyDefinition = PropertyDefinition::new(
    "Recurrence",
    "calendar:Recurrence",
    PropertyKind::Complex(new_recurrence),
)
.with_flags(
    PropertyFlags::CAN_SET
        .union(PropertyFlags::CAN_UPDATE)
        .union(PropertyFlags::CAN_DELETE),
);

pub static START_TIME_ZONE_ID: PropertyDefinition = PropertyDefinition::new(
    "StartTimeZoneId",
    "calendar:StartTimeZoneId",
    PropertyKind::String,
)
.with_version(ExchangeServerVersion::Exchange2010);

pub static CALENDAR_ITEM_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::builder("CalendarItem")
        .extends(&ITEM_SCHEMA)
        .properties([
            &START,
            &END,
            &IS_ALL_DAY_EVENT,
            &LEGACY_FREE_BUSY_STATUS,
            &LOCATION,
            &ORGANIZER,
            &RECURRENCE,
            &START_TIME_ZONE_ID,
        ])
        .build()
        .expect("calendar item schema should not declare a property twice")
});
