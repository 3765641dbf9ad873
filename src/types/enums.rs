/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Enumerations whose values are exchanged as text.

use std::borrow::Cow;

use ews_xml::{FromXmlText, InvalidValue, ToXmlText};
use strum::{Display, EnumString, IntoStaticStr, VariantNames};

use crate::{PropertyKind, PropertyValue};

/// Implements text conversion and property value conversion for an
/// enumeration deriving `strum`'s `EnumString`, `IntoStaticStr` and
/// `VariantNames`.
macro_rules! wire_enum {
    ($( $ty:ident ),* $(,)?) => {
        $(
        impl $ty {
            /// The property kind of a property holding this enumeration.
            pub const KIND: PropertyKind = PropertyKind::Enum {
                name: stringify!($ty),
                variants: <$ty as VariantNames>::VARIANTS,
            };

            pub fn as_str(self) -> &'static str {
                self.into()
            }
        }

        impl FromXmlText for $ty {
            fn from_xml_text(text: &str) -> Result<Self, InvalidValue> {
                text.trim().parse().map_err(|_| InvalidValue {
                    expected: stringify!($ty),
                })
            }
        }

        impl ToXmlText for $ty {
            fn to_xml_text(&self) -> Cow<'_, str> {
                Cow::Borrowed(self.as_str())
            }
        }

        impl From<$ty> for PropertyValue {
            fn from(value: $ty) -> Self {
                PropertyValue::Enum(value.as_str())
            }
        }
        )*
    };
}

wire_enum!(
    Importance,
    Sensitivity,
    BodyType,
    MailboxType,
    LegacyFreeBusyStatus,
    DayOfWeek,
    EmailAddressKey,
    BaseShape,
    MessageDisposition,
    ConflictResolution,
);

/// The importance of an item.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/importance>
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, IntoStaticStr, VariantNames,
)]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

/// The sensitivity of an item.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/sensitivity>
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, IntoStaticStr, VariantNames,
)]
pub enum Sensitivity {
    #[default]
    Normal,
    Personal,
    Private,
    Confidential,
}

/// The format of an item body.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/body>
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, IntoStaticStr, VariantNames,
)]
pub enum BodyType {
    #[strum(serialize = "HTML")]
    Html,

    #[default]
    Text,
}

/// The type of a mailbox.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/mailboxtype>
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, IntoStaticStr, VariantNames,
)]
pub enum MailboxType {
    #[default]
    Unknown,
    OneOff,
    Mailbox,
    #[strum(serialize = "PublicDL")]
    PublicDl,
    #[strum(serialize = "PrivateDL")]
    PrivateDl,
    Contact,
    PublicFolder,
    GroupMailbox,
    ImplicitContact,
    User,
}

/// The free/busy status of a calendar item.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/legacyfreebusystatus>
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, IntoStaticStr, VariantNames,
)]
pub enum LegacyFreeBusyStatus {
    Free,
    Tentative,
    #[default]
    Busy,
    #[strum(serialize = "OOF")]
    Oof,
    NoData,
    WorkingElsewhere,
}

/// A day of the week, or a group of days, in a recurrence pattern.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/daysofweek>
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, VariantNames,
)]
pub enum DayOfWeek {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Day,
    Weekday,
    WeekendDay,
}

/// The key of an entry in a contact's email address dictionary.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/entry-emailaddress>
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, VariantNames,
)]
pub enum EmailAddressKey {
    EmailAddress1,
    EmailAddress2,
    EmailAddress3,
}

/// The base set of properties returned for an entity.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/baseshape>
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, IntoStaticStr, VariantNames,
)]
pub enum BaseShape {
    #[default]
    IdOnly,
    Default,
    AllProperties,
}

/// The action the server takes when creating or updating a message.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/createitem#messagedisposition-attribute>
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, IntoStaticStr, VariantNames,
)]
pub enum MessageDisposition {
    SaveOnly,
    SendOnly,
    SendAndSaveCopy,
}

/// The method used by the Exchange server to resolve conflicts between item
/// updates.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/updateitem#conflictresolution-attribute>
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, IntoStaticStr, VariantNames,
)]
pub enum ConflictResolution {
    /// Conflicts will cause the update to fail and return an error.
    NeverOverwrite,

    /// The Exchange server will attempt to resolve any conflicts automatically.
    #[default]
    AutoResolve,

    /// Conflicting fields will be overwritten with the contents of the update.
    AlwaysOverwrite,
}
