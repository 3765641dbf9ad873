/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Properties of contacts.
//!
//! See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/contact>

use std::sync::LazyLock;

use crate::{EntitySchema, PropertyDefinition, PropertyFlags, PropertyKind};

use super::{item::ITEM_SCHEMA, new_email_address_dictionary};

pub static DISPLAY_NAME: PropertyDefinition =
    PropertyDefinition::new("DisplayName", "contacts:DisplayName", PropertyKind::String);

pub static GIVEN_NAME: PropertyDefinition =
    PropertyDefinition::new("GivenName", "contacts:GivenName", PropertyKind::String);

pub static COMPANY_NAME: PropertyDefinition =
    PropertyDefinition::new("CompanyName", "contacts:CompanyName", PropertyKind::String);

/// The e-mail addresses of a contact, updated one key at a time.
pub static EMAIL_ADDRESSES: PropertyDefinition = PropertyDefinition::new(
    "EmailAddresses",
    "contacts:EmailAddress",
    PropertyKind::Collection(new_email_address_dictionary),
)
.with_flags(
    PropertyFlags::DEFAULT
        .union(PropertyFlags::INDEXED)
        .union(PropertyFlags::AUTO_INSTANTIATE_ON_READ)
        .union(PropertyFlags::REUSE_INSTANCE),
);

pub static SURNAME: PropertyDefinition =
    PropertyDefinition::new("Surname", "contacts:Surname", PropertyKind::String);

pub static CONTACT_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::builder("Contact")
        .extends(&ITEM_SCHEMA)
        .properties([
            &DISPLAY_NAME,
            &GIVEN_NAME,
            &COMPANY_NAME,
            &EMAIL_ADDRESSES,
            &SURNAME,
        ])
        .build()
        .expect("contact schema should not declare a property twice")
});
