/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Properties common to all items.
//!
//! See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/item>

use std::sync::LazyLock;

use crate::{
    EntitySchema, ExchangeServerVersion, Importance, PropertyDefinition, PropertyFlags,
    PropertyKind, Sensitivity,
};

use super::{new_body, new_internet_message_headers, new_service_id, new_string_list};

const SET_UPDATE_FIND: PropertyFlags = PropertyFlags::CAN_SET
    .union(PropertyFlags::CAN_UPDATE)
    .union(PropertyFlags::CAN_FIND);

pub static ITEM_ID: PropertyDefinition =
    PropertyDefinition::new("ItemId", "item:ItemId", PropertyKind::Complex(new_service_id))
        .with_flags(PropertyFlags::READ_ONLY);

pub static PARENT_FOLDER_ID: PropertyDefinition = PropertyDefinition::new(
    "ParentFolderId",
    "item:ParentFolderId",
    PropertyKind::Complex(new_service_id),
)
.with_flags(PropertyFlags::READ_ONLY);

pub static ITEM_CLASS: PropertyDefinition =
    PropertyDefinition::new("ItemClass", "item:ItemClass", PropertyKind::String)
        .with_flags(SET_UPDATE_FIND);

pub static SUBJECT: PropertyDefinition =
    PropertyDefinition::new("Subject", "item:Subject", PropertyKind::String);

pub static SENSITIVITY: PropertyDefinition =
    PropertyDefinition::new("Sensitivity", "item:Sensitivity", Sensitivity::KIND)
        .with_flags(SET_UPDATE_FIND);

pub static BODY: PropertyDefinition =
    PropertyDefinition::new("Body", "item:Body", PropertyKind::Complex(new_body)).with_flags(
        PropertyFlags::CAN_SET
            .union(PropertyFlags::CAN_UPDATE)
            .union(PropertyFlags::CAN_DELETE),
    );

pub static DATE_TIME_RECEIVED: PropertyDefinition = PropertyDefinition::new(
    "DateTimeReceived",
    "item:DateTimeReceived",
    PropertyKind::DateTime,
)
.with_flags(PropertyFlags::READ_ONLY);

pub static SIZE: PropertyDefinition =
    PropertyDefinition::new("Size", "item:Size", PropertyKind::Integer)
        .with_flags(PropertyFlags::READ_ONLY);

pub static CATEGORIES: PropertyDefinition = PropertyDefinition::new(
    "Categories",
    "item:Categories",
    PropertyKind::Collection(new_string_list),
)
.with_flags(
    PropertyFlags::DEFAULT
        .union(PropertyFlags::CAN_APPEND)
        .union(PropertyFlags::AUTO_INSTANTIATE_ON_READ)
        .union(PropertyFlags::REUSE_INSTANCE),
);

pub static IMPORTANCE: PropertyDefinition =
    PropertyDefinition::new("Importance", "item:Importance", Importance::KIND)
        .with_flags(SET_UPDATE_FIND);

pub static IN_REPLY_TO: PropertyDefinition =
    PropertyDefinition::new("InReplyTo", "item:InReplyTo", PropertyKind::String);

pub static IS_DRAFT: PropertyDefinition =
    PropertyDefinition::new("IsDraft", "item:IsDraft", PropertyKind::Boolean)
        .with_flags(PropertyFlags::READ_ONLY);

pub static INTERNET_MESSAGE_HEADERS: PropertyDefinition = PropertyDefinition::new(
    "InternetMessageHeaders",
    "item:InternetMessageHeaders",
    PropertyKind::Collection(new_internet_message_headers),
)
.with_flags(
    PropertyFlags::READ_ONLY
        .union(PropertyFlags::MUST_BE_EXPLICITLY_LOADED)
        .union(PropertyFlags::REUSE_INSTANCE),
);

pub static CULTURE: PropertyDefinition =
    PropertyDefinition::new("Culture", "item:Culture", PropertyKind::String)
        .with_version(ExchangeServerVersion::Exchange2010);

pub static ITEM_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::builder("Item")
        .properties([
            &ITEM_ID,
            &PARENT_FOLDER_ID,
            &ITEM_CLASS,
            &SUBJECT,
            &SENSITIVITY,
            &BODY,
            &DATE_TIME_RECEIVED,
            &SIZE,
            &CATEGORIES,
            &IMPORTANCE,
            &IN_REPLY_TO,
            &IS_DRAFT,
            &INTERNET_MESSAGE_HEADERS,
            &CULTURE,
        ])
        .build()
        .expect("item schema should not declare a property twice")
});
