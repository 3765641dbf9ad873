/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Properties of e-mail messages.
//!
//! See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/message-ex15websvcsotherref>

use std::sync::LazyLock;

use crate::{EntitySchema, ExchangeServerVersion, PropertyDefinition, PropertyFlags, PropertyKind};

use super::{item::ITEM_SCHEMA, new_email_addresses, new_recipient};

const RECIPIENTS: PropertyFlags = PropertyFlags::DEFAULT
    .union(PropertyFlags::CAN_APPEND)
    .union(PropertyFlags::AUTO_INSTANTIATE_ON_READ)
    .union(PropertyFlags::REUSE_INSTANCE);

pub static SENDER: PropertyDefinition =
    PropertyDefinition::new("Sender", "message:Sender", PropertyKind::Complex(new_recipient));

pub static TO_RECIPIENTS: PropertyDefinition = PropertyDefinition::new(
    "ToRecipients",
    "message:ToRecipients",
    PropertyKind::Collection(new_email_addresses),
)
.with_flags(RECIPIENTS);

pub static CC_RECIPIENTS: PropertyDefinition = PropertyDefinition::new(
    "CcRecipients",
    "message:CcRecipients",
    PropertyKind::Collection(new_email_addresses),
)
.with_flags(RECIPIENTS);

pub static BCC_RECIPIENTS: PropertyDefinition = PropertyDefinition::new(
    "BccRecipients",
    "message:BccRecipients",
    PropertyKind::Collection(new_email_addresses),
)
.with_flags(RECIPIENTS);

pub static IS_READ_RECEIPT_REQUESTED: PropertyDefinition = PropertyDefinition::new(
    "IsReadReceiptRequested",
    "message:IsReadReceiptRequested",
    PropertyKind::Boolean,
);

pub static CONVERSATION_INDEX: PropertyDefinition = PropertyDefinition::new(
    "ConversationIndex",
    "message:ConversationIndex",
    PropertyKind::Base64Binary,
)
.with_flags(PropertyFlags::READ_ONLY)
.with_version(ExchangeServerVersion::Exchange2010);

pub static FROM: PropertyDefinition =
    PropertyDefinition::new("From", "message:From", PropertyKind::Complex(new_recipient));

pub static INTERNET_MESSAGE_ID: PropertyDefinition = PropertyDefinition::new(
    "InternetMessageId",
    "message:InternetMessageId",
    PropertyKind::String,
)
.with_flags(PropertyFlags::READ_ONLY);

pub static IS_READ: PropertyDefinition =
    PropertyDefinition::new("IsRead", "message:IsRead", PropertyKind::Boolean).with_flags(
        PropertyFlags::CAN_SET
            .union(PropertyFlags::CAN_UPDATE)
            .union(PropertyFlags::CAN_FIND),
    );

pub static MESSAGE_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::builder("Message")
        .extends(&ITEM_SCHEMA)
        .properties([
            &SENDER,
            &TO_RECIPIENTS,
            &CC_RECIPIENTS,
            &BCC_RECIPIENTS,
            &IS_READ_RECEIPT_REQUESTED,
            &CONVERSATION_INDEX,
            &FROM,
            &INTERNET_MESSAGE_ID,
            &IS_READ,
        ])
        .build()
        .expect("message schema should not declare a property twice")
});
