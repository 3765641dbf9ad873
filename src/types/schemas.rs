/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The built-in entity schemas and their property definitions.
//!
//! Definitions are listed in the order of the EWS XML schema, which the
//! server enforces when validating requests.

pub mod calendar_item;
pub mod contact;
pub mod folder;
pub mod item;
pub mod message;

pub use calendar_item::CALENDAR_ITEM_SCHEMA;
pub use contact::CONTACT_SCHEMA;
pub use folder::FOLDER_SCHEMA;
pub use item::ITEM_SCHEMA;
pub use message::MESSAGE_SCHEMA;

use crate::{
    Body, ComplexValue, EmailAddressCollection, EmailAddressDictionary,
    InternetMessageHeaderCollection, Recipient, Recurrence, ServiceId, StringList,
};

fn new_service_id() -> ComplexValue {
    ServiceId::default().into()
}

fn new_body() -> ComplexValue {
    Body::default().into()
}

fn new_recipient() -> ComplexValue {
    Recipient::default().into()
}

fn new_recurrence() -> ComplexValue {
    Recurrence::default().into()
}

fn new_string_list() -> ComplexValue {
    StringList::new().into()
}

fn new_email_addresses() -> ComplexValue {
    EmailAddressCollection::new().into()
}

fn new_internet_message_headers() -> ComplexValue {
    InternetMessageHeaderCollection::new().into()
}

fn new_email_address_dictionary() -> ComplexValue {
    EmailAddressDictionary::new().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PropertyFlags, PropertyKind};

    #[test]
    fn built_in_schemas_are_valid() {
        for schema in [
            &*ITEM_SCHEMA,
            &*MESSAGE_SCHEMA,
            &*CALENDAR_ITEM_SCHEMA,
            &*CONTACT_SCHEMA,
            &*FOLDER_SCHEMA,
        ] {
            assert!(!schema.is_empty(), "schema `{}` is empty", schema.name());

            for definition in schema.definitions() {
                if definition.has_flag(PropertyFlags::CAN_APPEND)
                    || definition.has_flag(PropertyFlags::INDEXED)
                {
                    assert!(
                        matches!(definition.kind, PropertyKind::Collection(_)),
                        "`{}` is flagged as a collection but is not one",
                        definition.uri
                    );
                }
            }
        }
    }

    #[test]
    fn derived_schemas_start_with_item_properties() {
        let item = ITEM_SCHEMA.definitions();

        for schema in [&*MESSAGE_SCHEMA, &*CALENDAR_ITEM_SCHEMA, &*CONTACT_SCHEMA] {
            assert_eq!(
                &schema.definitions()[..item.len()],
                item,
                "schema `{}` should extend the item schema",
                schema.name()
            );
        }
    }
}
