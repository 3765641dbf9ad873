/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Properties common to all folders.
//!
//! See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/folder>

use std::sync::LazyLock;

use crate::{EntitySchema, PropertyDefinition, PropertyFlags, PropertyKind};

use super::new_service_id;

pub static FOLDER_ID: PropertyDefinition =
    PropertyDefinition::new("FolderId", "folder:FolderId", PropertyKind::Complex(new_service_id))
        .with_flags(PropertyFlags::READ_ONLY);

pub static PARENT_FOLDER_ID: PropertyDefinition = PropertyDefinition::new(
    "ParentFolderId",
    "folder:ParentFolderId",
    PropertyKind::Complex(new_service_id),
)
.with_flags(PropertyFlags::READ_ONLY);

pub static FOLDER_CLASS: PropertyDefinition =
    PropertyDefinition::new("FolderClass", "folder:FolderClass", PropertyKind::String);

pub static DISPLAY_NAME: PropertyDefinition =
    PropertyDefinition::new("DisplayName", "folder:DisplayName", PropertyKind::String);

pub static TOTAL_COUNT: PropertyDefinition =
    PropertyDefinition::new("TotalCount", "folder:TotalCount", PropertyKind::Integer)
        .with_flags(PropertyFlags::READ_ONLY);

pub static CHILD_FOLDER_COUNT: PropertyDefinition = PropertyDefinition::new(
    "ChildFolderCount",
    "folder:ChildFolderCount",
    PropertyKind::Integer,
)
.with_flags(PropertyFlags::READ_ONLY);

pub static UNREAD_COUNT: PropertyDefinition =
    PropertyDefinition::new("UnreadCount", "folder:UnreadCount", PropertyKind::Integer)
        .with_flags(PropertyFlags::READ_ONLY);

pub static FOLDER_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
    EntitySchema::builder("Folder")
        .properties([
            &FOLDER_ID,
            &PARENT_FOLDER_ID,
            &FOLDER_CLASS,
            &DISPLAY_NAME,
            &TOTAL_COUNT,
            &CHILD_FOLDER_COUNT,
            &UNREAD_COUNT,
        ])
        .build()
        .expect("folder schema should not declare a property twice")
});
