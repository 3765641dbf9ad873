/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

mod collection;
mod complex;
mod context;
mod enums;
mod namespaces;
mod operations;
mod property_bag;
mod property_definition;
mod property_set;
mod schema;
mod serializer;
mod server_version;
mod service_object;
mod value;

pub use collection::*;
pub use complex::*;
pub use context::*;
pub use enums::*;
pub use namespaces::*;
pub use operations::*;
pub use property_bag::*;
pub use property_definition::*;
pub use property_set::*;
pub use schema::*;
pub use serializer::WriteMode;
pub use server_version::*;
pub use service_object::*;
pub use value::*;

pub mod response;
pub mod schemas;
pub mod soap;

pub mod create_item;
pub mod get_folder;
pub mod get_item;
pub mod update_folder;
pub mod update_item;
