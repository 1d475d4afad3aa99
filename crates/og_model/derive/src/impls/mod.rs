// -----------------------------------------------------------------------------
// Modules

mod auto_register;
mod enum_kind;
mod struct_kind;

// -----------------------------------------------------------------------------
// Internal API

use auto_register::get_auto_register_impl;

pub(crate) use enum_kind::impl_enum;
pub(crate) use struct_kind::impl_struct;
