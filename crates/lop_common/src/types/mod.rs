pub mod descriptors;
pub mod entry_point;
pub mod idx;
pub mod import_record;
pub mod module_id;
pub mod module_info;
pub mod module_meta;
pub mod options;
pub mod phase;
pub mod resolved_id;
pub mod side_effects;
pub mod source;
pub mod source_joiner;
pub mod span;
pub mod specifier;
pub mod synthetic_named_exports;
pub mod variable_ref;
