//! XML utilities.

mod utils;

pub use utils::{
    descendants_named, find_by_path, find_child, find_descendant, first_element_child,
    get_tag_name, has_attribute, node_value,
};
