//! Value rewrites applied to both sides before comparison.

use serde_json::Value;

use crate::Options;

pub(crate) fn normalize(value: &mut Value, options: &Options) {
	for pointer in &options.ignore_fields {
		remove_pointer(value, pointer);
	}
	if options.sort_lists_by_name {
		sort_lists_by_name(value);
	}
	if options.equate_empty {
		drop_empty(value);
	}
}

/// Remove the value at a JSON pointer. Missing paths and pointers without a
/// leading `/` are ignored.
pub(crate) fn remove_pointer(value: &mut Value, pointer: &str) {
	if !pointer.starts_with('/') {
		return;
	}
	let Some((parent, last)) = pointer.rsplit_once('/') else {
		return;
	};
	let Some(parent) = value.pointer_mut(parent) else {
		return;
	};
	let last = last.replace("~1", "/").replace("~0", "~");
	match parent {
		Value::Object(map) => {
			map.shift_remove(&last);
		}
		Value::Array(items) => {
			if let Ok(index) = last.parse::<usize>() {
				if index < items.len() {
					items.remove(index);
				}
			}
		}
		_ => {}
	}
}

fn name_of(value: &Value) -> Option<&str> {
	value.get("name").and_then(Value::as_str)
}

/// Sort every array whose elements all carry a string `name`.
pub(crate) fn sort_lists_by_name(value: &mut Value) {
	match value {
		Value::Object(map) => map.values_mut().for_each(sort_lists_by_name),
		Value::Array(items) => {
			items.iter_mut().for_each(sort_lists_by_name);
			if !items.is_empty() && items.iter().all(|item| name_of(item).is_some()) {
				items.sort_by(|a, b| name_of(a).cmp(&name_of(b)));
			}
		}
		_ => {}
	}
}

fn is_empty(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::Object(map) => map.is_empty(),
		Value::Array(items) => items.is_empty(),
		_ => false,
	}
}

/// Remove null, empty object and empty array fields, bottom-up.
pub(crate) fn drop_empty(value: &mut Value) {
	match value {
		Value::Object(map) => {
			map.values_mut().for_each(drop_empty);
			map.retain(|_, v| !is_empty(v));
		}
		Value::Array(items) => items.iter_mut().for_each(drop_empty),
		_ => {}
	}
}
