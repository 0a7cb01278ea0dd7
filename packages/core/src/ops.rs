//! Path-addressed operations on a [`Value`] tree.
//!
//! These are the only mutation primitives the form store uses, so all
//! intermediate-container rules live here: a missing intermediate becomes an
//! array when the next segment is an index and a map otherwise, an existing
//! non-container in the way is overwritten with a fresh container, and
//! deletes splice arrays instead of leaving holes. None of these operations
//! fail; an empty path is a no-op for set/delete.

use std::collections::BTreeMap;

use reform_path::{Path, Segment};

use crate::value::Value;

/// Get a reference to the value at `path`, if every segment resolves.
pub fn get_in<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    root.get(path)
}

/// Get a mutable reference to the value at `path`, if every segment resolves.
pub fn get_in_mut<'a>(root: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in path.iter() {
        current = match (current, segment) {
            (Value::Map(map), Segment::Key(k)) => map.get_mut(k)?,
            (Value::Array(arr), Segment::Index(i)) => arr.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Set `value` at `path`, creating intermediate containers as needed.
///
/// An empty path is a no-op. Arrays are padded with `Null` when the index
/// is past the end. A primitive sitting where a container is required is
/// replaced by a fresh container.
pub fn set_in(root: &mut Value, path: &Path, value: Value) {
    if path.is_empty() {
        return;
    }

    let mut current = root;
    for (i, segment) in path.iter().enumerate() {
        let last = i + 1 == path.len();
        match segment {
            Segment::Key(k) => {
                if !current.is_map() {
                    *current = Value::Map(BTreeMap::new());
                }
                let Value::Map(map) = current else { unreachable!() };
                if last {
                    map.insert(k.clone(), value);
                    return;
                }
                current = map
                    .entry(k.clone())
                    .or_insert_with(|| empty_container(&path[i + 1]));
            }
            Segment::Index(idx) => {
                if !current.is_array() {
                    *current = Value::Array(Vec::new());
                }
                let Value::Array(arr) = current else { unreachable!() };
                if arr.len() <= *idx {
                    arr.resize(*idx + 1, Value::Null);
                }
                if last {
                    arr[*idx] = value;
                    return;
                }
                current = &mut arr[*idx];
            }
        }
    }
}

/// Delete the value at `path`.
///
/// Array elements are spliced out (later elements shift down); map keys are
/// removed. Resolving through a missing or non-container intermediate is a
/// no-op, as is the empty path.
pub fn delete_in(root: &mut Value, path: &Path) {
    if path.is_empty() {
        return;
    }
    let Some(parent) = get_in_mut(root, &path.parent()) else {
        return;
    };
    match (parent, path.basename()) {
        (Value::Map(map), Some(Segment::Key(k))) => {
            map.remove(k);
        }
        (Value::Array(arr), Some(Segment::Index(i))) => {
            if *i < arr.len() {
                arr.remove(*i);
            }
        }
        _ => {}
    }
}

/// Check that every segment of `path` is present.
///
/// For maps this is a key-presence check, so a key holding `Null` still
/// exists; for arrays it is a bounds check. The empty path always exists.
pub fn exists_in(root: &Value, path: &Path) -> bool {
    let mut current = root;
    for segment in path.iter() {
        current = match (current, segment) {
            (Value::Map(map), Segment::Key(k)) => match map.get(k) {
                Some(v) => v,
                None => return false,
            },
            (Value::Array(arr), Segment::Index(i)) => match arr.get(*i) {
                Some(v) => v,
                None => return false,
            },
            _ => return false,
        };
    }
    true
}

fn empty_container(next: &Segment) -> Value {
    match next {
        Segment::Key(_) => Value::map(),
        Segment::Index(_) => Value::array(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reform_path::path;

    #[test]
    fn set_creates_map_intermediates() {
        let mut root = Value::map();
        set_in(&mut root, &path!("a.b.c"), Value::Integer(1));
        assert_eq!(get_in(&root, &path!("a.b.c")), Some(&Value::Integer(1)));
        assert!(get_in(&root, &path!("a.b")).unwrap().is_map());
    }

    #[test]
    fn set_creates_array_intermediates() {
        let mut root = Value::map();
        set_in(&mut root, &path!("items[1].sku"), Value::from("x"));
        let items = get_in(&root, &path!("items")).unwrap();
        assert!(items.is_array());
        // Index 0 padded with null.
        assert_eq!(get_in(&root, &path!("items[0]")), Some(&Value::Null));
        assert_eq!(get_in(&root, &path!("items[1].sku")), Some(&Value::from("x")));
    }

    #[test]
    fn set_get_roundtrip_on_fresh_tree() {
        for p in ["a", "a.b", "a[0]", "a[2].b.c[1]", "x.y[0][1].z"] {
            let mut root = Value::map();
            let path = path!(p);
            set_in(&mut root, &path, Value::Integer(7));
            assert_eq!(
                get_in(&root, &path),
                Some(&Value::Integer(7)),
                "path {:?}",
                p
            );
        }
    }

    #[test]
    fn set_overwrites_primitive_in_the_way() {
        let mut root = Value::map();
        set_in(&mut root, &path!("a"), Value::from("scalar"));
        set_in(&mut root, &path!("a.b"), Value::Integer(2));
        assert_eq!(get_in(&root, &path!("a.b")), Some(&Value::Integer(2)));
    }

    #[test]
    fn set_overwrites_wrong_container_kind() {
        let mut root = Value::map();
        set_in(&mut root, &path!("a.b"), Value::Integer(1));
        // `a` is a map; an index write through it replaces it with an array.
        set_in(&mut root, &path!("a[0]"), Value::Integer(2));
        assert!(get_in(&root, &path!("a")).unwrap().is_array());
        assert_eq!(get_in(&root, &path!("a[0]")), Some(&Value::Integer(2)));
        assert_eq!(get_in(&root, &path!("a.b")), None);
    }

    #[test]
    fn set_empty_path_is_noop() {
        let mut root = Value::from(serde_json::json!({"keep": true}));
        let before = root.clone();
        set_in(&mut root, &path!(""), Value::Integer(9));
        assert_eq!(root, before);
    }

    #[test]
    fn set_array_pads_with_null() {
        let mut root = Value::map();
        set_in(&mut root, &path!("a[3]"), Value::Integer(1));
        let Value::Array(arr) = get_in(&root, &path!("a")).unwrap() else {
            panic!("expected array");
        };
        assert_eq!(arr.len(), 4);
        assert_eq!(arr[0], Value::Null);
    }

    #[test]
    fn delete_map_key() {
        let mut root = Value::from(serde_json::json!({"a": {"b": 1, "c": 2}}));
        delete_in(&mut root, &path!("a.b"));
        assert_eq!(get_in(&root, &path!("a.b")), None);
        assert_eq!(get_in(&root, &path!("a.c")), Some(&Value::Integer(2)));
    }

    #[test]
    fn delete_splices_array() {
        let mut root = Value::from(serde_json::json!({"a": [1, 2, 3]}));
        delete_in(&mut root, &path!("a[1]"));
        assert_eq!(
            get_in(&root, &path!("a")),
            Some(&Value::from(vec![1i64, 3]))
        );
    }

    #[test]
    fn delete_through_nullish_is_noop() {
        let mut root = Value::from(serde_json::json!({"a": null}));
        let before = root.clone();
        delete_in(&mut root, &path!("a.b.c"));
        delete_in(&mut root, &path!("missing.x"));
        delete_in(&mut root, &path!(""));
        assert_eq!(root, before);
    }

    #[test]
    fn delete_out_of_bounds_is_noop() {
        let mut root = Value::from(serde_json::json!({"a": [1]}));
        delete_in(&mut root, &path!("a[5]"));
        assert_eq!(get_in(&root, &path!("a")), Some(&Value::from(vec![1i64])));
    }

    #[test]
    fn exists_distinguishes_null_from_absent() {
        let root = Value::from(serde_json::json!({"a": null, "arr": [null]}));
        assert!(exists_in(&root, &path!("a")));
        assert!(!exists_in(&root, &path!("b")));
        assert!(exists_in(&root, &path!("arr[0]")));
        assert!(!exists_in(&root, &path!("arr[1]")));
        assert!(exists_in(&root, &path!("")));
    }

    #[test]
    fn exists_through_primitive_is_false() {
        let root = Value::from(serde_json::json!({"a": 1}));
        assert!(!exists_in(&root, &path!("a.b")));
    }

    #[test]
    fn get_in_mut_allows_in_place_edit() {
        let mut root = Value::from(serde_json::json!({"a": {"b": 1}}));
        *get_in_mut(&mut root, &path!("a.b")).unwrap() = Value::Integer(5);
        assert_eq!(get_in(&root, &path!("a.b")), Some(&Value::Integer(5)));
        assert!(get_in_mut(&mut root, &path!("a.missing")).is_none());
    }
}
