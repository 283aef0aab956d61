//! The `DeepChainMap` itself: layered source config, a mutable front layer,
//! deferred list operations, and read-through caching of the merged result.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::error::{DcmError, Result};
use crate::ops::{apply_list_ops, ListOp};
use crate::provenance::Provenance;
use crate::value::DcmValue;

/// A layered, deep-merging configuration map.
///
/// Values are contributed by zero or more `source_layers` (lowest priority
/// first) plus one `front_layer` that always wins and is the only layer
/// ever mutated in place. Layers may carry `!delete` tombstones (mask the
/// key in every layer below) and `!replace` wrappers (disable recursive
/// merging for that subtree). List-valued keys additionally accept queued
/// [`ListOp`]s that replay on top of whatever the merged list turns out to
/// be, so a layer can append to a list it never directly owns.
#[derive(Debug, Clone)]
pub struct DeepChainMap {
    source_layers: Vec<DcmValue>,
    front_layer: BTreeMap<String, DcmValue>,
    list_ops: HashMap<Vec<String>, Vec<ListOp>>,
    track_provenance: bool,
    cache: RefCell<Option<(DcmValue, Provenance)>>,
}

impl DeepChainMap {
    pub fn new(track_provenance: bool) -> Self {
        DeepChainMap {
            source_layers: Vec::new(),
            front_layer: BTreeMap::new(),
            list_ops: HashMap::new(),
            track_provenance,
            cache: RefCell::new(None),
        }
    }

    pub fn from_layers(layers: Vec<DcmValue>, track_provenance: bool) -> Result<Self> {
        for layer in &layers {
            require_mapping(layer)?;
        }
        Ok(DeepChainMap {
            source_layers: layers,
            front_layer: BTreeMap::new(),
            list_ops: HashMap::new(),
            track_provenance,
            cache: RefCell::new(None),
        })
    }

    fn invalidate(&self) {
        *self.cache.borrow_mut() = None;
    }

    /// Appends a new highest-priority source layer.
    pub fn add_layer(&mut self, layer: DcmValue) -> Result<()> {
        require_mapping(&layer)?;
        self.source_layers.push(layer);
        self.invalidate();
        Ok(())
    }

    /// Parses `source` as YAML (honoring `!delete`/`!replace`) and adds it
    /// as a new highest-priority source layer.
    pub fn load_yaml_layer(&mut self, source: &str) -> Result<()> {
        let layer = DcmValue::from_yaml_str(source)?;
        self.add_layer(layer)
    }

    pub fn remove_layer(&mut self, index: usize) -> Result<DcmValue> {
        if index >= self.source_layers.len() {
            return Err(DcmError::NotFound(format!("source layer {index}")));
        }
        let removed = self.source_layers.remove(index);
        self.invalidate();
        Ok(removed)
    }

    pub fn reload_layer(&mut self, index: usize, layer: DcmValue) -> Result<()> {
        require_mapping(&layer)?;
        if index >= self.source_layers.len() {
            return Err(DcmError::NotFound(format!("source layer {index}")));
        }
        self.source_layers[index] = layer;
        self.invalidate();
        Ok(())
    }

    pub fn layer_count(&self) -> usize {
        self.source_layers.len()
    }

    // --- front layer writes -------------------------------------------------

    pub fn set(&mut self, path: &[&str], value: DcmValue) -> Result<()> {
        set_path(&mut self.front_layer, path, value)?;
        self.invalidate();
        Ok(())
    }

    /// Writes a `!delete` tombstone at `path` in the front layer, masking
    /// the key in every source layer.
    pub fn delete(&mut self, path: &[&str]) -> Result<()> {
        set_path(&mut self.front_layer, path, DcmValue::Delete)?;
        self.invalidate();
        Ok(())
    }

    pub fn clear_front_layer(&mut self) {
        self.front_layer.clear();
        self.invalidate();
    }

    /// Materializes the current merged list at `path` into the front layer
    /// so subsequent list-ops at that path compose on top of a value this
    /// map now owns outright, rather than replaying against source layers
    /// that might themselves change out from under it.
    pub fn own_list(&mut self, path: &[&str]) -> Result<()> {
        let current = self.get(path)?;
        if !matches!(current, DcmValue::Sequence(_)) {
            return Err(DcmError::NotAList(path_vec(path)));
        }
        self.set(path, current)
    }

    // --- deferred list operations -------------------------------------------

    fn push_op(&mut self, path: &[&str], op: ListOp) {
        self.list_ops
            .entry(path_vec(path))
            .or_default()
            .push(op);
        self.invalidate();
    }

    pub fn list_append(&mut self, path: &[&str], value: DcmValue) {
        self.push_op(path, ListOp::Append(value));
    }

    pub fn list_extend(&mut self, path: &[&str], values: Vec<DcmValue>) {
        self.push_op(path, ListOp::Extend(values));
    }

    pub fn list_insert(&mut self, path: &[&str], index: usize, value: DcmValue) {
        self.push_op(path, ListOp::Insert(index, value));
    }

    pub fn list_set_item(&mut self, path: &[&str], index: usize, value: DcmValue) {
        self.push_op(path, ListOp::SetItem(index, value));
    }

    pub fn list_del_item(&mut self, path: &[&str], index: usize) {
        self.push_op(path, ListOp::DelItem(index));
    }

    pub fn list_pop(&mut self, path: &[&str], index: Option<usize>) {
        self.push_op(path, ListOp::Pop(index));
    }

    pub fn list_remove(&mut self, path: &[&str], value: DcmValue) {
        self.push_op(path, ListOp::Remove(value));
    }

    pub fn list_clear(&mut self, path: &[&str]) {
        self.push_op(path, ListOp::Clear);
    }

    pub fn clear_list_ops(&mut self, path: &[&str]) {
        self.list_ops.remove(&path_vec(path));
        self.invalidate();
    }

    pub fn clear_all_list_ops(&mut self) {
        self.list_ops.clear();
        self.invalidate();
    }

    // --- reset ---------------------------------------------------------------

    pub fn reset(&mut self) {
        self.source_layers.clear();
        self.front_layer.clear();
        self.list_ops.clear();
        self.invalidate();
    }

    // --- reads ---------------------------------------------------------------

    fn merged(&self) -> (DcmValue, Provenance) {
        if let Some(cached) = self.cache.borrow().as_ref() {
            return cached.clone();
        }

        let mut acc: BTreeMap<String, DcmValue> = BTreeMap::new();
        let mut prov: BTreeMap<String, Provenance> = BTreeMap::new();

        for (idx, layer) in self.source_layers.iter().enumerate() {
            if let Some(entries) = layer.as_mapping() {
                merge_mapping_into(&mut acc, &mut prov, entries, idx as i64);
            }
        }

        let mut merged_value = DcmValue::Mapping(acc);
        apply_ops_tree(&mut merged_value, &mut Vec::new(), &self.list_ops);
        let mut acc = match merged_value {
            DcmValue::Mapping(m) => m,
            _ => unreachable!("merged root is always a mapping"),
        };

        merge_mapping_into(&mut acc, &mut prov, &self.front_layer, -1);

        let result = (
            DcmValue::Mapping(acc),
            Provenance::with_children(i64::MIN, prov),
        );
        *self.cache.borrow_mut() = Some(result.clone());
        result
    }

    pub fn get(&self, path: &[&str]) -> Result<DcmValue> {
        let (root, _) = self.merged();
        navigate(&root, path)
    }

    pub fn get_with_provenance(&self, path: &[&str]) -> Result<(DcmValue, Provenance)> {
        let (root, prov_root) = self.merged();
        let value = navigate(&root, path)?;
        let provenance = navigate_provenance(&prov_root, path);
        Ok((value, provenance))
    }

    pub fn contains(&self, path: &[&str]) -> bool {
        self.get(path).is_ok()
    }

    pub fn keys(&self) -> Vec<String> {
        let (root, _) = self.merged();
        root.as_mapping()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_dict(&self) -> serde_json::Value {
        let (root, _) = self.merged();
        root.to_json()
    }
}

fn require_mapping(value: &DcmValue) -> Result<()> {
    if value.is_mapping() {
        Ok(())
    } else {
        Err(DcmError::NotATopLevelMapping(
            "source layers must be YAML/JSON mappings".into(),
        ))
    }
}

fn path_vec(path: &[&str]) -> Vec<String> {
    path.iter().map(|s| s.to_string()).collect()
}

fn set_path(root: &mut BTreeMap<String, DcmValue>, path: &[&str], value: DcmValue) -> Result<()> {
    match path.split_first() {
        None => Err(DcmError::NonStringPathComponent { index: 0 }),
        Some((key, [])) => {
            root.insert((*key).to_string(), value);
            Ok(())
        }
        Some((key, rest)) => {
            let entry = root
                .entry((*key).to_string())
                .or_insert_with(|| DcmValue::Mapping(BTreeMap::new()));
            let nested = entry
                .as_mapping_mut()
                .ok_or_else(|| DcmError::NotAMapping(path_vec(path)))?;
            set_path(nested, rest, value)
        }
    }
}

/// Recursively folds `overlay` into `acc`, tracking which `layer` last
/// contributed each leaf. `!delete` removes the key outright; `!replace`
/// substitutes the key's value with no further merge; two mappings merge
/// key-by-key; anything else is a plain overwrite.
fn merge_mapping_into(
    acc: &mut BTreeMap<String, DcmValue>,
    prov: &mut BTreeMap<String, Provenance>,
    overlay: &BTreeMap<String, DcmValue>,
    layer: i64,
) {
    for (key, overlay_value) in overlay {
        match overlay_value {
            DcmValue::Delete => {
                acc.remove(key);
                prov.remove(key);
            }
            DcmValue::Replace(inner) => {
                acc.insert(key.clone(), (**inner).clone());
                prov.insert(key.clone(), provenance_for(inner, layer));
            }
            DcmValue::Mapping(overlay_children) => {
                if let Some(DcmValue::Mapping(existing)) = acc.get_mut(key) {
                    let mut child_prov = match prov.remove(key) {
                        Some(p) => p.children,
                        None => BTreeMap::new(),
                    };
                    merge_mapping_into(existing, &mut child_prov, overlay_children, layer);
                    prov.insert(key.clone(), Provenance::with_children(layer, child_prov));
                } else {
                    acc.insert(key.clone(), overlay_value.clone());
                    prov.insert(key.clone(), provenance_for(overlay_value, layer));
                }
            }
            _ => {
                acc.insert(key.clone(), overlay_value.clone());
                prov.insert(key.clone(), Provenance::leaf(layer));
            }
        }
    }
}

fn provenance_for(value: &DcmValue, layer: i64) -> Provenance {
    match value {
        DcmValue::Mapping(children) => {
            let child_prov = children
                .iter()
                .map(|(k, v)| (k.clone(), provenance_for(v, layer)))
                .collect();
            Provenance::with_children(layer, child_prov)
        }
        _ => Provenance::leaf(layer),
    }
}

fn apply_ops_tree(value: &mut DcmValue, path: &mut Vec<String>, list_ops: &HashMap<Vec<String>, Vec<ListOp>>) {
    match value {
        DcmValue::Sequence(items) => {
            if let Some(ops) = list_ops.get(path) {
                if let Ok(replayed) = apply_list_ops(items, ops, path) {
                    *items = replayed;
                }
            }
        }
        DcmValue::Mapping(map) => {
            for (key, child) in map.iter_mut() {
                path.push(key.clone());
                apply_ops_tree(child, path, list_ops);
                path.pop();
            }
        }
        _ => {}
    }
}

fn navigate(root: &DcmValue, path: &[&str]) -> Result<DcmValue> {
    let mut current = root;
    for (i, key) in path.iter().enumerate() {
        match current {
            DcmValue::Delete => return Err(DcmError::Deleted(path[..=i].join("."))),
            DcmValue::Mapping(map) => match map.get(*key) {
                Some(DcmValue::Delete) => return Err(DcmError::Deleted(path[..=i].join("."))),
                Some(next) => current = next,
                None => return Err(DcmError::NotFound(path[..=i].join("."))),
            },
            _ => return Err(DcmError::NotAMapping(path_vec(&path[..i]))),
        }
    }
    Ok(current.clone())
}

fn navigate_provenance(root: &Provenance, path: &[&str]) -> Provenance {
    let mut current = root;
    for key in path {
        match current.children.get(*key) {
            Some(child) => current = child,
            None => return Provenance::leaf(current.layer),
        }
    }
    current.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> DcmValue {
        DcmValue::String(v.to_string())
    }

    #[test]
    fn higher_layer_overrides_lower_scalar() {
        let mut dcm = DeepChainMap::new(true);
        dcm.add_layer(DcmValue::mapping([("model".into(), s("gpt-4"))]))
            .unwrap();
        dcm.add_layer(DcmValue::mapping([("model".into(), s("claude"))]))
            .unwrap();
        assert_eq!(dcm.get(&["model"]).unwrap(), s("claude"));
    }

    #[test]
    fn nested_mappings_deep_merge_instead_of_overwrite() {
        let mut dcm = DeepChainMap::new(true);
        dcm.add_layer(DcmValue::mapping([(
            "behavior".into(),
            DcmValue::mapping([("max_tokens".into(), DcmValue::Number(8192.into()))]),
        )]))
        .unwrap();
        dcm.add_layer(DcmValue::mapping([(
            "behavior".into(),
            DcmValue::mapping([("verbose".into(), DcmValue::Bool(true))]),
        )]))
        .unwrap();
        assert_eq!(
            dcm.get(&["behavior", "max_tokens"]).unwrap(),
            DcmValue::Number(8192.into())
        );
        assert_eq!(dcm.get(&["behavior", "verbose"]).unwrap(), DcmValue::Bool(true));
    }

    #[test]
    fn delete_masks_lower_layers() {
        let mut dcm = DeepChainMap::new(true);
        dcm.add_layer(DcmValue::mapping([("secret".into(), s("leaked"))]))
            .unwrap();
        dcm.add_layer(DcmValue::mapping([("secret".into(), DcmValue::Delete)]))
            .unwrap();
        assert!(matches!(dcm.get(&["secret"]), Err(DcmError::Deleted(_))));
    }

    #[test]
    fn replace_disables_merge_for_subtree() {
        let mut dcm = DeepChainMap::new(true);
        dcm.add_layer(DcmValue::mapping([(
            "tools".into(),
            DcmValue::mapping([("disabled".into(), DcmValue::Sequence(vec![s("a")]))]),
        )]))
        .unwrap();
        dcm.add_layer(DcmValue::mapping([(
            "tools".into(),
            DcmValue::Replace(Box::new(DcmValue::mapping([(
                "builtin".into(),
                DcmValue::Bool(false),
            )]))),
        )]))
        .unwrap();
        assert!(dcm.get(&["tools", "disabled"]).is_err());
        assert_eq!(dcm.get(&["tools", "builtin"]).unwrap(), DcmValue::Bool(false));
    }

    #[test]
    fn front_layer_always_wins() {
        let mut dcm = DeepChainMap::new(true);
        dcm.add_layer(DcmValue::mapping([("model".into(), s("gpt-4"))]))
            .unwrap();
        dcm.set(&["model"], s("local-override")).unwrap();
        assert_eq!(dcm.get(&["model"]).unwrap(), s("local-override"));
    }

    #[test]
    fn front_layer_delete_masks_source_layers() {
        let mut dcm = DeepChainMap::new(true);
        dcm.add_layer(DcmValue::mapping([("model".into(), s("gpt-4"))]))
            .unwrap();
        dcm.delete(&["model"]).unwrap();
        assert!(matches!(dcm.get(&["model"]), Err(DcmError::Deleted(_))));
    }

    #[test]
    fn deferred_list_ops_replay_on_merged_list() {
        let mut dcm = DeepChainMap::new(false);
        dcm.add_layer(DcmValue::mapping([(
            "tags".into(),
            DcmValue::Sequence(vec![s("a"), s("b")]),
        )]))
        .unwrap();
        dcm.list_append(&["tags"], s("c"));
        assert_eq!(
            dcm.get(&["tags"]).unwrap(),
            DcmValue::Sequence(vec![s("a"), s("b"), s("c")])
        );
    }

    #[test]
    fn provenance_reports_front_layer_as_minus_one() {
        let mut dcm = DeepChainMap::new(true);
        dcm.add_layer(DcmValue::mapping([("model".into(), s("gpt-4"))]))
            .unwrap();
        dcm.set(&["model"], s("override")).unwrap();
        let (_, prov) = dcm.get_with_provenance(&["model"]).unwrap();
        assert_eq!(prov.layer, -1);
    }

    #[test]
    fn invalidates_cache_on_mutation() {
        let mut dcm = DeepChainMap::new(false);
        dcm.add_layer(DcmValue::mapping([("x".into(), DcmValue::Number(1.into()))]))
            .unwrap();
        assert_eq!(dcm.get(&["x"]).unwrap(), DcmValue::Number(1.into()));
        dcm.set(&["x"], DcmValue::Number(2.into())).unwrap();
        assert_eq!(dcm.get(&["x"]).unwrap(), DcmValue::Number(2.into()));
    }

    #[test]
    fn round_trip_to_dict_preserves_values_modulo_key_order() {
        let mut dcm = DeepChainMap::new(false);
        dcm.add_layer(DcmValue::mapping([
            ("a".into(), DcmValue::Number(1.into())),
            ("b".into(), s("two")),
        ]))
        .unwrap();
        let dict = dcm.to_dict();
        assert_eq!(dict["a"], serde_json::json!(1));
        assert_eq!(dict["b"], serde_json::json!("two"));
    }
}
