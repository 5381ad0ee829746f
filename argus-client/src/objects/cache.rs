//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The client-side mirror of the server's object graph.
//!
//! # Concurrency
//!
//! The session's receive task is the sole writer; reads are safe from any
//! number of concurrent tasks. Updates build the merged object first and
//! then swap an `Arc` into the map, so a concurrent reader observes
//! either the wholly-pre-update or wholly-post-update object, never a
//! partially merged record.

use super::model::NetObject;
use crate::protocol::{Message, fields};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache of [`NetObject`]s keyed by object id.
///
/// There is at most one object per id; updates merge fields into the
/// existing object, never replace its identity.
#[derive(Debug, Default)]
pub struct ObjectCache {
    objects: RwLock<HashMap<u64, Arc<NetObject>>>,
}

impl ObjectCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an object by id.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<Arc<NetObject>> {
        self.objects.read().get(&id).cloned()
    }

    /// Returns a snapshot of all cached objects, ordered by id.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<NetObject>> {
        let mut snapshot: Vec<_> = self.objects.read().values().cloned().collect();
        snapshot.sort_by_key(|object| object.id);
        snapshot
    }

    /// Returns the number of cached objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Returns `true` if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Applies an object create/update message.
    ///
    /// An unknown id constructs a new object of the class the message
    /// indicates; a known id merges the message's fields over the
    /// existing object. Returns the post-merge snapshot, or `None` if
    /// the message carries no object id.
    ///
    /// Called from the session's receive task only.
    pub(crate) fn apply_update(&self, msg: &Message) -> Option<Arc<NetObject>> {
        let Some(id) = msg.get_u64(fields::OBJECT_ID) else {
            warn!("dropping object update without an object id");
            return None;
        };

        let mut objects = self.objects.write();
        let mut merged = match objects.get(&id) {
            Some(existing) => NetObject::clone(existing),
            None => NetObject::new(id),
        };
        merged.apply(msg);
        let merged = Arc::new(merged);
        objects.insert(id, Arc::clone(&merged));
        debug!(id, class = merged.class_name(), "object cached");
        Some(merged)
    }

    /// Removes an object and strips it from every other object's
    /// parent/child lists.
    ///
    /// Returns the removed object, if it was cached. Called from the
    /// session's receive task only.
    pub(crate) fn apply_delete(&self, id: u64) -> Option<Arc<NetObject>> {
        let mut objects = self.objects.write();
        let removed = objects.remove(&id)?;

        // Adjacency is ID lists, so dropping the references is a local
        // rewrite of each referencing object.
        let referencing: Vec<u64> = objects
            .iter()
            .filter(|(_, object)| {
                object.parents.contains(&id) || object.children.contains(&id)
            })
            .map(|(other_id, _)| *other_id)
            .collect();
        for other_id in referencing {
            if let Some(existing) = objects.get(&other_id) {
                let mut updated = NetObject::clone(existing);
                updated.parents.retain(|parent| *parent != id);
                updated.children.retain(|child| *child != id);
                objects.insert(other_id, Arc::new(updated));
            }
        }

        debug!(id, "object removed from cache");
        Some(removed)
    }

    /// Drops every cached object; part of session teardown.
    pub(crate) fn clear(&self) {
        self.objects.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::model::{ObjectClass, ObjectStatus};
    use crate::protocol::{Message, codes};

    fn object_message(id: u64, name: &str) -> Message {
        let mut msg = Message::new(codes::OBJECT, 0);
        msg.set_u64(fields::OBJECT_ID, id);
        msg.set_string(fields::OBJECT_NAME, name);
        msg
    }

    #[test]
    fn test_unknown_id_constructs_object() {
        let cache = ObjectCache::new();
        assert!(cache.get(1).is_none());

        cache.apply_update(&object_message(1, "gateway"));
        let object = cache.get(1).unwrap();
        assert_eq!(object.name, "gateway");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_updates_merge_and_preserve_identity() {
        let cache = ObjectCache::new();
        cache.apply_update(&object_message(1, "gateway"));

        let mut update = Message::new(codes::OBJECT_UPDATE, 0);
        update.set_u64(fields::OBJECT_ID, 1);
        update.set_u32(fields::OBJECT_STATUS, 3);
        cache.apply_update(&update);

        // Still one object; name survived, status changed.
        assert_eq!(cache.len(), 1);
        let object = cache.get(1).unwrap();
        assert_eq!(object.name, "gateway");
        assert_eq!(object.status, ObjectStatus::Major);
    }

    #[test]
    fn test_update_order_is_preserved() {
        let cache = ObjectCache::new();
        let mut first = object_message(1, "name-1");
        first.set_string(fields::PLATFORM_NAME, "old");
        cache.apply_update(&first);
        cache.apply_update(&object_message(1, "name-2"));

        assert_eq!(cache.get(1).unwrap().name, "name-2");
    }

    #[test]
    fn test_update_without_id_is_dropped() {
        let cache = ObjectCache::new();
        let msg = Message::new(codes::OBJECT_UPDATE, 0);
        assert!(cache.apply_update(&msg).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_delete_strips_adjacency() {
        let cache = ObjectCache::new();
        let mut parent = object_message(1, "rack");
        parent.set_id_list(fields::CHILD_LIST, &[2, 3]);
        cache.apply_update(&parent);

        let mut child = object_message(2, "node-a");
        child.set_id_list(fields::PARENT_LIST, &[1]);
        cache.apply_update(&child);
        let mut sibling = object_message(3, "node-b");
        sibling.set_id_list(fields::PARENT_LIST, &[1]);
        cache.apply_update(&sibling);

        let removed = cache.apply_delete(2).unwrap();
        assert_eq!(removed.name, "node-a");
        assert!(cache.get(2).is_none());
        assert_eq!(cache.get(1).unwrap().children, vec![3]);
        // Unrelated adjacency is untouched.
        assert_eq!(cache.get(3).unwrap().parents, vec![1]);
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let cache = ObjectCache::new();
        assert!(cache.apply_delete(99).is_none());
    }

    #[test]
    fn test_snapshot_is_ordered_and_stable() {
        let cache = ObjectCache::new();
        cache.apply_update(&object_message(5, "e"));
        cache.apply_update(&object_message(1, "a"));
        cache.apply_update(&object_message(3, "c"));

        let snapshot = cache.all();
        let ids: Vec<u64> = snapshot.iter().map(|object| object.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);

        // The snapshot is detached from later mutations.
        cache.apply_delete(1);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_reader_sees_whole_versions_only() {
        use std::sync::Arc as StdArc;
        let cache = StdArc::new(ObjectCache::new());

        // Writer applies paired name/vendor updates; a torn read would
        // observe a mismatched pair.
        let writer = {
            let cache = StdArc::clone(&cache);
            std::thread::spawn(move || {
                for round in 0..500u32 {
                    let mut msg = Message::new(codes::OBJECT_UPDATE, 0);
                    msg.set_u64(fields::OBJECT_ID, 42);
                    msg.set_u32(fields::OBJECT_CLASS, 2);
                    msg.set_string(fields::OBJECT_NAME, format!("pair-{round}"));
                    msg.set_string(fields::VENDOR, format!("pair-{round}"));
                    cache.apply_update(&msg);
                }
            })
        };

        let reader = {
            let cache = StdArc::clone(&cache);
            std::thread::spawn(move || {
                for _ in 0..2000 {
                    if let Some(object) = cache.get(42) {
                        let ObjectClass::Sensor(data) = &object.class else {
                            panic!("expected sensor class");
                        };
                        assert_eq!(Some(object.name.as_str()), data.vendor.as_deref());
                    }
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
    }

    #[test]
    fn test_clear_empties_cache() {
        let cache = ObjectCache::new();
        cache.apply_update(&object_message(1, "x"));
        cache.clear();
        assert!(cache.is_empty());
    }
}
